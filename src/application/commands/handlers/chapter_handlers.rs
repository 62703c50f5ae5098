//! Chapter Pipeline Command Handlers
//!
//! 章节生产流水线：生成 → 评估 → 选择。每个写操作先占用
//! (project, chapter) 互斥，再按状态机推进并逐步落库，
//! 让 generating / evaluating 等中间状态对外可见。

use std::collections::BTreeSet;
use std::sync::Arc;

use super::load_project;
use crate::application::commands::{
    DeleteChapters, EditChapterContent, EvaluateChapter, GenerateChapter, GenerateOutline,
    SelectChapterVersion, UpdateChapterOutline,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    EvaluateRequest, MutationGuardPort, MutationScope, OutlineRequest, PriorChapter,
    ProjectRepositoryPort, StoryGeneratorPort, WriteChapterRequest,
};
use crate::domain::blueprint::{ChapterOutline, MAX_CHAPTER_NUMBER};
use crate::domain::project::{Chapter, Project, ProjectError, ProjectId};
use crate::infrastructure::events::EventPublisher;

/// 上一章结尾摘录长度（字符）
const PREVIOUS_EXCERPT_CHARS: usize = 500;

/// 单次续写大纲的章节数上限
pub const MAX_OUTLINE_BATCH: u32 = 50;

/// 流水线参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// 每次生成的候选版本数
    pub version_count: u32,
    /// 生成后是否进入评估
    pub evaluation_enabled: bool,
    /// 评估后是否自动采用推荐版本
    pub auto_select: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            version_count: 2,
            evaluation_enabled: true,
            auto_select: false,
        }
    }
}

/// 章节状态落库并广播
async fn persist_progress(
    repo: &dyn ProjectRepositoryPort,
    events: &EventPublisher,
    project_id: ProjectId,
    chapter: &Chapter,
) -> Result<(), ApplicationError> {
    repo.save_chapter_progress(project_id, chapter).await?;
    events.publish_chapter_status(project_id, chapter.chapter_number, chapter.generation_status);
    tracing::debug!(
        project_id = %project_id,
        chapter_number = chapter.chapter_number,
        status = %chapter.generation_status,
        "Chapter status persisted"
    );
    Ok(())
}

// ============================================================================
// GenerateChapter
// ============================================================================

/// GenerateChapter Handler
pub struct GenerateChapterHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    event_publisher: Arc<EventPublisher>,
    settings: PipelineSettings,
}

impl GenerateChapterHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        event_publisher: Arc<EventPublisher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            project_repo,
            generator,
            mutation_guard,
            event_publisher,
            settings,
        }
    }

    pub async fn handle(&self, command: GenerateChapter) -> Result<Project, ApplicationError> {
        let project_id = command.project_id;
        let number = command.chapter_number;
        let _guard = self
            .mutation_guard
            .try_acquire(project_id, MutationScope::Chapter(number))?;

        let project = load_project(self.project_repo.as_ref(), project_id).await?;
        let blueprint = project
            .blueprint()
            .cloned()
            .ok_or(ProjectError::MissingBlueprint)?;
        let mut chapter = project.chapter(number)?.clone();

        chapter.begin_generation()?;
        self.persist(project_id, &chapter).await?;

        tracing::info!(
            project_id = %project_id,
            chapter_number = number,
            version_count = self.settings.version_count,
            "Chapter generation started"
        );

        let request = WriteChapterRequest {
            blueprint,
            chapter_number: number,
            title: chapter.title.clone(),
            summary: chapter.summary.clone(),
            prior_chapters: prior_chapters(&project, number),
            previous_excerpt: previous_excerpt(&project, number),
            version_count: self.settings.version_count,
        };

        let outcome = match self.generator.write_chapter(request).await {
            Ok(candidates) => {
                let candidates: Vec<String> = candidates
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .collect();
                chapter
                    .complete_generation(candidates, self.settings.evaluation_enabled)
                    .map_err(ApplicationError::from)
            }
            Err(e) => Err(ApplicationError::capability(format!("章节生成失败: {}", e))),
        };

        if let Err(err) = outcome {
            tracing::warn!(
                project_id = %project_id,
                chapter_number = number,
                error = %err,
                "Chapter generation failed"
            );
            chapter.fail_generation()?;
            self.persist(project_id, &chapter).await?;
            return Err(err);
        }

        self.persist(project_id, &chapter).await?;
        tracing::info!(
            project_id = %project_id,
            chapter_number = number,
            versions = chapter.versions.len(),
            status = %chapter.generation_status,
            "Chapter generated"
        );

        load_project(self.project_repo.as_ref(), project_id).await
    }

    async fn persist(&self, project_id: ProjectId, chapter: &Chapter) -> Result<(), ApplicationError> {
        persist_progress(
            self.project_repo.as_ref(),
            &self.event_publisher,
            project_id,
            chapter,
        )
        .await
    }
}

fn prior_chapters(project: &Project, number: u32) -> Vec<PriorChapter> {
    project
        .chapters()
        .iter()
        .filter(|c| c.chapter_number < number)
        .map(|c| PriorChapter {
            chapter_number: c.chapter_number,
            title: c.title.clone(),
            summary: c.summary.clone(),
        })
        .collect()
}

fn previous_excerpt(project: &Project, number: u32) -> Option<String> {
    let previous = project
        .chapters()
        .iter()
        .filter(|c| c.chapter_number < number)
        .last()?;
    let content = previous.content.as_deref()?;
    let total = content.chars().count();
    let skip = total.saturating_sub(PREVIOUS_EXCERPT_CHARS);
    Some(content.chars().skip(skip).collect())
}

// ============================================================================
// EvaluateChapter
// ============================================================================

/// EvaluateChapter Handler
pub struct EvaluateChapterHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    event_publisher: Arc<EventPublisher>,
    settings: PipelineSettings,
}

impl EvaluateChapterHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        event_publisher: Arc<EventPublisher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            project_repo,
            generator,
            mutation_guard,
            event_publisher,
            settings,
        }
    }

    pub async fn handle(&self, command: EvaluateChapter) -> Result<Project, ApplicationError> {
        let project_id = command.project_id;
        let number = command.chapter_number;
        let _guard = self
            .mutation_guard
            .try_acquire(project_id, MutationScope::Chapter(number))?;

        let project = load_project(self.project_repo.as_ref(), project_id).await?;
        let blueprint = project
            .blueprint()
            .cloned()
            .ok_or(ProjectError::MissingBlueprint)?;
        let mut chapter = project.chapter(number)?.clone();

        chapter.begin_evaluation()?;
        persist_progress(
            self.project_repo.as_ref(),
            &self.event_publisher,
            project_id,
            &chapter,
        )
        .await?;

        let request = EvaluateRequest {
            blueprint,
            chapter_number: number,
            title: chapter.title.clone(),
            summary: chapter.summary.clone(),
            versions: chapter.versions.clone(),
        };

        match self.generator.evaluate(request).await {
            Ok(evaluation) => {
                chapter.complete_evaluation(evaluation.rationale)?;
                if self.settings.auto_select {
                    chapter.auto_select(evaluation.recommended)?;
                }
            }
            Err(e) => {
                tracing::warn!(
                    project_id = %project_id,
                    chapter_number = number,
                    error = %e,
                    "Chapter evaluation failed"
                );
                chapter.fail_evaluation()?;
                persist_progress(
                    self.project_repo.as_ref(),
                    &self.event_publisher,
                    project_id,
                    &chapter,
                )
                .await?;
                return Err(ApplicationError::capability(format!("章节评估失败: {}", e)));
            }
        }

        persist_progress(
            self.project_repo.as_ref(),
            &self.event_publisher,
            project_id,
            &chapter,
        )
        .await?;
        tracing::info!(
            project_id = %project_id,
            chapter_number = number,
            status = %chapter.generation_status,
            "Chapter evaluated"
        );

        load_project(self.project_repo.as_ref(), project_id).await
    }
}

// ============================================================================
// SelectChapterVersion / EditChapterContent
// ============================================================================

/// SelectChapterVersion Handler
pub struct SelectChapterVersionHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    event_publisher: Arc<EventPublisher>,
}

impl SelectChapterVersionHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: SelectChapterVersion) -> Result<Project, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Chapter(command.chapter_number))?;

        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        let mut chapter = project.chapter(command.chapter_number)?.clone();
        chapter.select_version(command.version_index)?;

        persist_progress(
            self.project_repo.as_ref(),
            &self.event_publisher,
            command.project_id,
            &chapter,
        )
        .await?;
        tracing::info!(
            project_id = %command.project_id,
            chapter_number = command.chapter_number,
            version_index = command.version_index,
            "Chapter version selected"
        );

        load_project(self.project_repo.as_ref(), command.project_id).await
    }
}

/// EditChapterContent Handler
pub struct EditChapterContentHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    event_publisher: Arc<EventPublisher>,
}

impl EditChapterContentHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: EditChapterContent) -> Result<Project, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Chapter(command.chapter_number))?;

        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        let mut chapter = project.chapter(command.chapter_number)?.clone();
        chapter.edit_content(command.content);

        persist_progress(
            self.project_repo.as_ref(),
            &self.event_publisher,
            command.project_id,
            &chapter,
        )
        .await?;
        tracing::info!(
            project_id = %command.project_id,
            chapter_number = command.chapter_number,
            word_count = chapter.word_count,
            "Chapter content edited"
        );

        load_project(self.project_repo.as_ref(), command.project_id).await
    }
}

// ============================================================================
// UpdateChapterOutline / DeleteChapters / GenerateOutline
// ============================================================================

/// UpdateChapterOutline Handler - 只改标题与摘要
pub struct UpdateChapterOutlineHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl UpdateChapterOutlineHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: UpdateChapterOutline) -> Result<Project, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;

        let mut project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        let created = project.upsert_outline(ChapterOutline::new(
            command.chapter_number,
            command.title,
            command.summary,
        ))?;

        let blueprint = project.blueprint().ok_or(ProjectError::MissingBlueprint)?;
        let chapter = project.chapter(command.chapter_number)?;
        self.project_repo
            .save_blueprint(command.project_id, blueprint, std::slice::from_ref(chapter))
            .await?;

        tracing::info!(
            project_id = %command.project_id,
            chapter_number = command.chapter_number,
            created = created,
            "Chapter outline updated"
        );

        load_project(self.project_repo.as_ref(), command.project_id).await
    }
}

/// DeleteChapters Handler - 保留空缺，不重新编号
pub struct DeleteChaptersHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl DeleteChaptersHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: DeleteChapters) -> Result<Project, ApplicationError> {
        let numbers: Vec<u32> = command
            .chapter_numbers
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if numbers.is_empty() {
            return Err(ApplicationError::invalid_argument("至少需要一个章节号"));
        }

        let mut scopes = vec![MutationScope::Project];
        scopes.extend(numbers.iter().map(|n| MutationScope::Chapter(*n)));
        let _guards = self
            .mutation_guard
            .try_acquire_all(command.project_id, &scopes)?;

        let mut project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        project.remove_chapters(&numbers)?;

        self.project_repo
            .delete_chapters(command.project_id, &numbers, project.blueprint())
            .await?;

        tracing::info!(
            project_id = %command.project_id,
            chapters = ?numbers,
            "Chapters deleted"
        );

        load_project(self.project_repo.as_ref(), command.project_id).await
    }
}

/// GenerateOutline Handler
pub struct GenerateOutlineHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl GenerateOutlineHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            generator,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: GenerateOutline) -> Result<Project, ApplicationError> {
        if command.start_chapter == 0 || command.num_chapters == 0 {
            return Err(ApplicationError::invalid_argument(
                "start_chapter 与 num_chapters 必须大于 0",
            ));
        }
        if command.num_chapters > MAX_OUTLINE_BATCH {
            return Err(ApplicationError::invalid_argument(format!(
                "单次最多续写 {} 章大纲",
                MAX_OUTLINE_BATCH
            )));
        }

        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;
        let mut project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        let blueprint = project
            .blueprint()
            .cloned()
            .ok_or(ProjectError::MissingBlueprint)?;

        let next = blueprint
            .last_outline_number()
            .checked_add(1)
            .filter(|n| *n <= MAX_CHAPTER_NUMBER)
            .ok_or_else(|| ApplicationError::invalid_argument("大纲已达到章节号上限"))?;
        if command.start_chapter > next {
            return Err(ApplicationError::invalid_argument(format!(
                "start_chapter 不能超过当前最后一章的下一章（{}）",
                next
            )));
        }

        let end = command
            .start_chapter
            .checked_add(command.num_chapters)
            .filter(|end| *end <= MAX_CHAPTER_NUMBER + 1)
            .ok_or_else(|| {
                ApplicationError::invalid_argument(format!(
                    "续写范围超出章节号上限 {}",
                    MAX_CHAPTER_NUMBER
                ))
            })?;
        let entries: Vec<ChapterOutline> = self
            .generator
            .generate_outline(OutlineRequest {
                blueprint,
                start_chapter: command.start_chapter,
                num_chapters: command.num_chapters,
            })
            .await
            .map_err(|e| ApplicationError::capability(format!("大纲生成失败: {}", e)))?
            .into_iter()
            .filter(|e| (command.start_chapter..end).contains(&e.chapter_number))
            .collect();
        if entries.is_empty() {
            return Err(ApplicationError::capability("生成的大纲没有落在请求范围内的章节"));
        }

        let numbers: Vec<u32> = entries.iter().map(|e| e.chapter_number).collect();
        let created = project.merge_outline(entries)?;

        let blueprint = project.blueprint().ok_or(ProjectError::MissingBlueprint)?;
        let touched: Vec<Chapter> = project
            .chapters()
            .iter()
            .filter(|c| numbers.contains(&c.chapter_number))
            .cloned()
            .collect();
        self.project_repo
            .save_blueprint(command.project_id, blueprint, &touched)
            .await?;

        tracing::info!(
            project_id = %command.project_id,
            start_chapter = command.start_chapter,
            generated = numbers.len(),
            created_chapters = created.len(),
            "Outline generated"
        );

        load_project(self.project_repo.as_ref(), command.project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::TestContext;
    use crate::domain::project::GenerationStatus;

    fn generate_handler(ctx: &TestContext, settings: PipelineSettings) -> GenerateChapterHandler {
        GenerateChapterHandler::new(
            ctx.repo.clone(),
            ctx.generator.clone(),
            ctx.guard.clone(),
            ctx.events.clone(),
            settings,
        )
    }

    fn evaluate_handler(ctx: &TestContext, settings: PipelineSettings) -> EvaluateChapterHandler {
        EvaluateChapterHandler::new(
            ctx.repo.clone(),
            ctx.generator.clone(),
            ctx.guard.clone(),
            ctx.events.clone(),
            settings,
        )
    }

    fn generate(project_id: ProjectId, chapter_number: u32) -> GenerateChapter {
        GenerateChapter {
            project_id,
            chapter_number,
        }
    }

    #[tokio::test]
    async fn test_generate_moves_to_evaluating() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(3).await;

        let updated = generate_handler(&ctx, PipelineSettings::default())
            .handle(generate(project.id(), 1))
            .await
            .unwrap();

        let chapter = updated.chapter(1).unwrap();
        assert_eq!(chapter.generation_status, GenerationStatus::Evaluating);
        assert_eq!(chapter.versions.len(), 2);
        assert!(chapter.content.is_none());
    }

    #[tokio::test]
    async fn test_generate_without_evaluator_waits_for_confirm() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let settings = PipelineSettings {
            evaluation_enabled: false,
            ..Default::default()
        };

        let updated = generate_handler(&ctx, settings)
            .handle(generate(project.id(), 1))
            .await
            .unwrap();
        assert_eq!(
            updated.chapter(1).unwrap().generation_status,
            GenerationStatus::WaitingForConfirm
        );
    }

    #[tokio::test]
    async fn test_versions_accumulate_across_generations() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let settings = PipelineSettings {
            evaluation_enabled: false,
            ..Default::default()
        };
        let generate_handler = generate_handler(&ctx, settings);
        let select = SelectChapterVersionHandler::new(ctx.repo.clone(), ctx.guard.clone(), ctx.events.clone());

        generate_handler.handle(generate(project.id(), 1)).await.unwrap();
        select
            .handle(SelectChapterVersion {
                project_id: project.id(),
                chapter_number: 1,
                version_index: 0,
            })
            .await
            .unwrap();
        let updated = generate_handler.handle(generate(project.id(), 1)).await.unwrap();

        assert_eq!(updated.chapter(1).unwrap().versions.len(), 4);
    }

    #[tokio::test]
    async fn test_generate_failure_keeps_previous_content() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let edit = EditChapterContentHandler::new(ctx.repo.clone(), ctx.guard.clone(), ctx.events.clone());
        edit.handle(EditChapterContent {
            project_id: project.id(),
            chapter_number: 1,
            content: "旧正文".into(),
        })
        .await
        .unwrap();

        ctx.generator.set_failing(true);
        let result = generate_handler(&ctx, PipelineSettings::default())
            .handle(generate(project.id(), 1))
            .await;
        assert!(matches!(result, Err(ApplicationError::CapabilityFailure(_))));

        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        let chapter = stored.chapter(1).unwrap();
        assert_eq!(chapter.generation_status, GenerationStatus::Failed);
        assert_eq!(chapter.content.as_deref(), Some("旧正文"));
    }

    #[tokio::test]
    async fn test_generate_rejected_while_in_flight() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let _held = ctx
            .guard
            .try_acquire(project.id(), MutationScope::Chapter(1))
            .unwrap();

        let result = generate_handler(&ctx, PipelineSettings::default())
            .handle(generate(project.id(), 1))
            .await;
        assert!(matches!(result, Err(ApplicationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_other_chapter_is_not_blocked() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;
        let _held = ctx
            .guard
            .try_acquire(project.id(), MutationScope::Chapter(1))
            .unwrap();

        let updated = generate_handler(&ctx, PipelineSettings::default())
            .handle(generate(project.id(), 2))
            .await
            .unwrap();
        assert_eq!(
            updated.chapter(2).unwrap().generation_status,
            GenerationStatus::Evaluating
        );
    }

    #[tokio::test]
    async fn test_evaluate_then_select() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let settings = PipelineSettings::default();
        generate_handler(&ctx, settings)
            .handle(generate(project.id(), 1))
            .await
            .unwrap();

        let evaluated = evaluate_handler(&ctx, settings)
            .handle(EvaluateChapter {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await
            .unwrap();
        let chapter = evaluated.chapter(1).unwrap();
        assert_eq!(chapter.generation_status, GenerationStatus::Selecting);
        assert!(chapter.evaluation.is_some());

        let select = SelectChapterVersionHandler::new(ctx.repo.clone(), ctx.guard.clone(), ctx.events.clone());
        let out_of_range = select
            .handle(SelectChapterVersion {
                project_id: project.id(),
                chapter_number: 1,
                version_index: 5,
            })
            .await;
        assert!(matches!(out_of_range, Err(ApplicationError::InvalidArgument(_))));

        let selected = select
            .handle(SelectChapterVersion {
                project_id: project.id(),
                chapter_number: 1,
                version_index: 1,
            })
            .await
            .unwrap();
        let chapter = selected.chapter(1).unwrap();
        assert_eq!(chapter.generation_status, GenerationStatus::Successful);
        assert_eq!(chapter.content.as_ref(), Some(&chapter.versions[1]));
        assert!(chapter.word_count > 0);
    }

    #[tokio::test]
    async fn test_evaluate_with_auto_select_commits_recommendation() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let settings = PipelineSettings {
            auto_select: true,
            ..Default::default()
        };
        ctx.generator.set_recommendation(Some(1));
        generate_handler(&ctx, settings)
            .handle(generate(project.id(), 1))
            .await
            .unwrap();

        let evaluated = evaluate_handler(&ctx, settings)
            .handle(EvaluateChapter {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await
            .unwrap();
        let chapter = evaluated.chapter(1).unwrap();
        assert_eq!(chapter.generation_status, GenerationStatus::Successful);
        assert_eq!(chapter.content.as_ref(), Some(&chapter.versions[1]));
    }

    #[tokio::test]
    async fn test_evaluate_failure_marks_evaluation_failed() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let settings = PipelineSettings::default();
        generate_handler(&ctx, settings)
            .handle(generate(project.id(), 1))
            .await
            .unwrap();

        ctx.generator.set_failing(true);
        let result = evaluate_handler(&ctx, settings)
            .handle(EvaluateChapter {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::CapabilityFailure(_))));

        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(
            stored.chapter(1).unwrap().generation_status,
            GenerationStatus::EvaluationFailed
        );
    }

    #[tokio::test]
    async fn test_evaluate_requires_versions() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let result = evaluate_handler(&ctx, PipelineSettings::default())
            .handle(EvaluateChapter {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_edit_is_idempotent() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let edit = EditChapterContentHandler::new(ctx.repo.clone(), ctx.guard.clone(), ctx.events.clone());
        let command = EditChapterContent {
            project_id: project.id(),
            chapter_number: 1,
            content: "黎明 之前".into(),
        };

        let first = edit.handle(command.clone()).await.unwrap();
        let second = edit.handle(command).await.unwrap();
        assert_eq!(first.chapter(1).unwrap(), second.chapter(1).unwrap());
        assert_eq!(second.chapter(1).unwrap().word_count, 4);
    }

    #[tokio::test]
    async fn test_delete_chapters_preserves_gaps() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(5).await;
        let handler = DeleteChaptersHandler::new(ctx.repo.clone(), ctx.guard.clone());

        let updated = handler
            .handle(DeleteChapters {
                project_id: project.id(),
                chapter_numbers: vec![3],
            })
            .await
            .unwrap();

        let numbers: Vec<u32> = updated.chapters().iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 2, 4, 5]);
        let outline: Vec<u32> = updated
            .blueprint()
            .unwrap()
            .chapter_outline
            .iter()
            .map(|o| o.chapter_number)
            .collect();
        assert_eq!(outline, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_delete_unknown_chapter_deletes_nothing() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;
        let handler = DeleteChaptersHandler::new(ctx.repo.clone(), ctx.guard.clone());

        let result = handler
            .handle(DeleteChapters {
                project_id: project.id(),
                chapter_numbers: vec![1, 9],
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(stored.chapters().len(), 2);

        let empty = handler
            .handle(DeleteChapters {
                project_id: project.id(),
                chapter_numbers: vec![],
            })
            .await;
        assert!(matches!(empty, Err(ApplicationError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_update_outline_keeps_pipeline_state() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        generate_handler(&ctx, PipelineSettings::default())
            .handle(generate(project.id(), 1))
            .await
            .unwrap();

        let handler = UpdateChapterOutlineHandler::new(ctx.repo.clone(), ctx.guard.clone());
        let updated = handler
            .handle(UpdateChapterOutline {
                project_id: project.id(),
                chapter_number: 1,
                title: "夜航".into(),
                summary: "出城".into(),
            })
            .await
            .unwrap();
        let chapter = updated.chapter(1).unwrap();
        assert_eq!(chapter.title, "夜航");
        assert_eq!(chapter.generation_status, GenerationStatus::Evaluating);
        assert_eq!(chapter.versions.len(), 2);

        let added = handler
            .handle(UpdateChapterOutline {
                project_id: project.id(),
                chapter_number: 2,
                title: "新章".into(),
                summary: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(
            added.chapter(2).unwrap().generation_status,
            GenerationStatus::NotGenerated
        );
    }

    #[tokio::test]
    async fn test_generate_outline_bounds() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;
        let handler = GenerateOutlineHandler::new(ctx.repo.clone(), ctx.generator.clone(), ctx.guard.clone());

        let too_far = handler
            .handle(GenerateOutline {
                project_id: project.id(),
                start_chapter: 5,
                num_chapters: 2,
            })
            .await;
        assert!(matches!(too_far, Err(ApplicationError::InvalidArgument(_))));

        let updated = handler
            .handle(GenerateOutline {
                project_id: project.id(),
                start_chapter: 3,
                num_chapters: 2,
            })
            .await
            .unwrap();
        assert_eq!(updated.chapters().len(), 4);
        assert_eq!(updated.blueprint().unwrap().last_outline_number(), 4);
        assert_eq!(
            updated.chapter(4).unwrap().generation_status,
            GenerationStatus::NotGenerated
        );
    }

    #[tokio::test]
    async fn test_generate_outline_rejects_range_past_chapter_limit() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let outline = UpdateChapterOutlineHandler::new(ctx.repo.clone(), ctx.guard.clone());
        let generate = GenerateOutlineHandler::new(ctx.repo.clone(), ctx.generator.clone(), ctx.guard.clone());

        let overflow = outline
            .handle(UpdateChapterOutline {
                project_id: project.id(),
                chapter_number: u32::MAX,
                title: "溢出".into(),
                summary: String::new(),
            })
            .await;
        assert!(matches!(overflow, Err(ApplicationError::InvalidArgument(_))));

        outline
            .handle(UpdateChapterOutline {
                project_id: project.id(),
                chapter_number: MAX_CHAPTER_NUMBER - 1,
                title: "倒数第二章".into(),
                summary: String::new(),
            })
            .await
            .unwrap();
        let past_limit = generate
            .handle(GenerateOutline {
                project_id: project.id(),
                start_chapter: MAX_CHAPTER_NUMBER,
                num_chapters: 5,
            })
            .await;
        assert!(matches!(past_limit, Err(ApplicationError::InvalidArgument(_))));

        outline
            .handle(UpdateChapterOutline {
                project_id: project.id(),
                chapter_number: MAX_CHAPTER_NUMBER,
                title: "末章".into(),
                summary: String::new(),
            })
            .await
            .unwrap();
        let full = generate
            .handle(GenerateOutline {
                project_id: project.id(),
                start_chapter: 2,
                num_chapters: 1,
            })
            .await;
        assert!(matches!(full, Err(ApplicationError::InvalidArgument(_))));
    }
}
