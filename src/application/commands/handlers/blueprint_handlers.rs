//! Blueprint Command Handlers

use std::sync::Arc;

use super::load_project;
use crate::application::commands::{GenerateBlueprint, SaveBlueprint, UpdateBlueprint};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BlueprintRequest, MutationGuardPort, MutationScope, ProjectRepositoryPort, StoryGeneratorPort,
};
use crate::domain::blueprint::Blueprint;
use crate::domain::project::{MessageRole, Project, ProjectError};

// ============================================================================
// GenerateBlueprint
// ============================================================================

/// 蓝图草稿
#[derive(Debug, Clone)]
pub struct GenerateBlueprintResponse {
    pub blueprint: Blueprint,
    pub ai_message: String,
}

/// GenerateBlueprint Handler - 只生成草稿，保存由调用方决定
pub struct GenerateBlueprintHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
}

impl GenerateBlueprintHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
    ) -> Self {
        Self {
            project_repo,
            generator,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateBlueprint,
    ) -> Result<GenerateBlueprintResponse, ApplicationError> {
        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;

        let has_user_message = project
            .conversation_history()
            .iter()
            .any(|m| m.role == MessageRole::User);
        if !has_user_message {
            return Err(ApplicationError::invalid_state(
                "对话历史中还没有用户消息，无法生成蓝图",
            ));
        }

        let generated = self
            .generator
            .generate_blueprint(BlueprintRequest {
                project_title: project.title().to_string(),
                initial_prompt: project.initial_prompt().to_string(),
                history: project.conversation_history().to_vec(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(
                    project_id = %command.project_id,
                    error = %e,
                    "Blueprint generation failed"
                );
                ApplicationError::capability(format!("蓝图生成失败: {}", e))
            })?;

        let mut blueprint = generated.blueprint;
        if blueprint.chapter_outline.is_empty() {
            return Err(ApplicationError::capability("生成的蓝图缺少章节大纲"));
        }
        blueprint
            .validate()
            .map_err(|e| ApplicationError::capability(format!("生成的蓝图不合法: {}", e)))?;
        blueprint.sort_outline();

        tracing::info!(
            project_id = %command.project_id,
            chapters = blueprint.chapter_outline.len(),
            "Blueprint draft generated"
        );

        Ok(GenerateBlueprintResponse {
            blueprint,
            ai_message: generated.ai_message,
        })
    }
}

// ============================================================================
// SaveBlueprint / UpdateBlueprint
// ============================================================================

/// 接受蓝图、物化缺失章节并持久化，返回最新项目
async fn persist_blueprint(
    repo: &dyn ProjectRepositoryPort,
    mut project: Project,
    blueprint: Blueprint,
) -> Result<Project, ApplicationError> {
    let created = project.apply_blueprint(blueprint);
    let blueprint = project.blueprint().ok_or(ProjectError::MissingBlueprint)?;
    repo.save_blueprint(project.id(), blueprint, project.chapters())
        .await?;

    tracing::info!(
        project_id = %project.id(),
        outline = blueprint.chapter_outline.len(),
        created_chapters = created.len(),
        "Blueprint saved"
    );

    load_project(repo, project.id()).await
}

/// SaveBlueprint Handler - 整体替换
pub struct SaveBlueprintHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl SaveBlueprintHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: SaveBlueprint) -> Result<Project, ApplicationError> {
        command.blueprint.validate()?;
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;
        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;

        persist_blueprint(self.project_repo.as_ref(), project, command.blueprint).await
    }
}

/// UpdateBlueprint Handler - 按顶层键部分更新
pub struct UpdateBlueprintHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl UpdateBlueprintHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: UpdateBlueprint) -> Result<Project, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;
        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;

        let current = project.blueprint().ok_or(ProjectError::MissingBlueprint)?;
        let patched = current.apply_patch(&command.patch)?;

        persist_blueprint(self.project_repo.as_ref(), project, patched).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MutationScope;
    use crate::application::testing::{sample_blueprint, TestContext};
    use crate::domain::project::GenerationStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_requires_user_message() {
        let ctx = TestContext::new().await;
        let project = Project::new("破晓", "永夜").unwrap();
        ctx.repo.create(&project).await.unwrap();
        let handler = GenerateBlueprintHandler::new(ctx.repo.clone(), ctx.generator.clone());

        let result = handler
            .handle(GenerateBlueprint {
                project_id: project.id(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_generate_returns_outline_without_saving() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_dialogue().await;
        let handler = GenerateBlueprintHandler::new(ctx.repo.clone(), ctx.generator.clone());

        let response = handler
            .handle(GenerateBlueprint {
                project_id: project.id(),
            })
            .await
            .unwrap();

        assert!(!response.blueprint.chapter_outline.is_empty());
        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert!(stored.blueprint().is_none());
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_outline() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_dialogue().await;
        ctx.generator.set_outline_len(0);
        let handler = GenerateBlueprintHandler::new(ctx.repo.clone(), ctx.generator.clone());

        let result = handler
            .handle(GenerateBlueprint {
                project_id: project.id(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::CapabilityFailure(_))));
    }

    #[tokio::test]
    async fn test_save_preserves_generated_chapters() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;

        let mut chapter = project.chapter(1).unwrap().clone();
        chapter.edit_content("正文".into());
        ctx.repo
            .save_chapter_progress(project.id(), &chapter)
            .await
            .unwrap();

        let handler = SaveBlueprintHandler::new(ctx.repo.clone(), ctx.guard.clone());
        let mut blueprint = sample_blueprint(3);
        blueprint.chapter_outline[0].title = "新标题".into();
        let saved = handler
            .handle(SaveBlueprint {
                project_id: project.id(),
                blueprint,
            })
            .await
            .unwrap();

        assert_eq!(saved.chapters().len(), 3);
        let first = saved.chapter(1).unwrap();
        assert_eq!(first.title, "新标题");
        assert_eq!(first.content.as_deref(), Some("正文"));
        assert_eq!(first.generation_status, GenerationStatus::Successful);
        assert_eq!(
            saved.chapter(3).unwrap().generation_status,
            GenerationStatus::NotGenerated
        );
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_outline_numbers() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let handler = SaveBlueprintHandler::new(ctx.repo.clone(), ctx.guard.clone());

        let mut blueprint = sample_blueprint(2);
        blueprint.chapter_outline[1].chapter_number = 1;
        let result = handler
            .handle(SaveBlueprint {
                project_id: project.id(),
                blueprint,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_only_given_keys() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;
        let handler = UpdateBlueprintHandler::new(ctx.repo.clone(), ctx.guard.clone());

        let updated = handler
            .handle(UpdateBlueprint {
                project_id: project.id(),
                patch: json!({ "tone": "黑暗" }),
            })
            .await
            .unwrap();
        let blueprint = updated.blueprint().unwrap();
        assert_eq!(blueprint.tone, "黑暗");
        assert_eq!(blueprint.genre, "奇幻");
        assert_eq!(blueprint.chapter_outline.len(), 2);

        let result = handler
            .handle(UpdateBlueprint {
                project_id: project.id(),
                patch: json!({ "mood": "x" }),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_update_conflicts_with_running_mutation() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let _held = ctx
            .guard
            .try_acquire(project.id(), MutationScope::Project)
            .unwrap();

        let handler = UpdateBlueprintHandler::new(ctx.repo.clone(), ctx.guard.clone());
        let result = handler
            .handle(UpdateBlueprint {
                project_id: project.id(),
                patch: json!({ "tone": "x" }),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_dawnbreak_dialogue_to_blueprint() {
        use crate::application::commands::handlers::ConverseHandler;
        use crate::application::commands::Converse;
        use crate::domain::conversation::{UiControl, UserInput};

        let ctx = TestContext::new().await;
        let project = Project::new("破晓", "一座永夜之城等待第一缕光").unwrap();
        ctx.repo.create(&project).await.unwrap();
        let converse = ConverseHandler::new(ctx.repo.clone(), ctx.generator.clone(), ctx.guard.clone(), 12);

        let mut response = converse
            .handle(Converse {
                project_id: project.id(),
                user_input: None,
                conversation_state: json!({}),
            })
            .await
            .unwrap();

        let mut turns = 0;
        while !response.ready_for_blueprint {
            turns += 1;
            assert!(turns <= 12, "dialogue never became ready");
            let input = match response.ui_control.clone() {
                Some(UiControl::SingleChoice { options }) => UserInput {
                    id: options[0].id.clone(),
                    value: String::new(),
                },
                Some(UiControl::TextInput { .. }) => UserInput {
                    id: "text".into(),
                    value: "守夜人之女在黎明前点燃灯塔".into(),
                },
                None => panic!("dialogue ended before blueprint was ready"),
            };
            response = converse
                .handle(Converse {
                    project_id: project.id(),
                    user_input: Some(input),
                    conversation_state: response.conversation_state,
                })
                .await
                .unwrap();
        }
        assert!(response.ai_message.contains("蓝图"));

        let draft = GenerateBlueprintHandler::new(ctx.repo.clone(), ctx.generator.clone())
            .handle(GenerateBlueprint {
                project_id: project.id(),
            })
            .await
            .unwrap();
        assert_eq!(draft.blueprint.title, "破晓");
        assert!(!draft.blueprint.chapter_outline.is_empty());
        assert!(draft.blueprint.validate().is_ok());

        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(stored.conversation_history().len(), 2 * turns + 1);
    }
}
