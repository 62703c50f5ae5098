//! Volume Command Handlers

use std::sync::Arc;

use super::load_project;
use crate::application::commands::{TriggerAutoSplit, UpdateSplitConfig};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    MutationGuardPort, MutationScope, ProjectRepositoryPort, StoryGeneratorPort,
    VolumeNamingRequest,
};
use crate::application::queries::handlers::project_metrics;
use crate::domain::metrics::{normalize_volume_title, plan_volumes, ProposedVolume, SplitConfig, Volume};
use crate::domain::project::{Project, ProjectId};
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// TriggerAutoSplit
// ============================================================================

/// 自动分卷响应
#[derive(Debug, Clone)]
pub struct AutoSplitResponse {
    /// 本次新建的卷
    pub created: Vec<Volume>,
    /// 全部卷
    pub volumes: Vec<Volume>,
}

/// TriggerAutoSplit Handler
pub struct TriggerAutoSplitHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    event_publisher: Arc<EventPublisher>,
}

impl TriggerAutoSplitHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            project_repo,
            generator,
            mutation_guard,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: TriggerAutoSplit) -> Result<AutoSplitResponse, ApplicationError> {
        let project_id = command.project_id;
        let _guard = self
            .mutation_guard
            .try_acquire(project_id, MutationScope::Project)?;

        let project = load_project(self.project_repo.as_ref(), project_id).await?;
        let config = project.split_config().clone();
        let threshold = command.threshold.unwrap_or(config.score_threshold);
        if threshold > 100 {
            return Err(ApplicationError::invalid_argument(format!(
                "threshold 必须在 0-100 之间: {}",
                threshold
            )));
        }

        let existing = self.project_repo.find_volumes(project_id).await?;
        let analyses = self.project_repo.find_chapter_analyses(project_id).await?;
        let metrics = project_metrics(&project, &analyses);

        let proposals = plan_volumes(&metrics, &existing, &config, threshold);
        if proposals.is_empty() {
            tracing::debug!(project_id = %project_id, "No new volume boundary");
            return Ok(AutoSplitResponse {
                created: Vec::new(),
                volumes: existing,
            });
        }

        let mut created = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let title = if config.use_ai_naming {
                self.ai_title(&project, &proposal).await
            } else {
                proposal.fallback_title()
            };
            created.push(proposal.into_volume(title));
        }

        self.project_repo.append_volumes(project_id, &created).await?;
        self.event_publisher.publish_volumes_created(
            project_id,
            created.iter().map(|v| v.volume_number).collect(),
        );

        tracing::info!(
            project_id = %project_id,
            created = created.len(),
            threshold = threshold,
            "Volumes split"
        );

        let volumes = self.project_repo.find_volumes(project_id).await?;
        Ok(AutoSplitResponse { created, volumes })
    }

    /// 分析完成后的自动分卷评估；项目关闭了自动分卷时返回 None
    pub async fn handle_after_analysis(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<AutoSplitResponse>, ApplicationError> {
        let project = load_project(self.project_repo.as_ref(), project_id).await?;
        if !project.split_config().enabled {
            tracing::debug!(project_id = %project_id, "Auto split disabled, skipping");
            return Ok(None);
        }
        self.handle(TriggerAutoSplit {
            project_id,
            threshold: None,
        })
        .await
        .map(Some)
    }

    /// AI 卷名，失败或无法规整时退回默认卷名
    async fn ai_title(&self, project: &Project, proposal: &ProposedVolume) -> String {
        let chapter_notes = project
            .chapters()
            .iter()
            .filter(|c| (proposal.start_chapter..=proposal.end_chapter).contains(&c.chapter_number))
            .map(|c| format!("第{}章 {}：{}", c.chapter_number, c.title, c.summary))
            .collect();

        let request = VolumeNamingRequest {
            volume_number: proposal.volume_number,
            start_chapter: proposal.start_chapter,
            end_chapter: proposal.end_chapter,
            chapter_notes,
        };

        match self.generator.name_volume(request).await {
            Ok(raw) => normalize_volume_title(&raw, proposal.volume_number)
                .unwrap_or_else(|| proposal.fallback_title()),
            Err(e) => {
                tracing::warn!(
                    project_id = %project.id(),
                    volume_number = proposal.volume_number,
                    error = %e,
                    "Volume naming failed, using fallback title"
                );
                proposal.fallback_title()
            }
        }
    }
}

// ============================================================================
// UpdateSplitConfig
// ============================================================================

/// UpdateSplitConfig Handler
pub struct UpdateSplitConfigHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
}

impl UpdateSplitConfigHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
    ) -> Self {
        Self {
            project_repo,
            mutation_guard,
        }
    }

    pub async fn handle(&self, command: UpdateSplitConfig) -> Result<SplitConfig, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;
        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;

        let config = project.split_config().apply(command.patch)?;
        self.project_repo
            .save_split_config(command.project_id, &config)
            .await?;

        tracing::info!(
            project_id = %command.project_id,
            enabled = config.enabled,
            min_chapters = config.min_chapters,
            max_chapters = config.max_chapters,
            "Split config updated"
        );

        Ok(config)
    }
}
