//! Project Command Handlers

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::commands::{CreateProject, DeleteProjects};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisTaskManagerPort, AutoGeneratorPort, ProjectRepositoryPort, RepositoryError,
};
use crate::domain::project::{Project, ProjectId};
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// CreateProject
// ============================================================================

/// CreateProject Handler
pub struct CreateProjectHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl CreateProjectHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, command: CreateProject) -> Result<Project, ApplicationError> {
        let project = Project::new(&command.title, &command.initial_prompt)?;
        self.project_repo.create(&project).await?;

        tracing::info!(
            project_id = %project.id(),
            title = %project.title(),
            "Project created"
        );

        Ok(project)
    }
}

// ============================================================================
// DeleteProjects
// ============================================================================

/// 批量删除响应
#[derive(Debug, Clone)]
pub struct DeleteProjectsResponse {
    pub status: String,
    pub message: String,
}

/// DeleteProjects Handler - 全部成功或全部不删；成功后清理项目的内存任务
pub struct DeleteProjectsHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
    auto_generator: Arc<dyn AutoGeneratorPort>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteProjectsHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        auto_generator: Arc<dyn AutoGeneratorPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            project_repo,
            task_manager,
            auto_generator,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        command: DeleteProjects,
    ) -> Result<DeleteProjectsResponse, ApplicationError> {
        let ids: Vec<ProjectId> = command
            .project_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Err(ApplicationError::invalid_argument("至少需要一个项目 ID"));
        }

        self.project_repo
            .delete_many(&ids)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(id) => ApplicationError::not_found("Project", id),
                other => other.into(),
            })?;

        let mut removed_tasks = 0;
        let mut removed_auto_gen = 0;
        for id in &ids {
            removed_tasks += self.task_manager.cleanup_project(*id);
            removed_auto_gen += self.auto_generator.cleanup_project(*id);
            self.event_publisher.publish_project_deleted(*id);
        }

        tracing::info!(
            count = ids.len(),
            removed_tasks = removed_tasks,
            removed_auto_gen = removed_auto_gen,
            "Projects deleted"
        );

        Ok(DeleteProjectsResponse {
            status: "success".to_string(),
            message: format!("已删除 {} 个项目", ids.len()),
        })
    }
}
