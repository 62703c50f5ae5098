//! Project Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::ProjectRepositoryPort;
use crate::application::queries::{GetChapter, GetProject, ListProjectSummaries};
use crate::domain::project::{Chapter, Project, ProjectSummary};

/// GetProject Handler
pub struct GetProjectHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl GetProjectHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: GetProject) -> Result<Project, ApplicationError> {
        self.project_repo
            .find_by_id(query.project_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Project", query.project_id))
    }
}

/// GetChapter Handler
pub struct GetChapterHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl GetChapterHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: GetChapter) -> Result<Chapter, ApplicationError> {
        let project = self
            .project_repo
            .find_by_id(query.project_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Project", query.project_id))?;

        Ok(project.chapter(query.chapter_number)?.clone())
    }
}

/// ListProjectSummaries Handler
pub struct ListProjectSummariesHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl ListProjectSummariesHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, _query: ListProjectSummaries) -> Result<Vec<ProjectSummary>, ApplicationError> {
        let projects = self.project_repo.find_all().await?;
        Ok(projects.iter().map(Project::summary).collect())
    }
}
