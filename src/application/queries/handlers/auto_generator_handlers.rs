//! Auto Generator Query Handlers

use std::sync::Arc;

use crate::application::commands::handlers::load_project;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AutoGenLog, AutoGenTask, AutoGeneratorPort, ProjectRepositoryPort, MAX_AUTO_GEN_LOGS,
};
use crate::application::queries::{GetAutoGenLogs, GetAutoGenTask, ListAutoGenTasks};

/// GetAutoGenTask Handler
pub struct GetAutoGenTaskHandler {
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl GetAutoGenTaskHandler {
    pub fn new(auto_generator: Arc<dyn AutoGeneratorPort>) -> Self {
        Self { auto_generator }
    }

    pub async fn handle(&self, query: GetAutoGenTask) -> Result<AutoGenTask, ApplicationError> {
        self.auto_generator
            .get(&query.task_id)
            .ok_or_else(|| ApplicationError::not_found("AutoGeneratorTask", &query.task_id))
    }
}

/// ListAutoGenTasks Handler - 项目不存在时返回 NotFound
pub struct ListAutoGenTasksHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl ListAutoGenTasksHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        auto_generator: Arc<dyn AutoGeneratorPort>,
    ) -> Self {
        Self {
            project_repo,
            auto_generator,
        }
    }

    pub async fn handle(&self, query: ListAutoGenTasks) -> Result<Vec<AutoGenTask>, ApplicationError> {
        load_project(self.project_repo.as_ref(), query.project_id).await?;
        Ok(self.auto_generator.list_project(query.project_id))
    }
}

/// GetAutoGenLogs Handler
pub struct GetAutoGenLogsHandler {
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl GetAutoGenLogsHandler {
    pub fn new(auto_generator: Arc<dyn AutoGeneratorPort>) -> Self {
        Self { auto_generator }
    }

    pub async fn handle(&self, query: GetAutoGenLogs) -> Result<Vec<AutoGenLog>, ApplicationError> {
        if !(1..=MAX_AUTO_GEN_LOGS).contains(&query.limit) {
            return Err(ApplicationError::invalid_argument(format!(
                "limit 必须在 1-{} 之间",
                MAX_AUTO_GEN_LOGS
            )));
        }
        Ok(self.auto_generator.logs(&query.task_id, query.limit)?)
    }
}
