//! Auto Generator Command Handlers

use std::sync::Arc;

use super::load_project;
use crate::application::commands::{
    CreateAutoGenTask, PauseAutoGenTask, StartAutoGenTask, StopAutoGenTask,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AutoGenSettings, AutoGenTask, AutoGeneratorPort, ProjectRepositoryPort,
};
use crate::domain::blueprint::MAX_CHAPTER_NUMBER;

/// 两轮之间允许的最长间隔（秒）
pub const MAX_AUTO_GEN_INTERVAL_SECS: u64 = 3600;

// ============================================================================
// CreateAutoGenTask
// ============================================================================

/// CreateAutoGenTask Handler - 项目必须已有蓝图
pub struct CreateAutoGenTaskHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl CreateAutoGenTaskHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        auto_generator: Arc<dyn AutoGeneratorPort>,
    ) -> Self {
        Self {
            project_repo,
            auto_generator,
        }
    }

    pub async fn handle(&self, command: CreateAutoGenTask) -> Result<AutoGenTask, ApplicationError> {
        let defaults = AutoGenSettings::default();
        let settings = AutoGenSettings {
            target_chapters: command.target_chapters,
            interval_seconds: command.interval_seconds.unwrap_or(defaults.interval_seconds),
            auto_select_version: command
                .auto_select_version
                .unwrap_or(defaults.auto_select_version),
        };

        if let Some(target) = settings.target_chapters {
            if !(1..=MAX_CHAPTER_NUMBER).contains(&target) {
                return Err(ApplicationError::invalid_argument(format!(
                    "target_chapters 必须在 1-{} 之间",
                    MAX_CHAPTER_NUMBER
                )));
            }
        }
        if settings.interval_seconds > MAX_AUTO_GEN_INTERVAL_SECS {
            return Err(ApplicationError::invalid_argument(format!(
                "interval_seconds 不能超过 {}",
                MAX_AUTO_GEN_INTERVAL_SECS
            )));
        }

        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        if project.blueprint().is_none() {
            return Err(ApplicationError::invalid_state("项目还没有蓝图，无法自动生成"));
        }

        Ok(self.auto_generator.create(command.project_id, settings)?)
    }
}

// ============================================================================
// Start / Pause / Stop
// ============================================================================

/// StartAutoGenTask Handler
pub struct StartAutoGenTaskHandler {
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl StartAutoGenTaskHandler {
    pub fn new(auto_generator: Arc<dyn AutoGeneratorPort>) -> Self {
        Self { auto_generator }
    }

    pub async fn handle(&self, command: StartAutoGenTask) -> Result<AutoGenTask, ApplicationError> {
        Ok(self.auto_generator.start(&command.task_id)?)
    }
}

/// PauseAutoGenTask Handler
pub struct PauseAutoGenTaskHandler {
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl PauseAutoGenTaskHandler {
    pub fn new(auto_generator: Arc<dyn AutoGeneratorPort>) -> Self {
        Self { auto_generator }
    }

    pub async fn handle(&self, command: PauseAutoGenTask) -> Result<AutoGenTask, ApplicationError> {
        Ok(self.auto_generator.pause(&command.task_id)?)
    }
}

/// StopAutoGenTask Handler - 对已结束的任务原样返回
pub struct StopAutoGenTaskHandler {
    auto_generator: Arc<dyn AutoGeneratorPort>,
}

impl StopAutoGenTaskHandler {
    pub fn new(auto_generator: Arc<dyn AutoGeneratorPort>) -> Self {
        Self { auto_generator }
    }

    pub async fn handle(&self, command: StopAutoGenTask) -> Result<AutoGenTask, ApplicationError> {
        Ok(self.auto_generator.stop(&command.task_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AutoGenStatus;
    use crate::application::testing::TestContext;
    use crate::domain::project::{Project, ProjectId};
    use crate::infrastructure::worker::AutoGeneratorConfig;

    fn create_command(project_id: ProjectId) -> CreateAutoGenTask {
        CreateAutoGenTask {
            project_id,
            target_chapters: Some(2),
            interval_seconds: Some(0),
            auto_select_version: None,
        }
    }

    #[tokio::test]
    async fn test_create_validates_input_and_blueprint() {
        let ctx = TestContext::new().await;
        let supervisor = ctx.auto_generator(AutoGeneratorConfig::default());
        let handler = CreateAutoGenTaskHandler::new(ctx.repo.clone(), supervisor.clone());

        let bare = Project::new("无蓝图", "还在构思").unwrap();
        ctx.repo.create(&bare).await.unwrap();
        let result = handler.handle(create_command(bare.id())).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));

        let missing = handler.handle(create_command(ProjectId::new())).await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));

        let project = ctx.project_with_chapters(1).await;
        let zero_target = handler
            .handle(CreateAutoGenTask {
                target_chapters: Some(0),
                ..create_command(project.id())
            })
            .await;
        assert!(matches!(zero_target, Err(ApplicationError::InvalidArgument(_))));
        let long_interval = handler
            .handle(CreateAutoGenTask {
                interval_seconds: Some(MAX_AUTO_GEN_INTERVAL_SECS + 1),
                ..create_command(project.id())
            })
            .await;
        assert!(matches!(long_interval, Err(ApplicationError::InvalidArgument(_))));

        let task = handler.handle(create_command(project.id())).await.unwrap();
        assert_eq!(task.status, AutoGenStatus::Pending);
        assert!(task.settings.auto_select_version);
        assert_eq!(task.settings.target_chapters, Some(2));

        let duplicate = handler.handle(create_command(project.id())).await;
        assert!(matches!(duplicate, Err(ApplicationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lifecycle_errors_map_to_application_errors() {
        let ctx = TestContext::new().await;
        let supervisor = ctx.auto_generator(AutoGeneratorConfig::default());
        let project = ctx.project_with_chapters(1).await;
        let task = CreateAutoGenTaskHandler::new(ctx.repo.clone(), supervisor.clone())
            .handle(create_command(project.id()))
            .await
            .unwrap();

        let pause = PauseAutoGenTaskHandler::new(supervisor.clone())
            .handle(PauseAutoGenTask {
                task_id: task.task_id.clone(),
            })
            .await;
        assert!(matches!(pause, Err(ApplicationError::InvalidState(_))));

        let start = StartAutoGenTaskHandler::new(supervisor.clone())
            .handle(StartAutoGenTask {
                task_id: "missing".into(),
            })
            .await;
        assert!(matches!(start, Err(ApplicationError::NotFound { .. })));

        let stopped = StopAutoGenTaskHandler::new(supervisor.clone())
            .handle(StopAutoGenTask {
                task_id: task.task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(stopped.status, AutoGenStatus::Stopped);
    }
}
