//! Analysis Task Command Handlers

use std::sync::Arc;

use super::load_project;
use crate::application::commands::{
    CancelAnalysisTask, MarkAllNotificationsRead, MarkNotificationRead, RetryAnalysisTask,
    SubmitAnalysis,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisNotification, AnalysisTask, AnalysisTaskManagerPort, ProjectRepositoryPort,
    DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY,
};
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// SubmitAnalysis
// ============================================================================

/// SubmitAnalysis Handler
pub struct SubmitAnalysisHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
    event_publisher: Arc<EventPublisher>,
    max_retries: u32,
}

impl SubmitAnalysisHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        event_publisher: Arc<EventPublisher>,
        max_retries: u32,
    ) -> Self {
        Self {
            project_repo,
            task_manager,
            event_publisher,
            max_retries,
        }
    }

    pub async fn handle(&self, command: SubmitAnalysis) -> Result<AnalysisTask, ApplicationError> {
        let priority = command.priority.unwrap_or(DEFAULT_PRIORITY);
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(ApplicationError::invalid_argument(format!(
                "priority 必须在 {}-{} 之间",
                MIN_PRIORITY, MAX_PRIORITY
            )));
        }

        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;
        let chapter = project.chapter(command.chapter_number)?;
        if !chapter.has_content() {
            return Err(ApplicationError::invalid_state(format!(
                "第{}章还没有正文，无法分析",
                command.chapter_number
            )));
        }

        let task = self.task_manager.submit(AnalysisTask::new(
            command.project_id,
            command.chapter_number,
            priority,
            self.max_retries,
        ))?;
        self.event_publisher.publish_task(&task);

        tracing::info!(
            task_id = %task.task_id,
            project_id = %command.project_id,
            chapter_number = command.chapter_number,
            priority = priority,
            "Analysis task submitted"
        );

        Ok(task)
    }
}

// ============================================================================
// CancelAnalysisTask
// ============================================================================

/// CancelAnalysisTask Handler - 对已结束的任务是无害的空操作
pub struct CancelAnalysisTaskHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
    event_publisher: Arc<EventPublisher>,
}

impl CancelAnalysisTaskHandler {
    pub fn new(
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            task_manager,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: CancelAnalysisTask) -> Result<AnalysisTask, ApplicationError> {
        let current = self
            .task_manager
            .get(&command.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &command.task_id))?;
        if current.status.is_terminal() {
            tracing::debug!(
                task_id = %command.task_id,
                status = current.status.as_str(),
                "Cancel on finished task ignored"
            );
            return Ok(current);
        }

        let task = self.task_manager.cancel(&command.task_id)?;
        self.event_publisher.publish_task(&task);

        tracing::info!(task_id = %command.task_id, "Analysis task cancelled");
        Ok(task)
    }
}

// ============================================================================
// RetryAnalysisTask
// ============================================================================

/// RetryAnalysisTask Handler
pub struct RetryAnalysisTaskHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
    event_publisher: Arc<EventPublisher>,
}

impl RetryAnalysisTaskHandler {
    pub fn new(
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            task_manager,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: RetryAnalysisTask) -> Result<AnalysisTask, ApplicationError> {
        let task = self.task_manager.retry(&command.task_id)?;
        self.event_publisher.publish_task(&task);

        tracing::info!(task_id = %command.task_id, "Analysis task requeued");
        Ok(task)
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// MarkNotificationRead Handler
pub struct MarkNotificationReadHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl MarkNotificationReadHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(
        &self,
        command: MarkNotificationRead,
    ) -> Result<AnalysisNotification, ApplicationError> {
        Ok(self
            .task_manager
            .mark_notification_read(&command.notification_id)?)
    }
}

/// MarkAllNotificationsRead Handler - 返回本次标记的数量
pub struct MarkAllNotificationsReadHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl MarkAllNotificationsReadHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(&self, _command: MarkAllNotificationsRead) -> Result<usize, ApplicationError> {
        let marked = self.task_manager.mark_all_notifications_read();
        tracing::debug!(marked = marked, "Notifications marked as read");
        Ok(marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AnalysisTaskStatus;
    use crate::application::testing::TestContext;

    async fn submit_for_written_chapter(ctx: &TestContext) -> AnalysisTask {
        let project = ctx.project_with_chapters(1).await;
        let mut chapter = project.chapter(1).unwrap().clone();
        chapter.edit_content("夜色如墨！".into());
        ctx.repo
            .save_chapter_progress(project.id(), &chapter)
            .await
            .unwrap();

        SubmitAnalysisHandler::new(ctx.repo.clone(), ctx.tasks.clone(), ctx.events.clone(), 3)
            .handle(SubmitAnalysis {
                project_id: project.id(),
                chapter_number: 1,
                priority: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_requires_content() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let handler =
            SubmitAnalysisHandler::new(ctx.repo.clone(), ctx.tasks.clone(), ctx.events.clone(), 3);

        let result = handler
            .handle(SubmitAnalysis {
                project_id: project.id(),
                chapter_number: 1,
                priority: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));

        let bad_priority = handler
            .handle(SubmitAnalysis {
                project_id: project.id(),
                chapter_number: 1,
                priority: Some(11),
            })
            .await;
        assert!(matches!(bad_priority, Err(ApplicationError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_submit_enqueues_pending_task() {
        let mut ctx = TestContext::new().await;
        let task = submit_for_written_chapter(&ctx).await;

        assert_eq!(task.status, AnalysisTaskStatus::Pending);
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert_eq!(ctx.task_rx.recv().await, Some(task.task_id.clone()));
    }

    #[tokio::test]
    async fn test_cancel_twice_is_noop() {
        let ctx = TestContext::new().await;
        let task = submit_for_written_chapter(&ctx).await;
        let handler = CancelAnalysisTaskHandler::new(ctx.tasks.clone(), ctx.events.clone());

        let first = handler
            .handle(CancelAnalysisTask {
                task_id: task.task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(first.status, AnalysisTaskStatus::Cancelled);
        let completed_at = first.completed_at;
        assert!(completed_at.is_some());

        let second = handler
            .handle(CancelAnalysisTask {
                task_id: task.task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(second.status, AnalysisTaskStatus::Cancelled);
        assert_eq!(second.completed_at, completed_at);
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let ctx = TestContext::new().await;
        let handler = CancelAnalysisTaskHandler::new(ctx.tasks.clone(), ctx.events.clone());
        let result = handler
            .handle(CancelAnalysisTask {
                task_id: "missing".into(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_retry_only_failed_tasks() {
        let ctx = TestContext::new().await;
        let task = submit_for_written_chapter(&ctx).await;
        let handler = RetryAnalysisTaskHandler::new(ctx.tasks.clone(), ctx.events.clone());

        let pending = handler
            .handle(RetryAnalysisTask {
                task_id: task.task_id.clone(),
            })
            .await;
        assert!(matches!(pending, Err(ApplicationError::InvalidState(_))));

        ctx.tasks.start(&task.task_id).unwrap();
        ctx.tasks.fail(&task.task_id, "boom".into()).unwrap();
        let requeued = handler
            .handle(RetryAnalysisTask {
                task_id: task.task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(requeued.status, AnalysisTaskStatus::Pending);
        assert_eq!(requeued.retry_count, 0);
        assert!(requeued.error_message.is_none());
    }

    #[tokio::test]
    async fn test_mark_notifications_read() {
        let ctx = TestContext::new().await;
        let first = submit_for_written_chapter(&ctx).await;
        ctx.tasks.fail(&first.task_id, "timeout".into()).unwrap();
        let second = ctx
            .tasks
            .submit(AnalysisTask::new(first.project_id, 1, 5, 3))
            .unwrap();
        ctx.tasks.fail(&second.task_id, "timeout".into()).unwrap();

        let id = ctx.tasks.notifications(false, 10)[0].id.clone();
        let read = MarkNotificationReadHandler::new(ctx.tasks.clone())
            .handle(MarkNotificationRead {
                notification_id: id,
            })
            .await
            .unwrap();
        assert!(read.is_read);

        let missing = MarkNotificationReadHandler::new(ctx.tasks.clone())
            .handle(MarkNotificationRead {
                notification_id: "nope".into(),
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));

        let handler = MarkAllNotificationsReadHandler::new(ctx.tasks.clone());
        assert_eq!(handler.handle(MarkAllNotificationsRead).await.unwrap(), 1);
        assert_eq!(handler.handle(MarkAllNotificationsRead).await.unwrap(), 0);
    }
}
