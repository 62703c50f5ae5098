//! Analysis Task Query Handlers

use std::sync::Arc;

use crate::application::commands::handlers::load_project;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisNotification, AnalysisTask, AnalysisTaskManagerPort, AnalysisTaskStatus,
    ProjectRepositoryPort, TaskFilter, TaskStatusSummary,
};
use crate::application::queries::{
    GetAnalysisStatus, GetAnalysisTask, GetLatestChapterTask, ListAnalysisTasks, ListNotifications,
};

/// 列表类查询的条数上限
pub const MAX_LIST_LIMIT: usize = 100;

fn check_limit(limit: usize) -> Result<usize, ApplicationError> {
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(ApplicationError::invalid_argument(format!(
            "limit 必须在 1-{} 之间",
            MAX_LIST_LIMIT
        )));
    }
    Ok(limit)
}

/// ListAnalysisTasks Handler
pub struct ListAnalysisTasksHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl ListAnalysisTasksHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(&self, query: ListAnalysisTasks) -> Result<Vec<AnalysisTask>, ApplicationError> {
        let status = match query.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(AnalysisTaskStatus::from_str(raw).ok_or_else(|| {
                ApplicationError::invalid_argument(format!("未知的任务状态: {}", raw))
            })?),
        };

        Ok(self.task_manager.list(&TaskFilter {
            status,
            project_id: query.project_id,
        }))
    }
}

/// GetAnalysisTask Handler
pub struct GetAnalysisTaskHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl GetAnalysisTaskHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(&self, query: GetAnalysisTask) -> Result<AnalysisTask, ApplicationError> {
        self.task_manager
            .get(&query.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &query.task_id))
    }
}

/// GetAnalysisStatus Handler
pub struct GetAnalysisStatusHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl GetAnalysisStatusHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
    ) -> Self {
        Self {
            project_repo,
            task_manager,
        }
    }

    pub async fn handle(&self, query: GetAnalysisStatus) -> Result<TaskStatusSummary, ApplicationError> {
        let limit = check_limit(query.limit)?;
        load_project(self.project_repo.as_ref(), query.project_id).await?;
        Ok(self.task_manager.status_summary(query.project_id, limit))
    }
}

/// GetLatestChapterTask Handler - 章节从未提交过分析时返回 None
pub struct GetLatestChapterTaskHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl GetLatestChapterTaskHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(&self, query: GetLatestChapterTask) -> Result<Option<AnalysisTask>, ApplicationError> {
        Ok(self
            .task_manager
            .latest_for_chapter(query.project_id, query.chapter_number))
    }
}

/// ListNotifications Handler
pub struct ListNotificationsHandler {
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
}

impl ListNotificationsHandler {
    pub fn new(task_manager: Arc<dyn AnalysisTaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub async fn handle(&self, query: ListNotifications) -> Result<Vec<AnalysisNotification>, ApplicationError> {
        let limit = check_limit(query.limit)?;
        Ok(self.task_manager.notifications(query.unread_only, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::TestContext;
    use crate::domain::project::ProjectId;
    use crate::infrastructure::memory::InMemoryAnalysisTaskManager;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_filters_and_unknown_status() {
        let (tx, _rx) = mpsc::channel(8);
        let manager = Arc::new(InMemoryAnalysisTaskManager::new(tx));
        let project_a = ProjectId::new();
        let project_b = ProjectId::new();
        let a = manager.submit(AnalysisTask::new(project_a, 1, 5, 3)).unwrap();
        manager.submit(AnalysisTask::new(project_b, 1, 5, 3)).unwrap();
        manager.cancel(&a.task_id).unwrap();

        let handler = ListAnalysisTasksHandler::new(manager.clone());
        let for_a = handler
            .handle(ListAnalysisTasks {
                status: None,
                project_id: Some(project_a),
            })
            .await
            .unwrap();
        assert_eq!(for_a.len(), 1);

        let pending = handler
            .handle(ListAnalysisTasks {
                status: Some("pending".into()),
                project_id: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].project_id, project_b);

        let unknown = handler
            .handle(ListAnalysisTasks {
                status: Some("finished".into()),
                project_id: None,
            })
            .await;
        assert!(matches!(unknown, Err(ApplicationError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_get_missing_task() {
        let (tx, _rx) = mpsc::channel(8);
        let handler = GetAnalysisTaskHandler::new(Arc::new(InMemoryAnalysisTaskManager::new(tx)));
        let result = handler
            .handle(GetAnalysisTask {
                task_id: "nope".into(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_status_requires_project_and_valid_limit() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(2).await;
        let first = ctx.tasks.submit(AnalysisTask::new(project.id(), 1, 5, 3)).unwrap();
        ctx.tasks.submit(AnalysisTask::new(project.id(), 2, 5, 3)).unwrap();
        ctx.tasks.cancel(&first.task_id).unwrap();

        let handler = GetAnalysisStatusHandler::new(ctx.repo.clone(), ctx.tasks.clone());
        let summary = handler
            .handle(GetAnalysisStatus {
                project_id: project.id(),
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!((summary.pending, summary.cancelled), (1, 1));
        assert_eq!(summary.recent_tasks.len(), 1);

        let zero = handler
            .handle(GetAnalysisStatus {
                project_id: project.id(),
                limit: 0,
            })
            .await;
        assert!(matches!(zero, Err(ApplicationError::InvalidArgument(_))));

        let missing = handler
            .handle(GetAnalysisStatus {
                project_id: ProjectId::new(),
                limit: 10,
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_latest_task_and_notifications() {
        let ctx = TestContext::new().await;
        let project = ctx.project_with_chapters(1).await;
        let latest = GetLatestChapterTaskHandler::new(ctx.tasks.clone());
        let none = latest
            .handle(GetLatestChapterTask {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await
            .unwrap();
        assert!(none.is_none());

        let task = ctx.tasks.submit(AnalysisTask::new(project.id(), 1, 5, 3)).unwrap();
        ctx.tasks.fail(&task.task_id, "timeout".into()).unwrap();
        let found = latest
            .handle(GetLatestChapterTask {
                project_id: project.id(),
                chapter_number: 1,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.task_id, task.task_id);

        let notifications = ListNotificationsHandler::new(ctx.tasks.clone());
        let unread = notifications
            .handle(ListNotifications {
                unread_only: true,
                limit: 20,
            })
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].chapter_number, 1);

        let too_many = notifications
            .handle(ListNotifications {
                unread_only: false,
                limit: 101,
            })
            .await;
        assert!(matches!(too_many, Err(ApplicationError::InvalidArgument(_))));
    }
}
