//! Analysis Task Port - 章节分析任务管理
//!
//! 定义分析任务队列的抽象接口，具体实现在 infrastructure/memory 层。
//! 对外只暴露任务快照。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::project::ProjectId;

pub const DEFAULT_PRIORITY: u8 = 5;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// 任务管理错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Task queue is full")]
    QueueFull,

    #[error("Task queue is closed")]
    QueueClosed,

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisTaskStatus {
    Pending,
    Running,
    Done,
    Failed,
    Cancelled,
}

impl AnalysisTaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisTaskStatus::Pending => "pending",
            AnalysisTaskStatus::Running => "running",
            AnalysisTaskStatus::Done => "done",
            AnalysisTaskStatus::Failed => "failed",
            AnalysisTaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisTaskStatus::Pending),
            "running" => Some(AnalysisTaskStatus::Running),
            "done" => Some(AnalysisTaskStatus::Done),
            "failed" => Some(AnalysisTaskStatus::Failed),
            "cancelled" => Some(AnalysisTaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisTaskStatus::Done | AnalysisTaskStatus::Failed | AnalysisTaskStatus::Cancelled
        )
    }
}

/// 分析任务快照
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTask {
    pub task_id: String,
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub status: AnalysisTaskStatus,
    pub priority: u8,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub result: Option<Value>,
}

impl AnalysisTask {
    pub fn new(project_id: ProjectId, chapter_number: u32, priority: u8, max_retries: u32) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            project_id,
            chapter_number,
            status: AnalysisTaskStatus::Pending,
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            retry_count: 0,
            max_retries,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            error_message: None,
            result: None,
        }
    }

    /// 自动重试预算是否还有剩余
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

/// 列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<AnalysisTaskStatus>,
    pub project_id: Option<ProjectId>,
}

/// 项目任务概览
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStatusSummary {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// 最近创建的任务（创建时间倒序）
    pub recent_tasks: Vec<AnalysisTask>,
}

impl TaskStatusSummary {
    pub fn from_tasks(tasks: Vec<AnalysisTask>, recent_limit: usize) -> Self {
        let mut summary = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in &tasks {
            match task.status {
                AnalysisTaskStatus::Pending => summary.pending += 1,
                AnalysisTaskStatus::Running => summary.running += 1,
                AnalysisTaskStatus::Done => summary.done += 1,
                AnalysisTaskStatus::Failed => summary.failed += 1,
                AnalysisTaskStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary.recent_tasks = tasks.into_iter().take(recent_limit).collect();
        summary
    }
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AnalysisCompleted,
    AnalysisFailed,
}

/// 任务结束时产生的通知
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisNotification {
    pub id: String,
    pub task_id: String,
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl AnalysisNotification {
    /// 由结束的任务生成通知；未结束或已取消的任务不产生通知
    pub fn for_task(task: &AnalysisTask) -> Option<Self> {
        let (kind, title) = match task.status {
            AnalysisTaskStatus::Done => (
                NotificationKind::AnalysisCompleted,
                format!("第{}章分析完成", task.chapter_number),
            ),
            AnalysisTaskStatus::Failed => (
                NotificationKind::AnalysisFailed,
                format!("第{}章分析失败", task.chapter_number),
            ),
            _ => return None,
        };
        Some(Self {
            id: Uuid::new_v4().to_string(),
            task_id: task.task_id.clone(),
            project_id: task.project_id,
            chapter_number: task.chapter_number,
            kind,
            title,
            message: task.error_message.clone(),
            is_read: false,
            created_at: Utc::now(),
        })
    }
}

/// 一次执行的句柄：任务快照与取消令牌
#[derive(Debug, Clone)]
pub struct TaskLease {
    pub task: AnalysisTask,
    pub cancel_token: CancellationToken,
}

/// Analysis Task Manager Port
///
/// 管理分析任务的生命周期，所有状态存储在内存中
pub trait AnalysisTaskManagerPort: Send + Sync {
    /// 登记任务并入队
    fn submit(&self, task: AnalysisTask) -> Result<AnalysisTask, TaskError>;

    /// 获取任务快照
    fn get(&self, task_id: &str) -> Option<AnalysisTask>;

    /// 列出任务（创建时间倒序）
    fn list(&self, filter: &TaskFilter) -> Vec<AnalysisTask>;

    /// 取消任务；已结束的任务原样返回
    fn cancel(&self, task_id: &str) -> Result<AnalysisTask, TaskError>;

    /// 取消项目下未结束的任务并移除该项目的全部任务与通知，返回移除数量
    fn cleanup_project(&self, project_id: ProjectId) -> usize;

    /// 重新排队一个失败任务，重置重试计数
    fn retry(&self, task_id: &str) -> Result<AnalysisTask, TaskError>;

    /// 取出优先级最高的待执行任务（同优先级先进先出）
    fn next_ready(&self) -> Option<String>;

    /// worker 领取任务：pending → running；任务已不在 pending 时返回 None
    fn start(&self, task_id: &str) -> Result<Option<TaskLease>, TaskError>;

    /// 记录一次失败的尝试，返回更新后的快照
    fn record_attempt_failure(&self, task_id: &str, error: String) -> Result<AnalysisTask, TaskError>;

    /// 结果落库前的提交点：任务仍在运行且未取消时返回 true，
    /// 此后取消请求不再改变任务状态
    fn begin_commit(&self, task_id: &str) -> Result<bool, TaskError>;

    /// running → done；任务已被取消时保持取消状态
    fn complete(&self, task_id: &str, result: Value) -> Result<AnalysisTask, TaskError>;

    /// running → failed；任务已被取消时保持取消状态
    fn fail(&self, task_id: &str, error: String) -> Result<AnalysisTask, TaskError>;

    /// 项目任务的状态计数与最近任务
    fn status_summary(&self, project_id: ProjectId, recent_limit: usize) -> TaskStatusSummary {
        let tasks = self.list(&TaskFilter {
            status: None,
            project_id: Some(project_id),
        });
        TaskStatusSummary::from_tasks(tasks, recent_limit)
    }

    /// 章节最近一次提交的分析任务
    fn latest_for_chapter(&self, project_id: ProjectId, chapter_number: u32) -> Option<AnalysisTask> {
        self.list(&TaskFilter {
            status: None,
            project_id: Some(project_id),
        })
        .into_iter()
        .find(|task| task.chapter_number == chapter_number)
    }

    /// 通知列表（创建时间倒序）
    fn notifications(&self, unread_only: bool, limit: usize) -> Vec<AnalysisNotification>;

    fn mark_notification_read(&self, notification_id: &str) -> Result<AnalysisNotification, TaskError>;

    /// 标记全部未读通知，返回标记数量
    fn mark_all_notifications_read(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_is_clamped() {
        let project = ProjectId::new();
        assert_eq!(AnalysisTask::new(project, 1, 0, 3).priority, MIN_PRIORITY);
        assert_eq!(AnalysisTask::new(project, 1, 42, 3).priority, MAX_PRIORITY);
        assert_eq!(AnalysisTask::new(project, 1, DEFAULT_PRIORITY, 3).priority, 5);
    }

    #[test]
    fn test_status_round_trip_and_terminal() {
        for status in [
            AnalysisTaskStatus::Pending,
            AnalysisTaskStatus::Running,
            AnalysisTaskStatus::Done,
            AnalysisTaskStatus::Failed,
            AnalysisTaskStatus::Cancelled,
        ] {
            assert_eq!(AnalysisTaskStatus::from_str(status.as_str()), Some(status));
        }
        assert!(AnalysisTaskStatus::from_str("finished").is_none());
        assert!(!AnalysisTaskStatus::Running.is_terminal());
        assert!(AnalysisTaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_summary_counts_and_truncates() {
        let project = ProjectId::new();
        let mut running = AnalysisTask::new(project, 2, 5, 3);
        running.status = AnalysisTaskStatus::Running;
        let mut failed = AnalysisTask::new(project, 3, 5, 3);
        failed.status = AnalysisTaskStatus::Failed;
        let tasks = vec![AnalysisTask::new(project, 1, 5, 3), running, failed];

        let summary = TaskStatusSummary::from_tasks(tasks, 2);
        assert_eq!(summary.total, 3);
        assert_eq!((summary.pending, summary.running, summary.failed), (1, 1, 1));
        assert_eq!(summary.done, 0);
        assert_eq!(summary.recent_tasks.len(), 2);
    }

    #[test]
    fn test_notification_only_for_done_or_failed() {
        let mut task = AnalysisTask::new(ProjectId::new(), 4, 5, 3);
        assert!(AnalysisNotification::for_task(&task).is_none());

        task.status = AnalysisTaskStatus::Cancelled;
        assert!(AnalysisNotification::for_task(&task).is_none());

        task.status = AnalysisTaskStatus::Failed;
        task.error_message = Some("timeout".into());
        let notification = AnalysisNotification::for_task(&task).unwrap();
        assert_eq!(notification.kind, NotificationKind::AnalysisFailed);
        assert_eq!(notification.message.as_deref(), Some("timeout"));
        assert!(!notification.is_read);
    }
}
