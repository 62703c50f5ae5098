//! Analysis Task Commands

use crate::domain::project::ProjectId;

/// 提交章节分析任务
#[derive(Debug, Clone)]
pub struct SubmitAnalysis {
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub priority: Option<u8>,
}

/// 取消分析任务
#[derive(Debug, Clone)]
pub struct CancelAnalysisTask {
    pub task_id: String,
}

/// 重试失败的分析任务
#[derive(Debug, Clone)]
pub struct RetryAnalysisTask {
    pub task_id: String,
}

/// 标记单条通知已读
#[derive(Debug, Clone)]
pub struct MarkNotificationRead {
    pub notification_id: String,
}

/// 标记全部通知已读
#[derive(Debug, Clone, Default)]
pub struct MarkAllNotificationsRead;
