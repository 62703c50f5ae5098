//! Auto Generator Commands

use crate::domain::project::ProjectId;

/// 创建自动生成任务
#[derive(Debug, Clone)]
pub struct CreateAutoGenTask {
    pub project_id: ProjectId,
    pub target_chapters: Option<u32>,
    pub interval_seconds: Option<u64>,
    pub auto_select_version: Option<bool>,
}

/// 启动或恢复任务
#[derive(Debug, Clone)]
pub struct StartAutoGenTask {
    pub task_id: String,
}

/// 暂停任务
#[derive(Debug, Clone)]
pub struct PauseAutoGenTask {
    pub task_id: String,
}

/// 停止任务
#[derive(Debug, Clone)]
pub struct StopAutoGenTask {
    pub task_id: String,
}
