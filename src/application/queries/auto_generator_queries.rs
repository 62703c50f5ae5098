//! Auto Generator Queries

use crate::domain::project::ProjectId;

/// 获取单个自动生成任务
#[derive(Debug, Clone)]
pub struct GetAutoGenTask {
    pub task_id: String,
}

/// 列出项目下的自动生成任务
#[derive(Debug, Clone)]
pub struct ListAutoGenTasks {
    pub project_id: ProjectId,
}

/// 任务日志，最新在前
#[derive(Debug, Clone)]
pub struct GetAutoGenLogs {
    pub task_id: String,
    /// 1-200
    pub limit: usize,
}
