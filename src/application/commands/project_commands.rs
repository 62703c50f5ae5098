//! Project Commands

use crate::domain::project::ProjectId;

/// 创建项目命令
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub initial_prompt: String,
}

/// 批量删除项目命令
#[derive(Debug, Clone)]
pub struct DeleteProjects {
    pub project_ids: Vec<ProjectId>,
}
