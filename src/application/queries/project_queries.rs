//! Project Queries

use crate::domain::project::ProjectId;

/// 获取项目详情
#[derive(Debug, Clone)]
pub struct GetProject {
    pub project_id: ProjectId,
}

/// 获取单个章节
#[derive(Debug, Clone)]
pub struct GetChapter {
    pub project_id: ProjectId,
    pub chapter_number: u32,
}

/// 列出项目摘要
#[derive(Debug, Clone)]
pub struct ListProjectSummaries;
