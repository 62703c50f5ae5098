//! Analysis Task Queries

use crate::domain::project::ProjectId;

/// 列出分析任务；status 为原始字符串，未知值会被拒绝
#[derive(Debug, Clone, Default)]
pub struct ListAnalysisTasks {
    pub status: Option<String>,
    pub project_id: Option<ProjectId>,
}

/// 获取单个分析任务
#[derive(Debug, Clone)]
pub struct GetAnalysisTask {
    pub task_id: String,
}

/// 项目分析概览
#[derive(Debug, Clone)]
pub struct GetAnalysisStatus {
    pub project_id: ProjectId,
    /// 最近任务条数，1-100
    pub limit: usize,
}

/// 章节最近一次分析任务
#[derive(Debug, Clone)]
pub struct GetLatestChapterTask {
    pub project_id: ProjectId,
    pub chapter_number: u32,
}

/// 列出分析通知
#[derive(Debug, Clone)]
pub struct ListNotifications {
    pub unread_only: bool,
    /// 1-100
    pub limit: usize,
}
