//! Volume Queries

use crate::domain::project::ProjectId;

/// 剧情指标
#[derive(Debug, Clone)]
pub struct GetStoryMetrics {
    pub project_id: ProjectId,
}

/// 分卷配置
#[derive(Debug, Clone)]
pub struct GetSplitConfig {
    pub project_id: ProjectId,
}

/// 已有分卷
#[derive(Debug, Clone)]
pub struct ListVolumes {
    pub project_id: ProjectId,
}
