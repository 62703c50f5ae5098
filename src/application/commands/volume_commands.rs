//! Volume Commands

use crate::domain::metrics::SplitConfigPatch;
use crate::domain::project::ProjectId;

/// 触发自动分卷
#[derive(Debug, Clone)]
pub struct TriggerAutoSplit {
    pub project_id: ProjectId,
    /// 覆盖配置中的 score_threshold
    pub threshold: Option<u32>,
}

/// 部分更新分卷配置
#[derive(Debug, Clone)]
pub struct UpdateSplitConfig {
    pub project_id: ProjectId,
    pub patch: SplitConfigPatch,
}
