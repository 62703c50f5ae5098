//! Mutation Guard Port - 写操作互斥
//!
//! 同一项目的同一章节（或项目级结构）同一时刻只允许一个写操作在进行。
//! 冲突时立即失败，不排队等待。

use std::fmt;
use thiserror::Error;

use crate::domain::project::ProjectId;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{0} 正在被其它操作修改，请稍后重试")]
    Busy(String),
}

/// 互斥范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationScope {
    /// 项目级结构：对话、蓝图、大纲、分卷
    Project,
    /// 单个章节的生产流水线
    Chapter(u32),
}

impl fmt::Display for MutationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationScope::Project => write!(f, "项目"),
            MutationScope::Chapter(n) => write!(f, "第{}章", n),
        }
    }
}

/// 持有期间占用互斥范围，drop 时释放
pub struct MutationGuard {
    _held: Box<dyn Send + Sync>,
}

impl MutationGuard {
    pub fn new(held: impl Send + Sync + 'static) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl fmt::Debug for MutationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationGuard").finish_non_exhaustive()
    }
}

/// Mutation Guard Port
pub trait MutationGuardPort: Send + Sync {
    /// 尝试占用；已被占用时返回 Busy
    fn try_acquire(
        &self,
        project_id: ProjectId,
        scope: MutationScope,
    ) -> Result<MutationGuard, GuardError>;

    /// 依次占用多个范围，任一失败则释放已占用的部分
    fn try_acquire_all(
        &self,
        project_id: ProjectId,
        scopes: &[MutationScope],
    ) -> Result<Vec<MutationGuard>, GuardError> {
        scopes
            .iter()
            .map(|scope| self.try_acquire(project_id, *scope))
            .collect()
    }
}
