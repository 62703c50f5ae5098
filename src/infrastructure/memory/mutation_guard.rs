//! In-Memory Mutation Guard Implementation

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::{GuardError, MutationGuard, MutationGuardPort, MutationScope};
use crate::domain::project::ProjectId;

type LockTable = DashMap<(ProjectId, MutationScope), Arc<Mutex<()>>>;

/// 进程内写操作互斥表
///
/// 每个 (项目, 范围) 对应一把锁，冲突时立即返回 Busy。
/// 锁在最后一个持有者释放后从表中移除。
pub struct InMemoryMutationGuard {
    locks: Arc<LockTable>,
}

impl InMemoryMutationGuard {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryMutationGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// 表中只剩自身引用时移除该锁
fn prune(locks: &LockTable, key: &(ProjectId, MutationScope)) {
    locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
}

/// 占用中的范围；drop 时先释放锁再尝试清理表项
struct HeldScope {
    held: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    key: (ProjectId, MutationScope),
}

impl Drop for HeldScope {
    fn drop(&mut self) {
        self.held.take();
        prune(&self.locks, &self.key);
    }
}

impl MutationGuardPort for InMemoryMutationGuard {
    fn try_acquire(
        &self,
        project_id: ProjectId,
        scope: MutationScope,
    ) -> Result<MutationGuard, GuardError> {
        let key = (project_id, scope);
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match lock.try_lock_owned() {
            Ok(held) => Ok(MutationGuard::new(HeldScope {
                held: Some(held),
                locks: self.locks.clone(),
                key,
            })),
            Err(_) => {
                prune(&self.locks, &key);
                tracing::debug!(project_id = %project_id, scope = %scope, "Mutation rejected, scope busy");
                Err(GuardError::Busy(scope.to_string()))
            }
        }
    }
}
