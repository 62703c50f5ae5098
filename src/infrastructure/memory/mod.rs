//! Memory Layer - In-Memory State Management
//!
//! 实现 AnalysisTaskManager 和 MutationGuard，管理分析任务队列与写操作互斥的内存状态

mod analysis_task_manager;
mod mutation_guard;

pub use analysis_task_manager::{InMemoryAnalysisTaskManager, DEFAULT_RETAINED_TASKS};
pub use mutation_guard::InMemoryMutationGuard;
