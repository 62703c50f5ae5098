//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod analysis_queries;
mod auto_generator_queries;
mod project_queries;
mod volume_queries;

pub mod handlers;

pub use analysis_queries::*;
pub use auto_generator_queries::*;
pub use project_queries::*;
pub use volume_queries::*;
