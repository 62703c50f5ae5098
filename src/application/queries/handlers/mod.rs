//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod analysis_handlers;
mod auto_generator_handlers;
mod project_handlers;
mod volume_handlers;

pub use analysis_handlers::*;
pub use auto_generator_handlers::*;
pub use project_handlers::*;
pub use volume_handlers::*;
