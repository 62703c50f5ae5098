//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod analysis_commands;
mod auto_generator_commands;
mod blueprint_commands;
mod chapter_commands;
mod conversation_commands;
mod project_commands;
mod volume_commands;

pub mod handlers;

pub use analysis_commands::*;
pub use auto_generator_commands::*;
pub use blueprint_commands::*;
pub use chapter_commands::*;
pub use conversation_commands::*;
pub use project_commands::*;
pub use volume_commands::*;
