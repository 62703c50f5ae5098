//! Project Context - 创作项目限界上下文
//!
//! 职责:
//! - 项目聚合（蓝图、章节、对话历史、分卷配置）
//! - 章节生产状态机
//! - 项目摘要投影

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Project, ProjectParts, ProjectSummary};
pub use entities::{Chapter, ConversationMessage};
pub use errors::{ChapterError, ProjectError};
pub use value_objects::{count_words, GenerationStatus, MessageRole, ProjectId};
