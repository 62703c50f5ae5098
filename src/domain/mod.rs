//! Domain Layer - 领域层
//!
//! 包含四个限界上下文:
//! - Project Context: 创作项目与章节生产状态机
//! - Blueprint Context: 故事蓝图
//! - Conversation Context: 概念对话
//! - Metrics Context: 剧情指标与分卷

pub mod blueprint;
pub mod conversation;
pub mod metrics;
pub mod project;
