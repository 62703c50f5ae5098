//! Blueprint Context - 故事蓝图限界上下文
//!
//! 职责:
//! - 蓝图、世界观、角色、关系、章节大纲模型
//! - AI 字段漂移的宽松反序列化
//! - 按顶层键整体替换的部分更新

mod errors;
mod model;
mod patch;

pub use errors::BlueprintError;
pub use model::{
    Blueprint, ChapterOutline, Character, ExtraFields, Relationship, WorldSetting, MAX_CHAPTER_NUMBER,
};
