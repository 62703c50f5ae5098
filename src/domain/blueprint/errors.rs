//! Blueprint Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("大纲章节号重复: {0}")]
    DuplicateChapterNumber(u32),

    #[error("大纲章节号超出范围 1..=10000: {0}")]
    InvalidChapterNumber(u32),

    #[error("未知的蓝图字段: {0}")]
    UnknownField(String),

    #[error("蓝图补丁必须是 JSON 对象")]
    PatchNotObject,

    #[error("蓝图字段值无效: {0}")]
    InvalidValue(String),
}
