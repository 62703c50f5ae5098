//! Project Context - Errors

use thiserror::Error;

use super::GenerationStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChapterError {
    #[error("章节 {chapter_number} 不允许从 {from} 迁移到 {to}")]
    InvalidTransition {
        chapter_number: u32,
        from: GenerationStatus,
        to: GenerationStatus,
    },

    #[error("章节 {chapter_number} 当前状态 {status} 不允许 {operation}")]
    OperationNotAllowed {
        chapter_number: u32,
        operation: &'static str,
        status: GenerationStatus,
    },

    #[error("版本索引 {index} 越界（共 {len} 个版本）")]
    VersionOutOfRange { index: usize, len: usize },

    #[error("章节 {0} 还没有任何候选版本")]
    NoVersions(u32),

    #[error("生成结果为空")]
    EmptyCandidates,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("项目标题不能为空")]
    EmptyTitle,

    #[error("项目标题长度不能超过200字符")]
    TitleTooLong,

    #[error("章节不存在: {0}")]
    ChapterNotFound(u32),

    #[error("项目还没有蓝图")]
    MissingBlueprint,

    #[error("章节号超出范围 1..=10000: {0}")]
    InvalidChapterNumber(u32),

    #[error(transparent)]
    Chapter(#[from] ChapterError),
}
