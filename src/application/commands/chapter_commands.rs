//! Chapter Pipeline Commands

use crate::domain::project::ProjectId;

/// 生成章节候选版本
#[derive(Debug, Clone)]
pub struct GenerateChapter {
    pub project_id: ProjectId,
    pub chapter_number: u32,
}

/// 评估章节候选版本
#[derive(Debug, Clone)]
pub struct EvaluateChapter {
    pub project_id: ProjectId,
    pub chapter_number: u32,
}

/// 选定候选版本
#[derive(Debug, Clone)]
pub struct SelectChapterVersion {
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub version_index: usize,
}

/// 人工编辑正文
#[derive(Debug, Clone)]
pub struct EditChapterContent {
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub content: String,
}

/// 更新章节大纲
#[derive(Debug, Clone)]
pub struct UpdateChapterOutline {
    pub project_id: ProjectId,
    pub chapter_number: u32,
    pub title: String,
    pub summary: String,
}

/// 批量删除章节
#[derive(Debug, Clone)]
pub struct DeleteChapters {
    pub project_id: ProjectId,
    pub chapter_numbers: Vec<u32>,
}

/// 续写大纲
#[derive(Debug, Clone)]
pub struct GenerateOutline {
    pub project_id: ProjectId,
    pub start_chapter: u32,
    pub num_chapters: u32,
}
