//! Project Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Chapter, ConversationMessage, GenerationStatus, ProjectError, ProjectId};
use crate::domain::blueprint::{Blueprint, ChapterOutline, MAX_CHAPTER_NUMBER};
use crate::domain::metrics::SplitConfig;

const MAX_TITLE_CHARS: usize = 200;

/// Project 聚合根
///
/// 不变量:
/// - 章节按 chapter_number 升序且唯一
/// - 蓝图大纲是章节数量的权威来源，物化章节只在缺失时创建，已有章节保留内容
/// - 对话历史只追加
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    title: String,
    initial_prompt: String,
    blueprint: Option<Blueprint>,
    chapters: Vec<Chapter>,
    conversation_history: Vec<ConversationMessage>,
    split_config: SplitConfig,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 从存储恢复聚合时使用的各部分
#[derive(Debug, Clone)]
pub struct ProjectParts {
    pub id: ProjectId,
    pub title: String,
    pub initial_prompt: String,
    pub blueprint: Option<Blueprint>,
    pub chapters: Vec<Chapter>,
    pub conversation_history: Vec<ConversationMessage>,
    pub split_config: SplitConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 项目列表摘要（派生投影）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub genre: String,
    pub last_edited: DateTime<Utc>,
    pub completed_chapters: u32,
    pub total_chapters: u32,
}

impl Project {
    /// 创建新项目
    pub fn new(title: &str, initial_prompt: &str) -> Result<Self, ProjectError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ProjectError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ProjectError::TitleTooLong);
        }

        let now = Utc::now();
        Ok(Self {
            id: ProjectId::new(),
            title: title.to_string(),
            initial_prompt: initial_prompt.trim().to_string(),
            blueprint: None,
            chapters: Vec::new(),
            conversation_history: Vec::new(),
            split_config: SplitConfig::default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn restore(parts: ProjectParts) -> Self {
        let mut chapters = parts.chapters;
        chapters.sort_by_key(|c| c.chapter_number);
        Self {
            id: parts.id,
            title: parts.title,
            initial_prompt: parts.initial_prompt,
            blueprint: parts.blueprint,
            chapters,
            conversation_history: parts.conversation_history,
            split_config: parts.split_config,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    // ========== 章节 ==========

    pub fn chapter(&self, chapter_number: u32) -> Result<&Chapter, ProjectError> {
        self.chapters
            .iter()
            .find(|c| c.chapter_number == chapter_number)
            .ok_or(ProjectError::ChapterNotFound(chapter_number))
    }

    pub fn chapter_mut(&mut self, chapter_number: u32) -> Result<&mut Chapter, ProjectError> {
        self.chapters
            .iter_mut()
            .find(|c| c.chapter_number == chapter_number)
            .ok_or(ProjectError::ChapterNotFound(chapter_number))
    }

    /// 删除章节（保留空缺，不重新编号）；任一章节不存在则整体失败
    pub fn remove_chapters(&mut self, numbers: &[u32]) -> Result<(), ProjectError> {
        if let Some(missing) = numbers
            .iter()
            .find(|n| !self.chapters.iter().any(|c| c.chapter_number == **n))
        {
            return Err(ProjectError::ChapterNotFound(*missing));
        }
        self.chapters.retain(|c| !numbers.contains(&c.chapter_number));
        if let Some(blueprint) = self.blueprint.as_mut() {
            blueprint.remove_outline(numbers);
        }
        self.touch();
        Ok(())
    }

    // ========== 蓝图与大纲 ==========

    /// 接受蓝图并按大纲物化缺失章节，返回本次新建的章节号
    pub fn apply_blueprint(&mut self, mut blueprint: Blueprint) -> Vec<u32> {
        blueprint.sort_outline();
        let outline = blueprint.chapter_outline.clone();
        self.blueprint = Some(blueprint);
        let created = outline
            .into_iter()
            .filter_map(|entry| self.sync_outline_entry(entry))
            .collect();
        self.touch();
        created
    }

    /// 更新或新增单个大纲条目，只改标题与摘要
    pub fn upsert_outline(&mut self, entry: ChapterOutline) -> Result<bool, ProjectError> {
        if !(1..=MAX_CHAPTER_NUMBER).contains(&entry.chapter_number) {
            return Err(ProjectError::InvalidChapterNumber(entry.chapter_number));
        }
        let blueprint = self.blueprint.as_mut().ok_or(ProjectError::MissingBlueprint)?;
        blueprint.upsert_outline(entry.clone());
        let created = self.sync_outline_entry(entry).is_some();
        self.touch();
        Ok(created)
    }

    /// 批量合并大纲条目
    pub fn merge_outline(&mut self, entries: Vec<ChapterOutline>) -> Result<Vec<u32>, ProjectError> {
        let mut created = Vec::new();
        for entry in entries {
            if self.upsert_outline(entry.clone())? {
                created.push(entry.chapter_number);
            }
        }
        Ok(created)
    }

    fn sync_outline_entry(&mut self, entry: ChapterOutline) -> Option<u32> {
        match self.chapter_mut(entry.chapter_number) {
            Ok(chapter) => {
                chapter.update_outline(entry.title, entry.summary);
                None
            }
            Err(_) => {
                let number = entry.chapter_number;
                self.chapters
                    .push(Chapter::new(number, entry.title, entry.summary));
                self.chapters.sort_by_key(|c| c.chapter_number);
                Some(number)
            }
        }
    }

    // ========== 对话与配置 ==========

    pub fn append_messages(&mut self, messages: impl IntoIterator<Item = ConversationMessage>) {
        self.conversation_history.extend(messages);
        self.touch();
    }

    pub fn set_split_config(&mut self, config: SplitConfig) {
        self.split_config = config;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> ProjectSummary {
        let outline_len = self
            .blueprint
            .as_ref()
            .map(|b| b.chapter_outline.len())
            .unwrap_or(0);
        ProjectSummary {
            id: self.id,
            title: self.title.clone(),
            genre: self
                .blueprint
                .as_ref()
                .map(|b| b.genre.clone())
                .unwrap_or_default(),
            last_edited: self.updated_at,
            completed_chapters: self
                .chapters
                .iter()
                .filter(|c| c.generation_status == GenerationStatus::Successful)
                .count() as u32,
            total_chapters: outline_len.max(self.chapters.len()) as u32,
        }
    }

    // Getters
    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn conversation_history(&self) -> &[ConversationMessage] {
        &self.conversation_history
    }

    pub fn split_config(&self) -> &SplitConfig {
        &self.split_config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
