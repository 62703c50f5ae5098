//! Project Context - Entities
//!
//! Chapter 承载章节生产状态机，ConversationMessage 为只追加的对话日志。

use serde::{Deserialize, Serialize};

use super::{count_words, ChapterError, GenerationStatus, MessageRole};

// ============================================================================
// Chapter
// ============================================================================

/// 章节实体
///
/// 不变量:
/// - `generation_status` 只沿 [`GenerationStatus::can_transition_to`] 的边迁移，
///   唯一例外是 [`Chapter::edit_content`] 的人工覆盖
/// - `versions` 只追加，不删除
/// - `word_count` 始终等于 `content` 的非空白字符数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_number: u32,
    pub title: String,
    pub summary: String,
    pub content: Option<String>,
    pub versions: Vec<String>,
    pub evaluation: Option<String>,
    pub generation_status: GenerationStatus,
    pub word_count: u32,
}

impl Chapter {
    /// 从大纲条目物化新章节
    pub fn new(chapter_number: u32, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            chapter_number,
            title: title.into(),
            summary: summary.into(),
            content: None,
            versions: Vec::new(),
            evaluation: None,
            generation_status: GenerationStatus::NotGenerated,
            word_count: 0,
        }
    }

    fn transition(&mut self, next: GenerationStatus) -> Result<(), ChapterError> {
        if !self.generation_status.can_transition_to(next) {
            return Err(ChapterError::InvalidTransition {
                chapter_number: self.chapter_number,
                from: self.generation_status,
                to: next,
            });
        }
        self.generation_status = next;
        Ok(())
    }

    fn not_allowed(&self, operation: &'static str) -> ChapterError {
        ChapterError::OperationNotAllowed {
            chapter_number: self.chapter_number,
            operation,
            status: self.generation_status,
        }
    }

    // ========== 生成 ==========

    pub fn begin_generation(&mut self) -> Result<(), ChapterError> {
        if !self.generation_status.can_generate() {
            return Err(self.not_allowed("generate"));
        }
        self.transition(GenerationStatus::Generating)
    }

    /// 追加候选版本，进入评估或等待确认
    pub fn complete_generation(
        &mut self,
        candidates: Vec<String>,
        evaluation_enabled: bool,
    ) -> Result<(), ChapterError> {
        if candidates.is_empty() {
            return Err(ChapterError::EmptyCandidates);
        }
        let next = if evaluation_enabled {
            GenerationStatus::Evaluating
        } else {
            GenerationStatus::WaitingForConfirm
        };
        self.transition(next)?;
        self.versions.extend(candidates);
        Ok(())
    }

    /// 生成失败：保留已有的 content 与 versions
    pub fn fail_generation(&mut self) -> Result<(), ChapterError> {
        self.transition(GenerationStatus::Failed)
    }

    // ========== 评估 ==========

    pub fn begin_evaluation(&mut self) -> Result<(), ChapterError> {
        if !self.generation_status.can_evaluate() {
            return Err(self.not_allowed("evaluate"));
        }
        if self.versions.is_empty() {
            return Err(ChapterError::NoVersions(self.chapter_number));
        }
        if self.generation_status != GenerationStatus::Evaluating {
            self.transition(GenerationStatus::Evaluating)?;
        }
        Ok(())
    }

    pub fn complete_evaluation(&mut self, rationale: String) -> Result<(), ChapterError> {
        self.transition(GenerationStatus::Selecting)?;
        self.evaluation = Some(rationale);
        Ok(())
    }

    pub fn fail_evaluation(&mut self) -> Result<(), ChapterError> {
        self.transition(GenerationStatus::EvaluationFailed)
    }

    /// 自动选择：有推荐版本则提交，否则交给用户确认
    pub fn auto_select(&mut self, recommended: Option<usize>) -> Result<(), ChapterError> {
        if self.generation_status != GenerationStatus::Selecting {
            return Err(self.not_allowed("auto select"));
        }
        match recommended {
            Some(index) if index < self.versions.len() => self.select_version(index),
            _ => self.transition(GenerationStatus::WaitingForConfirm),
        }
    }

    // ========== 选择与编辑 ==========

    /// 提交指定版本；索引先于状态校验，越界时不改变状态
    pub fn select_version(&mut self, index: usize) -> Result<(), ChapterError> {
        let len = self.versions.len();
        if index >= len {
            return Err(ChapterError::VersionOutOfRange { index, len });
        }
        if !self.generation_status.can_select() {
            return Err(self.not_allowed("select"));
        }
        self.transition(GenerationStatus::Successful)?;
        let content = self.versions[index].clone();
        self.set_content(content);
        Ok(())
    }

    /// 人工编辑：任意状态下直接置为 successful，不写入 versions
    pub fn edit_content(&mut self, content: String) {
        self.set_content(content);
        self.generation_status = GenerationStatus::Successful;
    }

    pub fn update_outline(&mut self, title: impl Into<String>, summary: impl Into<String>) {
        self.title = title.into();
        self.summary = summary.into();
    }

    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    fn set_content(&mut self, content: String) {
        self.word_count = count_words(&content);
        self.content = Some(content);
    }
}

// ============================================================================
// ConversationMessage
// ============================================================================

/// 对话消息（只追加）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GenerationStatus::*;

    fn chapter_in(status: GenerationStatus, versions: &[&str]) -> Chapter {
        let mut chapter = Chapter::new(1, "黄昏之城", "主角醒来");
        chapter.versions = versions.iter().map(|v| v.to_string()).collect();
        chapter.generation_status = status;
        chapter
    }

    #[test]
    fn test_generation_appends_versions() {
        let mut chapter = chapter_in(NotGenerated, &[]);
        chapter.begin_generation().unwrap();
        assert_eq!(chapter.generation_status, Generating);

        chapter
            .complete_generation(vec!["v1".into(), "v2".into()], true)
            .unwrap();
        assert_eq!(chapter.generation_status, Evaluating);
        assert_eq!(chapter.versions.len(), 2);
    }

    #[test]
    fn test_regeneration_never_truncates_versions() {
        let mut chapter = chapter_in(Successful, &["old"]);
        chapter.content = Some("old".into());

        chapter.begin_generation().unwrap();
        chapter.complete_generation(vec!["new".into()], false).unwrap();

        assert_eq!(chapter.versions, vec!["old".to_string(), "new".to_string()]);
        assert_eq!(chapter.generation_status, WaitingForConfirm);
        assert_eq!(chapter.content.as_deref(), Some("old"));
    }

    #[test]
    fn test_generation_failure_preserves_content() {
        let mut chapter = chapter_in(Successful, &["old"]);
        chapter.content = Some("old".into());
        chapter.begin_generation().unwrap();
        chapter.fail_generation().unwrap();

        assert_eq!(chapter.generation_status, Failed);
        assert_eq!(chapter.content.as_deref(), Some("old"));
    }

    #[test]
    fn test_generate_rejected_while_selecting() {
        let mut chapter = chapter_in(Selecting, &["a"]);
        let err = chapter.begin_generation().unwrap_err();
        assert!(matches!(err, ChapterError::OperationNotAllowed { .. }));
        assert_eq!(chapter.generation_status, Selecting);
    }

    #[test]
    fn test_select_out_of_range_leaves_status() {
        let mut chapter = chapter_in(Selecting, &["a", "b"]);
        let err = chapter.select_version(2).unwrap_err();
        assert_eq!(err, ChapterError::VersionOutOfRange { index: 2, len: 2 });
        assert_eq!(chapter.generation_status, Selecting);
        assert!(chapter.content.is_none());
    }

    #[test]
    fn test_select_commits_version() {
        let mut chapter = chapter_in(Selecting, &["第一稿", "第二 稿"]);
        chapter.select_version(1).unwrap();
        assert_eq!(chapter.content.as_deref(), Some("第二 稿"));
        assert_eq!(chapter.word_count, 3);
        assert_eq!(chapter.generation_status, Successful);
    }

    #[test]
    fn test_select_rejected_before_selecting() {
        let mut chapter = chapter_in(Evaluating, &["a"]);
        assert!(chapter.select_version(0).is_err());
        assert_eq!(chapter.generation_status, Evaluating);
    }

    #[test]
    fn test_evaluation_paths() {
        let mut chapter = chapter_in(WaitingForConfirm, &["a", "b"]);
        chapter.begin_evaluation().unwrap();
        assert_eq!(chapter.generation_status, Evaluating);
        chapter.complete_evaluation("版本二节奏更好".into()).unwrap();
        assert_eq!(chapter.generation_status, Selecting);

        chapter.auto_select(None).unwrap();
        assert_eq!(chapter.generation_status, WaitingForConfirm);

        let mut failing = chapter_in(Evaluating, &["a"]);
        failing.fail_evaluation().unwrap();
        assert_eq!(failing.generation_status, EvaluationFailed);
        failing.begin_evaluation().unwrap();
        assert_eq!(failing.generation_status, Evaluating);
    }

    #[test]
    fn test_evaluation_requires_versions() {
        let mut chapter = chapter_in(Successful, &[]);
        assert_eq!(chapter.begin_evaluation(), Err(ChapterError::NoVersions(1)));
        assert_eq!(chapter.generation_status, Successful);
    }

    #[test]
    fn test_auto_select_recommended() {
        let mut chapter = chapter_in(Selecting, &["a", "bb"]);
        chapter.auto_select(Some(1)).unwrap();
        assert_eq!(chapter.content.as_deref(), Some("bb"));
        assert_eq!(chapter.generation_status, Successful);
    }

    #[test]
    fn test_edit_content_is_idempotent() {
        let mut first = chapter_in(Failed, &["a"]);
        first.edit_content("手动修订".into());
        let snapshot = first.clone();
        first.edit_content("手动修订".into());

        assert_eq!(first, snapshot);
        assert_eq!(first.generation_status, Successful);
        assert_eq!(first.versions, vec!["a".to_string()]);
        assert_eq!(first.word_count, 4);
    }
}
