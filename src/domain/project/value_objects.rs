//! Project Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 项目唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 章节生成状态
///
/// 合法迁移见 [`GenerationStatus::can_transition_to`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    NotGenerated,
    Generating,
    Evaluating,
    Selecting,
    WaitingForConfirm,
    Successful,
    Failed,
    EvaluationFailed,
}

impl GenerationStatus {
    pub const ALL: [GenerationStatus; 8] = [
        GenerationStatus::NotGenerated,
        GenerationStatus::Generating,
        GenerationStatus::Evaluating,
        GenerationStatus::Selecting,
        GenerationStatus::WaitingForConfirm,
        GenerationStatus::Successful,
        GenerationStatus::Failed,
        GenerationStatus::EvaluationFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::NotGenerated => "not_generated",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Evaluating => "evaluating",
            GenerationStatus::Selecting => "selecting",
            GenerationStatus::WaitingForConfirm => "waiting_for_confirm",
            GenerationStatus::Successful => "successful",
            GenerationStatus::Failed => "failed",
            GenerationStatus::EvaluationFailed => "evaluation_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.as_str() == s)
    }

    /// 状态机边（不含 editContent 的人工覆盖）
    pub fn can_transition_to(self, next: GenerationStatus) -> bool {
        use GenerationStatus::*;
        matches!(
            (self, next),
            (NotGenerated | Failed | Successful, Generating)
                | (Generating, Evaluating | WaitingForConfirm | Failed)
                | (Evaluating, Selecting | EvaluationFailed)
                | (WaitingForConfirm | Successful | EvaluationFailed, Evaluating)
                | (Selecting, Successful | WaitingForConfirm)
                | (WaitingForConfirm, Successful)
        )
    }

    /// 可以发起生成的状态
    pub fn can_generate(self) -> bool {
        self.can_transition_to(GenerationStatus::Generating)
    }

    /// 可以发起评估的状态
    pub fn can_evaluate(self) -> bool {
        self == GenerationStatus::Evaluating || self.can_transition_to(GenerationStatus::Evaluating)
    }

    /// 可以选择版本的状态
    pub fn can_select(self) -> bool {
        matches!(
            self,
            GenerationStatus::Selecting | GenerationStatus::WaitingForConfirm
        )
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对话消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// 统计字数：非空白字符数
pub fn count_words(content: &str) -> u32 {
    content.chars().filter(|c| !c.is_whitespace()).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use GenerationStatus::*;

    #[test]
    fn test_status_string_roundtrip_covers_all_states() {
        for status in GenerationStatus::ALL {
            assert_eq!(GenerationStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(GenerationStatus::from_str("done"), None);
    }

    #[test]
    fn test_legal_edges() {
        assert!(NotGenerated.can_transition_to(Generating));
        assert!(Failed.can_transition_to(Generating));
        assert!(Successful.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Evaluating));
        assert!(Generating.can_transition_to(WaitingForConfirm));
        assert!(Evaluating.can_transition_to(EvaluationFailed));
        assert!(Selecting.can_transition_to(WaitingForConfirm));
        assert!(WaitingForConfirm.can_transition_to(Successful));
    }

    #[test]
    fn test_illegal_edges() {
        assert!(!NotGenerated.can_transition_to(Selecting));
        assert!(!Generating.can_transition_to(Generating));
        assert!(!Selecting.can_transition_to(Generating));
        assert!(!EvaluationFailed.can_transition_to(Generating));
        assert!(!Failed.can_transition_to(Evaluating));
        assert!(!NotGenerated.can_transition_to(Successful));
    }

    #[test]
    fn test_count_words_ignores_whitespace() {
        assert_eq!(count_words("夜幕 降临\n城市"), 6);
        assert_eq!(count_words("  "), 0);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&WaitingForConfirm).unwrap();
        assert_eq!(json, "\"waiting_for_confirm\"");
    }
}
