//! Story Generator Port - 文本生成能力抽象
//!
//! 对话、蓝图、章节写作、评估、大纲续写、章节分析、卷名生成都经由此端口，
//! 具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::blueprint::{Blueprint, ChapterOutline};
use crate::domain::project::ConversationMessage;

/// 生成能力错误
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl GeneratorError {
    /// 是否值得重试：网络、超时、限流、服务端错误与格式不合法的输出
    pub fn is_retryable(&self) -> bool {
        match self {
            GeneratorError::NetworkError(_)
            | GeneratorError::Timeout
            | GeneratorError::InvalidResponse(_) => true,
            GeneratorError::ServiceError { status, .. } => *status == 429 || *status >= 500,
            GeneratorError::Unauthorized(_) => false,
        }
    }
}

/// 概念对话的一轮请求
#[derive(Debug, Clone)]
pub struct ConverseRequest {
    pub project_title: String,
    pub initial_prompt: String,
    /// 含本轮用户消息在内的完整历史
    pub history: Vec<ConversationMessage>,
    /// 本轮刚确认的设定（槽位名, 值）；值为 None 表示跳过
    pub answered: Option<(String, Option<String>)>,
    pub next_question: Option<String>,
    pub is_complete: bool,
    pub ready_for_blueprint: bool,
}

/// 蓝图生成请求
#[derive(Debug, Clone)]
pub struct BlueprintRequest {
    pub project_title: String,
    pub initial_prompt: String,
    pub history: Vec<ConversationMessage>,
}

/// 生成的蓝图草稿
#[derive(Debug, Clone)]
pub struct GeneratedBlueprint {
    pub blueprint: Blueprint,
    pub ai_message: String,
}

/// 前文章节的概要
#[derive(Debug, Clone)]
pub struct PriorChapter {
    pub chapter_number: u32,
    pub title: String,
    pub summary: String,
}

/// 章节写作请求
#[derive(Debug, Clone)]
pub struct WriteChapterRequest {
    pub blueprint: Blueprint,
    pub chapter_number: u32,
    pub title: String,
    pub summary: String,
    pub prior_chapters: Vec<PriorChapter>,
    /// 上一章正文结尾，用于衔接
    pub previous_excerpt: Option<String>,
    pub version_count: u32,
}

/// 候选版本评估请求
#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    pub blueprint: Blueprint,
    pub chapter_number: u32,
    pub title: String,
    pub summary: String,
    pub versions: Vec<String>,
}

/// 评估结果
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub rationale: String,
    /// 推荐的版本索引（从 0 开始）
    pub recommended: Option<usize>,
}

/// 大纲续写请求
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    pub blueprint: Blueprint,
    pub start_chapter: u32,
    pub num_chapters: u32,
}

/// 章节分析请求
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
}

/// 卷名生成请求
#[derive(Debug, Clone)]
pub struct VolumeNamingRequest {
    pub volume_number: u32,
    pub start_chapter: u32,
    pub end_chapter: u32,
    /// 卷内章节的标题与摘要
    pub chapter_notes: Vec<String>,
}

/// Story Generator Port
///
/// 外部文本生成服务的抽象接口
#[async_trait]
pub trait StoryGeneratorPort: Send + Sync {
    /// 生成助手的对话回复
    async fn converse(&self, request: ConverseRequest) -> Result<String, GeneratorError>;

    /// 根据对话历史生成蓝图
    async fn generate_blueprint(
        &self,
        request: BlueprintRequest,
    ) -> Result<GeneratedBlueprint, GeneratorError>;

    /// 写作章节，返回 `version_count` 个候选版本
    async fn write_chapter(
        &self,
        request: WriteChapterRequest,
    ) -> Result<Vec<String>, GeneratorError>;

    /// 比较候选版本
    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, GeneratorError>;

    /// 续写大纲条目
    async fn generate_outline(
        &self,
        request: OutlineRequest,
    ) -> Result<Vec<ChapterOutline>, GeneratorError>;

    /// 分析章节，返回结构化结果（key_events、foreshadowings 等）
    async fn analyze_chapter(&self, request: AnalyzeRequest) -> Result<Value, GeneratorError>;

    /// 为新卷取名
    async fn name_volume(&self, request: VolumeNamingRequest) -> Result<String, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GeneratorError::Timeout.is_retryable());
        assert!(GeneratorError::NetworkError("reset".into()).is_retryable());
        assert!(GeneratorError::ServiceError {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(GeneratorError::ServiceError {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(!GeneratorError::ServiceError {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!GeneratorError::Unauthorized("key".into()).is_retryable());
    }
}
