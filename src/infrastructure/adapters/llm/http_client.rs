//! HTTP LLM Client - 调用 OpenAI 兼容的 chat completions 服务
//!
//! 实现 StoryGeneratorPort trait
//!
//! 外部 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [...], "temperature": 0.7}
//! Response: {"choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use futures_util::future::try_join_all;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::prompts::{self, ChatMessage};
use crate::application::ports::{
    AnalyzeRequest, BlueprintRequest, ConverseRequest, EvaluateRequest, Evaluation,
    GeneratedBlueprint, GeneratorError, OutlineRequest, StoryGeneratorPort, VolumeNamingRequest,
    WriteChapterRequest,
};
use crate::domain::blueprint::ChapterOutline;

/// chat completions 请求体
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// 服务基础 URL（含 /v1 之类的前缀）
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
            temperature: 0.7,
        }
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    /// 创建新的 HTTP LLM 客户端
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| GeneratorError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取 chat completions URL
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// 发送一次对话请求，返回第一条候选的文本
    async fn chat(&self, messages: &[ChatMessage], json_mode: bool) -> Result<String, GeneratorError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            messages = messages.len(),
            json_mode = json_mode,
            "Sending chat completion request"
        );

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else if e.is_connect() {
                GeneratorError::NetworkError(format!("Cannot connect to LLM service: {}", e))
            } else {
                GeneratorError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GeneratorError::Unauthorized(format!("HTTP {}: {}", status, error_text))
                }
                _ => GeneratorError::ServiceError {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(format!("Failed to decode response: {}", e)))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GeneratorError::InvalidResponse("empty completion".to_string()))?;

        tracing::debug!(chars = content.chars().count(), "Chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl StoryGeneratorPort for HttpLlmClient {
    async fn converse(&self, request: ConverseRequest) -> Result<String, GeneratorError> {
        self.chat(&prompts::converse_messages(&request), false).await
    }

    async fn generate_blueprint(
        &self,
        request: BlueprintRequest,
    ) -> Result<GeneratedBlueprint, GeneratorError> {
        let raw = self.chat(&prompts::blueprint_messages(&request), true).await?;
        let (blueprint, ai_message) = prompts::parse_blueprint(&raw)?;

        tracing::info!(
            title = %blueprint.title,
            chapters = blueprint.chapter_outline.len(),
            "Blueprint generated"
        );

        Ok(GeneratedBlueprint {
            blueprint,
            ai_message: ai_message.unwrap_or_else(|| "故事蓝图已生成，请确认或修改。".to_string()),
        })
    }

    async fn write_chapter(
        &self,
        request: WriteChapterRequest,
    ) -> Result<Vec<String>, GeneratorError> {
        let conversations: Vec<Vec<ChatMessage>> = (0..request.version_count.max(1))
            .map(|variant| prompts::chapter_messages(&request, variant))
            .collect();

        // 各候选版本并发生成
        let versions = try_join_all(conversations.iter().map(|messages| self.chat(messages, false))).await?;

        tracing::info!(
            chapter_number = request.chapter_number,
            versions = versions.len(),
            "Chapter versions written"
        );
        Ok(versions)
    }

    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, GeneratorError> {
        let raw = self.chat(&prompts::evaluate_messages(&request), true).await?;
        Ok(prompts::parse_evaluation(&raw, request.versions.len()))
    }

    async fn generate_outline(
        &self,
        request: OutlineRequest,
    ) -> Result<Vec<ChapterOutline>, GeneratorError> {
        let raw = self.chat(&prompts::outline_messages(&request), true).await?;
        prompts::parse_outline(&raw)
    }

    async fn analyze_chapter(&self, request: AnalyzeRequest) -> Result<Value, GeneratorError> {
        let raw = self.chat(&prompts::analyze_messages(&request), true).await?;
        prompts::parse_analysis(&raw)
    }

    async fn name_volume(&self, request: VolumeNamingRequest) -> Result<String, GeneratorError> {
        self.chat(&prompts::volume_name_messages(&request), false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpLlmClientConfig::default();
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let client = HttpLlmClient::new(HttpLlmClientConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::user("你好")];
        let body = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retryable() {
        let client = HttpLlmClient::new(HttpLlmClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let err = client
            .name_volume(VolumeNamingRequest {
                volume_number: 1,
                start_chapter: 1,
                end_chapter: 3,
                chapter_notes: vec![],
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
