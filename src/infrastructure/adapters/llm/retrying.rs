//! Retrying Generator - 瞬时故障重试装饰器
//!
//! 包装任意 StoryGeneratorPort，对可重试错误按线性退避重试；
//! 鉴权与请求错误直接返回。

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    AnalyzeRequest, BlueprintRequest, ConverseRequest, EvaluateRequest, Evaluation,
    GeneratedBlueprint, GeneratorError, OutlineRequest, StoryGeneratorPort, VolumeNamingRequest,
    WriteChapterRequest,
};
use crate::domain::blueprint::ChapterOutline;

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次调用之外的最大重试次数
    pub max_retries: u32,
    /// 第 n 次重试前等待 backoff * n
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

pub struct RetryingGenerator {
    inner: Arc<dyn StoryGeneratorPort>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn StoryGeneratorPort>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, GeneratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GeneratorError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        operation = operation,
                        attempt = attempt,
                        max_retries = self.policy.max_retries,
                        error = %e,
                        "Generator call failed, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(e) => {
                    if attempt > 0 {
                        tracing::error!(
                            operation = operation,
                            attempts = attempt + 1,
                            error = %e,
                            "Generator call failed after retries"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl StoryGeneratorPort for RetryingGenerator {
    async fn converse(&self, request: ConverseRequest) -> Result<String, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("converse", move || inner.converse(request.clone()))
            .await
    }

    async fn generate_blueprint(
        &self,
        request: BlueprintRequest,
    ) -> Result<GeneratedBlueprint, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("generate_blueprint", move || {
            inner.generate_blueprint(request.clone())
        })
        .await
    }

    async fn write_chapter(
        &self,
        request: WriteChapterRequest,
    ) -> Result<Vec<String>, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("write_chapter", move || inner.write_chapter(request.clone()))
            .await
    }

    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("evaluate", move || inner.evaluate(request.clone()))
            .await
    }

    async fn generate_outline(
        &self,
        request: OutlineRequest,
    ) -> Result<Vec<ChapterOutline>, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("generate_outline", move || {
            inner.generate_outline(request.clone())
        })
        .await
    }

    async fn analyze_chapter(&self, request: AnalyzeRequest) -> Result<Value, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("analyze_chapter", move || inner.analyze_chapter(request.clone()))
            .await
    }

    async fn name_volume(&self, request: VolumeNamingRequest) -> Result<String, GeneratorError> {
        let inner = &self.inner;
        let request = &request;
        self.with_retry("name_volume", move || inner.name_volume(request.clone()))
            .await
    }
}
