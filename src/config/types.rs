//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::PipelineSettings;
use crate::infrastructure::adapters::{HttpLlmClientConfig, RetryPolicy};
use crate::infrastructure::http::HandlerSettings;
use crate::infrastructure::memory::DEFAULT_RETAINED_TASKS;
use crate::infrastructure::worker::{AnalysisWorkerConfig, AutoGeneratorConfig};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// 文本生成服务
    #[serde(default)]
    pub llm: LlmConfig,

    /// 章节流水线
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 概念对话
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// 异步分析任务
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// 自动连续生成
    #[serde(default)]
    pub auto_generator: AutoGeneratorSection,

    /// 调用方认证
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 组装 HTTP 处理器参数
    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            pipeline: PipelineSettings {
                version_count: self.pipeline.version_count,
                evaluation_enabled: self.pipeline.evaluation_enabled,
                auto_select: self.pipeline.auto_select,
            },
            max_turns: self.conversation.max_turns,
            analysis_max_retries: self.analysis.max_retries,
            auto_generator: AutoGeneratorConfig {
                max_errors: self.auto_generator.max_errors,
                pause_poll: Duration::from_millis(self.auto_generator.pause_poll_ms),
                outline_batch: self.auto_generator.outline_batch,
            },
        }
    }

    /// 组装分析 Worker 参数，退避与生成器重试共用
    pub fn worker_config(&self) -> AnalysisWorkerConfig {
        AnalysisWorkerConfig {
            max_concurrent: self.analysis.max_concurrent,
            retry_backoff: self.llm.retry_backoff(),
        }
    }
}

// ============================================================================
// Server / Database
// ============================================================================

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/storyloom.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

// ============================================================================
// LLM
// ============================================================================

/// 生成服务实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI 兼容的 chat completions 服务
    Http,
    /// 进程内确定性实现，离线演示与测试用
    Fake,
}

/// 文本生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 单次请求超时（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 瞬时故障的最大重试次数
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,

    /// 第 n 次重试前等待 retry_backoff_ms * n
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> LlmProvider {
    LlmProvider::Http
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_llm_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn client_config(&self) -> HttpLlmClientConfig {
        HttpLlmClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.retry_backoff(),
        }
    }
}

// ============================================================================
// Pipeline / Conversation / Analysis
// ============================================================================

/// 章节流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 每次生成的候选版本数
    #[serde(default = "default_version_count")]
    pub version_count: u32,

    #[serde(default = "default_true")]
    pub evaluation_enabled: bool,

    /// 评估后自动采用推荐版本
    #[serde(default)]
    pub auto_select: bool,
}

fn default_version_count() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version_count: default_version_count(),
            evaluation_enabled: true,
            auto_select: false,
        }
    }
}

/// 概念对话配置
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// 超过该轮数即视为对话完成
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_max_turns() -> u32 {
    12
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

/// 异步分析配置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// 同时运行的分析任务数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 单个任务的自动重试次数
    #[serde(default = "default_analysis_max_retries")]
    pub max_retries: u32,

    /// 待执行队列容量，满时拒绝提交
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 内存中保留的已结束任务数，超出时淘汰最早结束的
    #[serde(default = "default_retained_tasks")]
    pub retained_tasks: usize,

    /// 分析完成后按分卷配置尝试自动分卷
    #[serde(default = "default_true")]
    pub auto_split_after_analysis: bool,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_analysis_max_retries() -> u32 {
    2
}

fn default_queue_capacity() -> usize {
    256
}

fn default_retained_tasks() -> usize {
    DEFAULT_RETAINED_TASKS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retries: default_analysis_max_retries(),
            queue_capacity: default_queue_capacity(),
            retained_tasks: default_retained_tasks(),
            auto_split_after_analysis: true,
        }
    }
}

/// 自动生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct AutoGeneratorSection {
    /// 累计错误达到该值后任务停止
    #[serde(default = "default_auto_gen_max_errors")]
    pub max_errors: u32,

    /// 暂停期间检查状态的间隔（毫秒）
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    /// 缺大纲时一次续写的章数
    #[serde(default = "default_outline_batch")]
    pub outline_batch: u32,
}

fn default_auto_gen_max_errors() -> u32 {
    5
}

fn default_pause_poll_ms() -> u64 {
    1000
}

fn default_outline_batch() -> u32 {
    10
}

impl Default for AutoGeneratorSection {
    fn default() -> Self {
        Self {
            max_errors: default_auto_gen_max_errors(),
            pause_poll_ms: default_pause_poll_ms(),
            outline_batch: default_outline_batch(),
        }
    }
}

// ============================================================================
// Auth / Log
// ============================================================================

/// 认证配置
///
/// `tokens` 每项为 `name:secret` 或单独的 secret
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub tokens: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别，RUST_LOG 优先
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
