//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, LlmProvider};
use crate::application::commands::handlers::MAX_OUTLINE_BATCH;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYLOOM_SERVER__PORT=8080`
/// - `STORYLOOM_LLM__PROVIDER=fake`
/// - `STORYLOOM_LLM__API_KEY=sk-...`
/// - `STORYLOOM_AUTH__TOKENS=alice:t1,bob:t2`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索工作目录下的默认配置文件
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("database.path", "data/storyloom.db")?
        .set_default("database.max_connections", 5)?
        .set_default("llm.provider", "http")?
        .set_default("llm.base_url", "https://api.openai.com/v1")?
        .set_default("llm.model", "gpt-4o-mini")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("llm.max_retries", 2)?
        .set_default("llm.retry_backoff_ms", 500)?
        .set_default("llm.temperature", 0.7)?
        .set_default("pipeline.version_count", 2)?
        .set_default("pipeline.evaluation_enabled", true)?
        .set_default("pipeline.auto_select", false)?
        .set_default("conversation.max_turns", 12)?
        .set_default("analysis.max_concurrent", 2)?
        .set_default("analysis.max_retries", 2)?
        .set_default("analysis.queue_capacity", 256)?
        .set_default("analysis.retained_tasks", 1000)?
        .set_default("analysis.auto_split_after_analysis", true)?
        .set_default("auto_generator.max_errors", 5)?
        .set_default("auto_generator.pause_poll_ms", 1000)?
        .set_default("auto_generator.outline_batch", 10)?
        .set_default("auth.enabled", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量：前缀 STORYLOOM_，层级分隔符 __，auth.tokens 按逗号拆分
    builder = builder.add_source(
        Environment::with_prefix("STORYLOOM")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("auth.tokens")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return fail("Server port cannot be 0");
    }
    if config.database.path.trim().is_empty() {
        return fail("Database path cannot be empty");
    }
    if config.pipeline.version_count == 0 {
        return fail("pipeline.version_count must be at least 1");
    }
    if config.analysis.max_concurrent == 0 {
        return fail("analysis.max_concurrent must be at least 1");
    }
    if config.analysis.queue_capacity == 0 {
        return fail("analysis.queue_capacity must be at least 1");
    }
    if config.analysis.retained_tasks == 0 {
        return fail("analysis.retained_tasks must be at least 1");
    }
    if config.auto_generator.max_errors == 0 {
        return fail("auto_generator.max_errors must be at least 1");
    }
    if !(1..=MAX_OUTLINE_BATCH).contains(&config.auto_generator.outline_batch) {
        return fail("auto_generator.outline_batch must be between 1 and 50");
    }
    if config.llm.provider == LlmProvider::Http && config.llm.base_url.trim().is_empty() {
        return fail("llm.base_url is required for the http provider");
    }
    if config.auth.enabled && config.auth.tokens.iter().all(|t| t.trim().is_empty()) {
        return fail("auth.tokens cannot be empty when auth is enabled");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），不输出密钥
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("LLM Provider: {:?}", config.llm.provider);
    if config.llm.provider == LlmProvider::Http {
        tracing::info!("LLM Endpoint: {} ({})", config.llm.base_url, config.llm.model);
        tracing::info!("LLM API Key: {}", if config.llm.api_key.is_some() { "set" } else { "unset" });
    }
    tracing::info!(
        "LLM Retries: {} (backoff {}ms)",
        config.llm.max_retries,
        config.llm.retry_backoff_ms
    );
    tracing::info!(
        "Pipeline: {} versions, evaluation={}, auto_select={}",
        config.pipeline.version_count,
        config.pipeline.evaluation_enabled,
        config.pipeline.auto_select
    );
    tracing::info!(
        "Analysis: max_concurrent={}, max_retries={}, queue_capacity={}, retained_tasks={}",
        config.analysis.max_concurrent,
        config.analysis.max_retries,
        config.analysis.queue_capacity,
        config.analysis.retained_tasks
    );
    tracing::info!(
        "Auto Generator: max_errors={}, outline_batch={}",
        config.auto_generator.max_errors,
        config.auto_generator.outline_batch
    );
    tracing::info!("Auth Enabled: {} ({} tokens)", config.auth.enabled, config.auth.tokens.len());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let file = write_config(
            r#"
[server]
port = 9090

[llm]
provider = "fake"

[pipeline]
version_count = 3
auto_select = true

[auth]
enabled = true
tokens = ["alice:t1"]
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.provider, LlmProvider::Fake);
        assert_eq!(config.pipeline.version_count, 3);
        assert!(config.pipeline.auto_select);
        assert!(config.pipeline.evaluation_enabled);
        assert_eq!(config.auth.tokens, vec!["alice:t1".to_string()]);
        assert_eq!(config.analysis.queue_capacity, 256);
        assert_eq!(config.analysis.retained_tasks, 1000);
        assert_eq!(config.auto_generator.outline_batch, 10);
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let file = write_config("[pipeline]\nversion_count = 0\n");
        assert!(matches!(
            load_config_from_path(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_from_path(Some(&missing)).is_err());
    }

    #[test]
    fn test_validation_passes_for_defaults() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.analysis.max_concurrent = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.analysis.retained_tasks = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.auto_generator.outline_batch = 51;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.llm.base_url = " ".into();
        assert!(validate_config(&config).is_err());
        config.llm.provider = LlmProvider::Fake;
        assert!(validate_config(&config).is_ok());

        let mut config = AppConfig::default();
        config.auth.enabled = true;
        assert!(validate_config(&config).is_err());
        config.auth.tokens = vec!["t1".into()];
        assert!(validate_config(&config).is_ok());
    }
}
