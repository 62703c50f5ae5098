//! Storyloom - AI 协作长篇小说创作服务
//!
//! 启动顺序：配置 → 日志 → 数据库与中断恢复 → 生成器 → 分析 Worker → HTTP（含自动生成监督器）

use std::sync::Arc;

use anyhow::Context;
use storyloom::application::{ProjectRepositoryPort, StoryGeneratorPort, TriggerAutoSplitHandler};
use storyloom::config::{load_config, print_config, LlmProvider, LogConfig};
use storyloom::infrastructure::adapters::{
    FakeStoryGenerator, HttpLlmClient, RetryingGenerator, StaticTokenAuthenticator,
};
use storyloom::infrastructure::events::EventPublisher;
use storyloom::infrastructure::http::{AppState, HttpServer, ServerConfig};
use storyloom::infrastructure::memory::{InMemoryAnalysisTaskManager, InMemoryMutationGuard};
use storyloom::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteProjectRepository,
};
use storyloom::infrastructure::worker::AnalysisWorker;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// 初始化日志；RUST_LOG 优先于配置文件
fn init_tracing(log: &LogConfig) {
    let default_filter = format!(
        "{},storyloom={},tower_http=debug,sqlx=warn",
        log.level, log.level
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load config")?;
    init_tracing(&config.log);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Storyloom starting");
    print_config(&config);

    // 数据库
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pool = create_pool(&DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    })
    .await
    .context("Failed to open database")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;

    let project_repo = Arc::new(SqliteProjectRepository::new(pool));
    let recovered = project_repo.recover_interrupted_chapters().await?;
    if recovered > 0 {
        tracing::warn!(chapters = recovered, "Recovered chapters interrupted during generation");
    }

    // 生成器：Worker 自己做任务级重试，处理器走重试装饰器
    let generator: Arc<dyn StoryGeneratorPort> = match config.llm.provider {
        LlmProvider::Http => Arc::new(HttpLlmClient::new(config.llm.client_config())?),
        LlmProvider::Fake => {
            tracing::warn!("Using fake story generator");
            Arc::new(FakeStoryGenerator::new())
        }
    };
    let retrying_generator = Arc::new(RetryingGenerator::new(
        generator.clone(),
        config.llm.retry_policy(),
    ));

    let event_publisher = EventPublisher::new().arc();
    let mutation_guard = InMemoryMutationGuard::new().arc();

    // 分析任务队列与 Worker
    let (task_tx, task_rx) = mpsc::channel(config.analysis.queue_capacity);
    let task_manager = InMemoryAnalysisTaskManager::new(task_tx)
        .with_retention(config.analysis.retained_tasks)
        .arc();
    let mut worker = AnalysisWorker::new(
        config.worker_config(),
        task_rx,
        task_manager.clone(),
        project_repo.clone(),
        generator,
        event_publisher.clone(),
    );
    if config.analysis.auto_split_after_analysis {
        worker = worker.with_auto_split(Arc::new(TriggerAutoSplitHandler::new(
            project_repo.clone(),
            retrying_generator.clone(),
            mutation_guard.clone(),
            event_publisher.clone(),
        )));
    }
    tokio::spawn(worker.run());

    // HTTP
    let authenticator = Arc::new(StaticTokenAuthenticator::new(
        config.auth.enabled,
        &config.auth.tokens,
    ));
    let state = AppState::new(
        project_repo,
        retrying_generator,
        mutation_guard,
        task_manager,
        authenticator,
        event_publisher,
        config.handler_settings(),
    );
    let server = HttpServer::new(
        ServerConfig::new(&config.server.host, config.server.port),
        state,
    );

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
