//! gptbat - 长文本分段批处理服务
//!
//! - Domain: 分段 / 提示词 / 指纹 / 批处理结果
//! - Application: orchestrator, commands, settings, ports
//! - Infrastructure: http, memory, persistence, adapters

use std::sync::Arc;

use gptbat::application::{
    BatchOrchestrator, OrchestratorConfig, SettingsProvider, TokenCounterPort,
};
use gptbat::config::{load_config, print_config};
use gptbat::infrastructure::adapters::{
    ApproxTokenCounter, HttpCompletionClient, HttpCompletionClientConfig, HttpTokenCounter,
    HttpTokenCounterConfig,
};
use gptbat::infrastructure::http::{AppState, HttpServer, ServerConfig};
use gptbat::infrastructure::memory::InMemoryRunManager;
use gptbat::infrastructure::persistence::sled::{open_db, SledResponseCache, SledSettingsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},gptbat={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("gptbat - 长文本分段批处理");
    print_config(&config);

    // 响应缓存与设置共用一个 sled 数据库
    let db = open_db(&config.storage.db_path)?;
    let response_cache = Arc::new(SledResponseCache::new(db.clone()));
    let settings = Arc::new(SettingsProvider::new(
        Arc::new(SledSettingsStore::new(db)),
        config.processing_defaults(),
    ));

    // 创建 HTTP 补全客户端
    let completion_engine = Arc::new(HttpCompletionClient::new(
        HttpCompletionClientConfig::default().with_timeout(config.llm.timeout_secs),
    )?);

    // token 计数：配置了服务地址时调用远程服务，否则本地估算
    let token_counter: Arc<dyn TokenCounterPort> = match &config.token_counter.url {
        Some(url) if !url.trim().is_empty() => Arc::new(HttpTokenCounter::new(HttpTokenCounterConfig {
            url: url.clone(),
            key: config.token_counter.key.clone(),
            timeout_secs: config.token_counter.timeout_secs,
        })?),
        _ => Arc::new(ApproxTokenCounter),
    };

    let run_manager = Arc::new(InMemoryRunManager::with_retention(
        config.batch.max_retained_runs,
    ));

    let orchestrator = Arc::new(BatchOrchestrator::new(
        OrchestratorConfig {
            max_concurrent: config.batch.max_concurrent,
        },
        completion_engine.clone(),
        response_cache.clone(),
        run_manager.clone(),
    ));

    // 创建 HTTP 服务器
    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_files(
            config.server.static_files.path.clone(),
            config.server.static_files.dir.clone(),
        );
    }
    let state = AppState::new(
        orchestrator,
        completion_engine,
        response_cache,
        run_manager,
        settings,
        token_counter,
        config.token_counter.max_concurrent,
    );

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
