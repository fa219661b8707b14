//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::mask_secret;

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
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `GPTBAT_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `GPTBAT_SERVER__PORT=8080`
/// - `GPTBAT_LLM__API_KEY=sk-...`
/// - `GPTBAT_LLM__API_BASE_URL=https://api.openai.com`
/// - `GPTBAT_BATCH__MAX_CONCURRENT=4`
/// - `GPTBAT_STORAGE__DB_PATH=/data/gptbat.sled`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("llm.api_base_url", "https://api.openai.com")?
        .set_default("llm.api_key", "")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("batch.max_concurrent", 2)?
        .set_default("batch.max_retained_runs", 100)?
        .set_default("storage.db_path", "data/gptbat.sled")?
        .set_default("token_counter.timeout_secs", 10)?
        .set_default("token_counter.max_concurrent", 4)?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: GPTBAT_LLM__API_KEY=sk-...
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("GPTBAT")
            .prefix_separator("_")
            .separator("__")
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
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.llm.api_base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM API base URL cannot be empty".to_string(),
        ));
    }

    if config.llm.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "LLM timeout cannot be 0".to_string(),
        ));
    }

    if config.batch.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.batch.max_retained_runs == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_retained_runs must be at least 1".to_string(),
        ));
    }

    if config.token_counter.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "token_counter.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.storage.db_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    // 处理默认值可以被保存的设置覆盖，但本身也必须可用
    config
        .processing_defaults()
        .to_processing_config()
        .map_err(|e| ConfigError::ValidationError(format!("Invalid processing defaults: {}", e)))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {:?} at {}",
            config.server.static_files.dir,
            config.server.static_files.path
        );
    }
    tracing::info!("LLM API: {}", config.llm.api_base_url);
    tracing::info!("LLM API Key: {}", mask_secret(&config.llm.api_key));
    tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    tracing::info!("Model: {}", config.processing.model);
    tracing::info!("Split Type: {}", config.processing.split_type.as_str());
    tracing::info!("Max Concurrent: {}", config.batch.max_concurrent);
    tracing::info!("Retained Runs: {}", config.batch.max_retained_runs);
    tracing::info!("Database: {:?}", config.storage.db_path);
    match &config.token_counter.url {
        Some(url) => tracing::info!("Token Counter: {}", url),
        None => tracing::info!("Token Counter: local estimate"),
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
