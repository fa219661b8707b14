//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ProcessingSettings;
use crate::domain::{SplitType, DEFAULT_LINES_PER_SEGMENT};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 补全服务配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 处理设置默认值
    #[serde(default)]
    pub processing: ProcessingDefaults,

    /// 批处理配置
    #[serde(default)]
    pub batch: BatchConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// token 计数服务配置
    #[serde(default)]
    pub token_counter: TokenCounterConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 未保存任何设置时使用的处理设置
    pub fn processing_defaults(&self) -> ProcessingSettings {
        ProcessingSettings {
            api_key: self.llm.api_key.clone(),
            api_base_url: self.llm.api_base_url.clone(),
            split_type: self.processing.split_type,
            split_length: self.processing.split_length,
            split_char: self.processing.split_char.clone(),
            lines_per_segment: self.processing.lines_per_segment,
            system_prompt: self.processing.system_prompt.clone(),
            user_prompt: self.processing.user_prompt.clone(),
            model: self.processing.model.clone(),
            max_tokens: self.processing.max_tokens,
            temperature: self.processing.temperature,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 补全服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API 基础 URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key，可被保存的设置覆盖
    #[serde(default)]
    pub api_key: String,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// 处理设置默认值
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingDefaults {
    #[serde(default)]
    pub split_type: SplitType,

    /// 按长度分隔时每段最大字符数
    #[serde(default = "default_split_length")]
    pub split_length: usize,

    /// 分隔符（正则表达式）
    #[serde(default = "default_split_char")]
    pub split_char: String,

    #[serde(default = "default_lines_per_segment")]
    pub lines_per_segment: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_split_length() -> usize {
    1000
}

fn default_split_char() -> String {
    "\\n---\\n".to_string()
}

fn default_lines_per_segment() -> usize {
    DEFAULT_LINES_PER_SEGMENT
}

fn default_system_prompt() -> String {
    "Please help me to translate the following text to Chinese. Please return only translated content not include the origin text.".to_string()
}

fn default_user_prompt() -> String {
    "Here is the text: {$content}".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for ProcessingDefaults {
    fn default() -> Self {
        Self {
            split_type: SplitType::default(),
            split_length: default_split_length(),
            split_char: default_split_char(),
            lines_per_segment: default_lines_per_segment(),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// 批处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// 同时进行的远程调用数，1 表示逐段顺序处理
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 内存中保留的已结束运行数，超出后移除最早结束的
    #[serde(default = "default_max_retained_runs")]
    pub max_retained_runs: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_max_retained_runs() -> usize {
    100
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retained_runs: default_max_retained_runs(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Sled 数据库路径（响应缓存 + 设置）
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/gptbat.sled")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// token 计数服务配置
///
/// 未配置 url 时使用本地估算
#[derive(Debug, Clone, Deserialize)]
pub struct TokenCounterConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: String,

    #[serde(default = "default_token_counter_timeout")]
    pub timeout_secs: u64,

    /// 预览时同时发出的计数请求数
    #[serde(default = "default_token_counter_concurrency")]
    pub max_concurrent: usize,
}

fn default_token_counter_timeout() -> u64 {
    10
}

fn default_token_counter_concurrency() -> usize {
    4
}

impl Default for TokenCounterConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: String::new(),
            timeout_secs: default_token_counter_timeout(),
            max_concurrent: default_token_counter_concurrency(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
