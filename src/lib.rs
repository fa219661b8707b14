//! gptbat - 长文本分段批处理（chat-completion）
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 分段、提示词渲染、请求指纹、批处理结果
//!
//! 应用层 (application/):
//! - Ports: 端口定义（CompletionEngine, ResponseCache, SettingsStore, RunManager, TokenCounter）
//! - Orchestrator: 有界并发的批处理编排
//! - Commands: 命令处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API
//! - Memory: RunManager 内存实现
//! - Persistence: Sled 存储（响应缓存 + 设置）
//! - Adapters: Completion Client, Token Counter

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
