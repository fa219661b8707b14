//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（CompletionEngine、ResponseCache、SettingsStore、RunManager 等）
//! - orchestrator: 批处理编排
//! - settings: 持久化处理设置
//! - commands: 命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod settings;

// Re-exports
pub use commands::{
    CancelRunCommand,
    PreviewSegmentsCommand,
    PreviewSegmentsResponse,
    QueryRunCommand,
    RunBatchCommand,
    SegmentPreview,
    SubmitBatchCommand,
    SubmitBatchResponse,
    // Handlers
    handlers::{
        CancelRunHandler, GetSettingsHandler, PreviewSegmentsHandler, QueryRunHandler,
        RunBatchHandler, SubmitBatchHandler, UpdateSettingsHandler,
    },
};

pub use error::ApplicationError;
pub use orchestrator::{BatchOrchestrator, OrchestratorConfig};
pub use settings::{ProcessingSettings, SettingsPatch, SettingsProvider};

pub use ports::{
    CacheError,
    CacheStats,
    CompletionEnginePort,
    CompletionError,
    ResponseCachePort,
    RunError,
    RunManagerPort,
    RunSnapshot,
    SettingsError,
    SettingsStorePort,
    TokenCounterPort,
};
