//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod completion_engine;
mod response_cache;
mod run_manager;
mod settings_store;
mod token_counter;

pub use completion_engine::{CompletionEnginePort, CompletionError};
pub use response_cache::{CacheError, CacheStats, ResponseCachePort};
pub use run_manager::{RunError, RunManagerPort, RunSnapshot};
pub use settings_store::{SettingsError, SettingsStorePort};
pub use token_counter::TokenCounterPort;
