//! Persistence Layer - 数据持久化
//!
//! Sled 存储实现（响应缓存 + 处理设置）

pub mod sled;

pub use self::sled::{open_db, SledResponseCache, SledSettingsStore};
