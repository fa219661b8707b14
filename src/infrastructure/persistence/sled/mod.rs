//! Sled 存储实现
//!
//! 响应缓存与处理设置共用一个数据库，按 key 前缀区分命名空间：
//! - `cache:<fingerprint>` → bincode 编码的缓存条目
//! - `settings:<field>` → JSON 编码的设置字段

mod response_cache;
mod settings_store;

use std::path::Path;

use sled::Db;

use crate::application::ports::CacheError;

pub use response_cache::SledResponseCache;
pub use settings_store::SledSettingsStore;

/// 打开（或创建）数据库
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Db, CacheError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }
    }

    let db = sled::open(path).map_err(|e| CacheError::Unavailable(e.to_string()))?;
    tracing::info!(db_path = %path.display(), "Sled database opened");
    Ok(db)
}
