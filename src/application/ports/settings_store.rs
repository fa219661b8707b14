//! Settings Store Port - 处理设置持久化
//!
//! 字符串 key → JSON 字符串 value，与响应缓存使用不同的 key 命名空间

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Settings Store Port
pub trait SettingsStorePort: Send + Sync {
    /// 读取单个设置（JSON 编码）
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// 写入单个设置（JSON 编码）
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// 删除单个设置
    fn remove(&self, key: &str) -> Result<(), SettingsError>;
}
