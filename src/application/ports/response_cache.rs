//! Response Cache Port - 补全结果缓存
//!
//! 定义响应缓存的抽象接口，具体实现使用 Sled

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Fingerprint;

/// Response Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Response Cache Port
///
/// 以请求指纹为 key 的持久化缓存
/// - 无淘汰、无过期
/// - 相同 key 重复写入为幂等覆盖
#[async_trait]
pub trait ResponseCachePort: Send + Sync {
    /// 根据指纹获取补全文本，不存在时返回 `Ok(None)`
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<String>, CacheError>;

    /// 存储补全文本
    async fn put(&self, fingerprint: &Fingerprint, text: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}
