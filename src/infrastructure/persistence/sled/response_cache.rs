//! Sled-based Response Cache Implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use super::open_db;
use crate::application::ports::{CacheError, CacheStats, ResponseCachePort};
use crate::domain::Fingerprint;

const CACHE_PREFIX: &str = "cache:";

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    content: String,
    created_at: i64,
}

/// Sled 响应缓存
///
/// 没有容量上限，也不会过期
pub struct SledResponseCache {
    db: Db,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledResponseCache {
    /// 基于已打开的数据库创建缓存
    pub fn new(db: Db) -> Self {
        let total_entries = db.scan_prefix(CACHE_PREFIX).count();
        tracing::info!(total_entries, "SledResponseCache initialized");

        Self {
            db,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// 打开独立的缓存数据库
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Ok(Self::new(open_db(path)?))
    }

    fn key(fingerprint: &Fingerprint) -> String {
        format!("{}{}", CACHE_PREFIX, fingerprint)
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCachePort for SledResponseCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<String>, CacheError> {
        match self.db.get(Self::key(fingerprint)) {
            Ok(Some(data)) => {
                let entry: InternalCacheEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.content))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn put(&self, fingerprint: &Fingerprint, text: &str) -> Result<(), CacheError> {
        let entry = InternalCacheEntry {
            content: text.to_string(),
            created_at: Utc::now().timestamp(),
        };
        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(Self::key(fingerprint), entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            fingerprint = %fingerprint,
            size_bytes = text.len(),
            "Completion cached"
        );

        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.db.scan_prefix(CACHE_PREFIX).count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
