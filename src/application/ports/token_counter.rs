//! Token Counter Port - token 数估算
//!
//! 仅用于展示，失败时返回 0，不阻塞处理

use async_trait::async_trait;

#[async_trait]
pub trait TokenCounterPort: Send + Sync {
    async fn count(&self, text: &str) -> u64;
}
