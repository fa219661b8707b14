//! 本地 token 估算：约 4 个字符一个 token

use async_trait::async_trait;

use crate::application::ports::TokenCounterPort;

const CHARS_PER_TOKEN: u64 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenCounter;

#[async_trait]
impl TokenCounterPort for ApproxTokenCounter {
    async fn count(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        chars.div_ceil(CHARS_PER_TOKEN)
    }
}
