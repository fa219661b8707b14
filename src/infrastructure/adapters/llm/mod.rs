//! LLM Adapter - chat-completion 客户端实现

mod fake_client;
mod http_completion_client;

pub use fake_client::{FakeCompletionClient, FakeCompletionClientConfig};
pub use http_completion_client::*;
