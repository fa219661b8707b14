//! Fake Completion Client - 用于测试的补全客户端
//!
//! 回显渲染后的 user prompt，不实际调用远程服务

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{CompletionEnginePort, CompletionError};
use crate::domain::{ApiCredentials, CompletionRequest};

/// Fake Completion Client 配置
#[derive(Debug, Clone, Default)]
pub struct FakeCompletionClientConfig {
    /// 片段文本在此列表中时返回 Remote 错误
    pub fail_texts: Vec<String>,
    /// 模拟调用延迟（毫秒）
    pub latency_ms: u64,
}

/// Fake Completion Client
pub struct FakeCompletionClient {
    config: FakeCompletionClientConfig,
    calls: AtomicUsize,
}

impl FakeCompletionClient {
    pub fn new(config: FakeCompletionClientConfig) -> Self {
        tracing::info!(
            fail_texts = config.fail_texts.len(),
            latency_ms = config.latency_ms,
            "FakeCompletionClient initialized"
        );
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// 已执行的 complete 调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionEnginePort for FakeCompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        _credentials: &ApiCredentials,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.config.fail_texts.iter().any(|t| t == &request.segment_text) {
            return Err(CompletionError::Remote(format!(
                "scripted failure for {:?}",
                request.segment_text
            )));
        }

        tracing::debug!(
            text_len = request.segment_text.len(),
            "FakeCompletionClient: echoing user prompt"
        );
        Ok(request.user_prompt.trim().to_string())
    }
}
