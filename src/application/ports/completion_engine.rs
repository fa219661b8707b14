//! Completion Engine Port - 聊天补全接口抽象
//!
//! 定义远程补全调用的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ApiCredentials, CompletionRequest, FailureKind};

/// 补全错误（单个片段级别，不中断整批）
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// 网络错误、超时或服务端错误
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Rate limited{}", .retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::Remote(_) => FailureKind::Remote,
            CompletionError::Auth(_) => FailureKind::Auth,
            CompletionError::RateLimited { .. } => FailureKind::RateLimited,
            CompletionError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Completion Engine Port
///
/// 外部 chat-completion 服务的抽象接口
#[async_trait]
pub trait CompletionEnginePort: Send + Sync {
    /// 执行一次补全，返回首个 choice 的内容（已 trim）
    async fn complete(
        &self,
        request: &CompletionRequest,
        credentials: &ApiCredentials,
    ) -> Result<String, CompletionError>;

    /// 检查服务是否可用
    async fn health_check(&self, _credentials: &ApiCredentials) -> bool {
        true // 默认实现
    }
}
