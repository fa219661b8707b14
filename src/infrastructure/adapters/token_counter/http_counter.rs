//! HTTP Token Counter - 调用外部 token 计数服务
//!
//! Request: POST {url} {"key": "...", "text": "..."}
//! Response: {"count": N}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::TokenCounterPort;

#[derive(Debug, Serialize)]
struct CountRequest<'a> {
    key: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: Option<u64>,
}

/// HTTP Token Counter 配置
#[derive(Debug, Clone)]
pub struct HttpTokenCounterConfig {
    pub url: String,
    pub key: String,
    pub timeout_secs: u64,
}

/// HTTP Token Counter
///
/// 任何失败都返回 0，只写日志
pub struct HttpTokenCounter {
    client: Client,
    config: HttpTokenCounterConfig,
}

impl HttpTokenCounter {
    pub fn new(config: HttpTokenCounterConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn request_count(&self, text: &str) -> Result<u64, reqwest::Error> {
        let response: CountResponse = self
            .client
            .post(&self.config.url)
            .json(&CountRequest {
                key: &self.config.key,
                text,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.count.unwrap_or(0))
    }
}

#[async_trait]
impl TokenCounterPort for HttpTokenCounter {
    async fn count(&self, text: &str) -> u64 {
        match self.request_count(text).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(url = %self.config.url, error = %e, "Token count request failed");
                0
            }
        }
    }
}
