//! HTTP Completion Client - 调用 OpenAI 兼容的 chat-completion 服务
//!
//! 实现 CompletionEnginePort trait
//!
//! 外部 API:
//! POST {base_url}/v1/chat/completions
//! Header: Authorization: Bearer {api_key}
//! Request: {"model": "...", "messages": [...], "max_tokens": N, "temperature": T}
//! Response: {"choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{CompletionEnginePort, CompletionError};
use crate::domain::{ApiCredentials, CompletionRequest};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// 补全请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// HTTP 补全客户端配置
#[derive(Debug, Clone)]
pub struct HttpCompletionClientConfig {
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpCompletionClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl HttpCompletionClientConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 补全客户端
///
/// base URL 和 API key 随每次调用传入，设置修改后无需重建客户端
pub struct HttpCompletionClient {
    client: Client,
}

impl HttpCompletionClient {
    pub fn new(config: HttpCompletionClientConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Remote(e.to_string()))?;

        Ok(Self { client })
    }

    fn completions_url(base_url: &str) -> String {
        format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
    }

    fn models_url(base_url: &str) -> String {
        format!("{}/v1/models", base_url.trim_end_matches('/'))
    }

    fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage<'_>> {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        if !request.user_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "user",
                content: &request.user_prompt,
            });
        }
        messages
    }
}

fn map_transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Remote("Request timed out".to_string())
    } else if e.is_connect() {
        CompletionError::Remote(format!("Cannot connect to completion service: {}", e))
    } else {
        CompletionError::Remote(e.to_string())
    }
}

#[async_trait]
impl CompletionEnginePort for HttpCompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        credentials: &ApiCredentials,
    ) -> Result<String, CompletionError> {
        let url = Self::completions_url(&credentials.base_url);
        let body = ChatCompletionBody {
            model: &request.model,
            messages: Self::build_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            url = %url,
            model = %request.model,
            text_len = request.segment_text.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CompletionError::Auth(format!("HTTP {}: {}", status, error_text))
                }
                StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { retry_after_secs },
                _ => CompletionError::Remote(format!("HTTP {}: {}", status, error_text)),
            });
        }

        // 读取响应体时的超时或连接中断属于传输错误，只有解析失败才算响应格式错误
        let body = response.bytes().await.map_err(map_transport_error)?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("No choices in response".to_string()))?
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| {
                CompletionError::MalformedResponse("Missing message content".to_string())
            })?;

        tracing::debug!(content_len = content.len(), "Chat completion received");

        Ok(content.trim().to_string())
    }

    async fn health_check(&self, credentials: &ApiCredentials) -> bool {
        match self
            .client
            .get(Self::models_url(&credentials.base_url))
            .bearer_auth(&credentials.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
