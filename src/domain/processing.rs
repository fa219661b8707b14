//! Processing Config - 一次批处理运行的配置

use serde::{Deserialize, Serialize};

use super::errors::PromptError;
use super::prompt::{build_prompts, validate_templates};
use super::segmenter::{Segment, SplitStrategy};

/// API 凭证
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

// 不在日志中输出完整 key
impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// 隐藏密钥，只保留首尾各 4 个字符
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// 批处理配置
///
/// 由调用方持有，运行期间只读
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub split: SplitStrategy,
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub credentials: ApiCredentials,
}

impl ProcessingConfig {
    /// 校验模板和分割参数
    pub fn validate(&self) -> Result<(), crate::domain::ConfigurationError> {
        validate_templates(&self.user_prompt, &self.system_prompt)?;
        self.split.validate()?;
        Ok(())
    }

    /// 为片段构建补全请求
    pub fn request_for(&self, segment: &Segment) -> Result<CompletionRequest, PromptError> {
        let prompts = build_prompts(&segment.text, &self.user_prompt, &self.system_prompt)?;

        Ok(CompletionRequest {
            segment_text: segment.text.clone(),
            user_prompt: prompts.user_prompt,
            system_prompt: prompts.system_prompt,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

/// 补全请求
///
/// 前五个字段决定指纹，temperature 只随请求发送
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub segment_text: String,
    pub user_prompt: String,
    pub system_prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProcessingConfig {
        ProcessingConfig {
            split: SplitStrategy::default(),
            system_prompt: "sys".to_string(),
            user_prompt: "Echo: {$content}".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            temperature: 0.1,
            credentials: ApiCredentials::new("sk-test", "https://api.openai.com"),
        }
    }

    #[test]
    fn test_request_for_segment() {
        let segment = Segment {
            index: 0,
            text: "hello".to_string(),
        };
        let request = config().request_for(&segment).unwrap();
        assert_eq!(request.user_prompt, "Echo: hello");
        assert_eq!(request.system_prompt, "sys");
        assert_eq!(request.segment_text, "hello");
        assert_eq!(request.max_tokens, 500);
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let mut cfg = config();
        cfg.split = SplitStrategy::ByLength { max_chars: 0 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", config().credentials);
        assert!(!rendered.contains("sk-test"));
    }
}
