//! Request Fingerprint - 请求指纹
//!
//! 对决定一次补全结果的五个字段做 SHA-256，作为响应缓存的 key。
//! 每个字段以 8 字节小端长度前缀写入，字段边界不会产生歧义。

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::processing::CompletionRequest;

const DIGEST_TAG: &[u8] = b"gptbat.request.v1";

/// 请求指纹（64 位小写十六进制 SHA-256）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn update_field(hasher: &mut Sha256, field: &[u8]) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field);
}

/// 由五个字段计算指纹
pub fn fingerprint_fields(
    segment_text: &str,
    user_prompt: &str,
    system_prompt: &str,
    model: &str,
    max_tokens: u32,
) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(DIGEST_TAG);
    update_field(&mut hasher, segment_text.as_bytes());
    update_field(&mut hasher, user_prompt.as_bytes());
    update_field(&mut hasher, system_prompt.as_bytes());
    update_field(&mut hasher, model.as_bytes());
    update_field(&mut hasher, max_tokens.to_string().as_bytes());

    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// 计算请求指纹（temperature 不参与）
pub fn fingerprint(request: &CompletionRequest) -> Fingerprint {
    fingerprint_fields(
        &request.segment_text,
        &request.user_prompt,
        &request.system_prompt,
        &request.model,
        request.max_tokens,
    )
}
