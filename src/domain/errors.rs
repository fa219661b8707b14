//! Domain Errors

use thiserror::Error;

/// 分段错误（均属配置错误，在任何远程调用之前抛出）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("分隔长度必须大于 0")]
    InvalidLength,

    #[error("每段行数必须大于 0")]
    InvalidLineCount,

    #[error("分隔符不能为空")]
    EmptyPattern,

    #[error("无效的分隔正则 {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// 提示词错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("提示词不能同时为空")]
    EmptyPrompts,
}

/// 运行配置错误：分段或提示词错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}
