//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{ConfigurationError, PromptError, SegmentError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 配置错误（提示词为空、分割参数无效），在任何远程调用之前中止
    #[error("Configuration error: {0}")]
    Config(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<ConfigurationError> for ApplicationError {
    fn from(err: ConfigurationError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SegmentError> for ApplicationError {
    fn from(err: SegmentError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PromptError> for ApplicationError {
    fn from(err: PromptError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<crate::application::ports::SettingsError> for ApplicationError {
    fn from(err: crate::application::ports::SettingsError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<crate::application::ports::RunError> for ApplicationError {
    fn from(err: crate::application::ports::RunError) -> Self {
        match err {
            crate::application::ports::RunError::NotFound(id) => Self::not_found("Run", id),
            other => Self::InternalError(other.to_string()),
        }
    }
}
