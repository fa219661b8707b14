//! Run Manager Port - 批处理运行管理
//!
//! 跟踪每次运行的状态、进度、最终结果与取消令牌，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{BatchResult, RunState};

/// Run Manager 错误
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run not found: {0}")]
    NotFound(Uuid),

    #[error("Run already exists: {0}")]
    AlreadyExists(Uuid),
}

/// 运行快照
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub state: RunState,
    pub total_segments: usize,
    pub finished_segments: usize,
    pub error_message: Option<String>,
    pub result: Option<BatchResult>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Run Manager Port
///
/// 所有状态存储在内存中
pub trait RunManagerPort: Send + Sync {
    /// 登记新运行，返回其取消令牌
    fn register(&self, run_id: Uuid) -> Result<CancellationToken, RunError>;

    /// 设置运行状态
    fn set_state(&self, run_id: Uuid, state: RunState) -> Result<(), RunError>;

    /// 设置片段总数
    fn set_total(&self, run_id: Uuid, total_segments: usize) -> Result<(), RunError>;

    /// 记录一个片段处理完毕（成功或失败）
    fn record_progress(&self, run_id: Uuid) -> Result<(), RunError>;

    /// 保存最终结果
    fn finish(&self, run_id: Uuid, result: BatchResult) -> Result<(), RunError>;

    /// 标记运行失败
    fn set_failed(&self, run_id: Uuid, error: String) -> Result<(), RunError>;

    /// 取消运行：停止调度未开始的片段
    fn cancel(&self, run_id: Uuid) -> Result<(), RunError>;

    /// 获取运行快照
    fn get(&self, run_id: Uuid) -> Option<RunSnapshot>;
}
