//! Batch Commands - 批处理相关命令

use serde::Serialize;
use uuid::Uuid;

use crate::domain::RunState;

/// 同步执行一次批处理
#[derive(Debug, Clone)]
pub struct RunBatchCommand {
    pub content: String,
    /// 只处理指定序号的片段（重跑失败片段）
    pub indices: Option<Vec<usize>>,
}

/// 后台提交一次批处理
#[derive(Debug, Clone)]
pub struct SubmitBatchCommand {
    pub content: String,
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Clone)]
pub struct SubmitBatchResponse {
    pub run_id: Uuid,
    pub state: RunState,
}

/// 取消运行
#[derive(Debug, Clone)]
pub struct CancelRunCommand {
    pub run_id: Uuid,
}

/// 查询运行状态
#[derive(Debug, Clone)]
pub struct QueryRunCommand {
    pub run_id: Uuid,
}

/// 分段预览
#[derive(Debug, Clone)]
pub struct PreviewSegmentsCommand {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentPreview {
    pub index: usize,
    pub text: String,
    pub char_count: usize,
    pub token_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewSegmentsResponse {
    pub total_segments: usize,
    /// 整段输入的 token 估算（仅供参考）
    pub total_tokens: u64,
    pub segments: Vec<SegmentPreview>,
}
