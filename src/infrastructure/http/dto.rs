//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::RunSnapshot;
use crate::domain::{BatchResult, RunState, SegmentResult};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Batch DTOs
// ============================================================================

/// 批处理请求（run / submit 共用）
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub content: String,
    /// 只处理这些序号的片段
    #[serde(default)]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
pub struct RunIdRequest {
    pub run_id: Uuid,
}

/// 批处理结果
#[derive(Debug, Serialize)]
pub struct BatchResultDto {
    pub run_id: Uuid,
    pub state: RunState,
    pub total: usize,
    pub completed: usize,
    pub cache_hits: usize,
    pub failed_indices: Vec<usize>,
    /// 所有成功片段按序号拼接（换行分隔）
    pub output: String,
    pub results: Vec<SegmentResult>,
}

impl From<BatchResult> for BatchResultDto {
    fn from(result: BatchResult) -> Self {
        Self {
            run_id: result.run_id,
            state: result.state,
            total: result.len(),
            completed: result.completed_count(),
            cache_hits: result.cache_hits(),
            failed_indices: result.failed_indices(),
            output: result.joined_output("\n"),
            results: result.results,
        }
    }
}

/// 运行状态
#[derive(Debug, Serialize)]
pub struct RunStatusDto {
    pub run_id: Uuid,
    pub state: RunState,
    pub total_segments: usize,
    pub finished_segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BatchResultDto>,
}

impl From<RunSnapshot> for RunStatusDto {
    fn from(snapshot: RunSnapshot) -> Self {
        Self {
            run_id: snapshot.run_id,
            state: snapshot.state,
            total_segments: snapshot.total_segments,
            finished_segments: snapshot.finished_segments,
            error: snapshot.error_message,
            created_at: snapshot.created_at.to_rfc3339(),
            completed_at: snapshot.completed_at.map(|t| t.to_rfc3339()),
            result: snapshot.result.map(BatchResultDto::from),
        }
    }
}
