//! Batch Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CancelRunCommand, QueryRunCommand, RunBatchCommand, SubmitBatchCommand};
use crate::domain::RunState;
use crate::infrastructure::http::dto::{ApiResponse, BatchRequest, BatchResultDto, RunIdRequest, RunStatusDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Run (同步)
// ============================================================================

pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ApiResponse<BatchResultDto>>, ApiError> {
    let cmd = RunBatchCommand {
        content: req.content,
        indices: req.indices,
    };

    let result = state.run_batch_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

// ============================================================================
// Submit (后台)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SubmitBatchResponseDto {
    pub run_id: Uuid,
    pub state: RunState,
}

pub async fn submit_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ApiResponse<SubmitBatchResponseDto>>, ApiError> {
    let cmd = SubmitBatchCommand {
        content: req.content,
        indices: req.indices,
    };

    let result = state.submit_batch_handler.handle(cmd)?;

    Ok(Json(ApiResponse::success(SubmitBatchResponseDto {
        run_id: result.run_id,
        state: result.state,
    })))
}

// ============================================================================
// Status / Cancel
// ============================================================================

pub async fn query_run_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunIdRequest>,
) -> Result<Json<ApiResponse<RunStatusDto>>, ApiError> {
    let snapshot = state
        .query_run_handler
        .handle(QueryRunCommand { run_id: req.run_id })?;

    Ok(Json(ApiResponse::success(snapshot.into())))
}

pub async fn cancel_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunIdRequest>,
) -> Result<Json<ApiResponse<RunStatusDto>>, ApiError> {
    let snapshot = state
        .cancel_run_handler
        .handle(CancelRunCommand { run_id: req.run_id })?;

    Ok(Json(ApiResponse::success(snapshot.into())))
}
