//! Segment Preview Handler

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::{PreviewSegmentsCommand, PreviewSegmentsResponse};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewSegmentsRequest {
    pub content: String,
}

/// 按当前设置预览分段结果
pub async fn preview_segments(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewSegmentsRequest>,
) -> Result<Json<ApiResponse<PreviewSegmentsResponse>>, ApiError> {
    let response = state
        .preview_segments_handler
        .handle(PreviewSegmentsCommand {
            content: req.content,
        })
        .await?;

    Ok(Json(ApiResponse::success(response)))
}
