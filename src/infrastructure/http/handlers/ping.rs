//! Ping / Health Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Ping endpoint - 健康检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub completion_service: &'static str,
    pub base_url: String,
}

/// 检查当前设置指向的补全服务是否可达
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let config = state.settings.current()?.to_processing_config()?;
    let base_url = config.credentials.base_url.clone();

    if !state.completion_engine.health_check(&config.credentials).await {
        return Err(ApiError::ServiceUnavailable(format!(
            "Completion service unreachable: {}",
            base_url
        )));
    }

    Ok(Json(ApiResponse::success(HealthResponse {
        completion_service: "ok",
        base_url,
    })))
}
