//! Settings Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{ProcessingSettings, SettingsPatch};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProcessingSettings>>, ApiError> {
    let settings = state.get_settings_handler.handle()?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<ApiResponse<ProcessingSettings>>, ApiError> {
    let settings = state.update_settings_handler.handle(patch)?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn reset_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProcessingSettings>>, ApiError> {
    let settings = state.update_settings_handler.reset()?;
    Ok(Json(ApiResponse::success(settings)))
}
