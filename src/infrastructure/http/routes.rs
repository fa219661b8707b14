//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   存活检查
//! - /api/health             GET   补全服务可达性检查
//! - /api/settings/get       GET   获取处理设置（API key 已隐藏）
//! - /api/settings/update    POST  部分更新处理设置
//! - /api/settings/reset     POST  恢复默认设置
//! - /api/segments/preview   POST  分段预览（含 token 估算）
//! - /api/batch/run          POST  同步执行批处理
//! - /api/batch/submit       POST  后台提交批处理
//! - /api/batch/status       POST  查询运行状态
//! - /api/batch/cancel       POST  取消运行
//! - /api/cache/stats        GET   缓存统计

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest("/settings", settings_routes())
        .nest("/segments", segment_routes())
        .nest("/batch", batch_routes())
        .route("/cache/stats", get(handlers::cache_stats))
}

/// Settings 路由
fn settings_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get", get(handlers::get_settings))
        .route("/update", post(handlers::update_settings))
        .route("/reset", post(handlers::reset_settings))
}

/// Segment 路由
fn segment_routes() -> Router<Arc<AppState>> {
    Router::new().route("/preview", post(handlers::preview_segments))
}

/// Batch 路由
fn batch_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_batch))
        .route("/submit", post(handlers::submit_batch))
        .route("/status", post(handlers::query_run_status))
        .route("/cancel", post(handlers::cancel_run))
}
