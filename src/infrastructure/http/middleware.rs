//! HTTP Middleware
//!
//! 请求日志：失败状态码与批处理请求耗时

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

const BATCH_PATH_PREFIX: &str = "/api/batch/";

/// 请求日志中间件
///
/// 5xx 记为 error，4xx 记为 warn，成功的批处理请求以 info 记录耗时。
/// 业务错误（errno != 0）以 200 返回，在 ApiError::into_response() 中记录。
/// 只记录 path，不记录 query。
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    let code = status.as_u16();

    match status {
        s if s.is_server_error() => {
            tracing::error!(method = %method, path = %path, status = code, latency_ms, "Request failed")
        }
        s if s.is_client_error() => {
            tracing::warn!(method = %method, path = %path, status = code, latency_ms, "Request rejected")
        }
        _ if path.starts_with(BATCH_PATH_PREFIX) => {
            tracing::info!(method = %method, path = %path, latency_ms, "Batch request handled")
        }
        _ => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    async fn echo(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/api/batch/run", post(echo))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content":"a"}"#))
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_keeps_client_status() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = HttpRequest::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_request_passes_through() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/batch/run?trace=1")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content":"a\nb"}"#))
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
