//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::request_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 静态文件挂载
#[derive(Debug, Clone)]
pub struct StaticMount {
    /// URL 路径前缀
    pub path: String,
    /// 本地目录
    pub dir: PathBuf,
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
    pub static_files: Option<StaticMount>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5060,
            body_limit_bytes: 20 * 1024 * 1024,
            static_files: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_static_files(mut self, path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.static_files = Some(StaticMount {
            path: path.into(),
            dir: dir.into(),
        });
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    pub(crate) fn build_router(&self) -> Router {
        // CORS 配置 - 允许所有来源的跨域请求
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        let mut router = create_routes();

        if let Some(mount) = &self.config.static_files {
            info!(path = %mount.path, dir = %mount.dir.display(), "Serving static files");
            let serve_dir = ServeDir::new(&mount.dir);
            router = if mount.path.trim_end_matches('/').is_empty() {
                router.fallback_service(serve_dir)
            } else {
                router.nest_service(&mount.path, serve_dir)
            };
        }

        // 长文本一次性提交，放宽请求体大小限制
        router
            .layer(DefaultBodyLimit::max(self.config.body_limit_bytes))
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {}", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::application::{
        BatchOrchestrator, OrchestratorConfig, ProcessingSettings, RunManagerPort,
        SettingsProvider,
    };
    use crate::domain::SplitType;
    use crate::infrastructure::adapters::{
        ApproxTokenCounter, FakeCompletionClient, FakeCompletionClientConfig,
    };
    use crate::infrastructure::memory::InMemoryRunManager;
    use crate::infrastructure::persistence::sled::{open_db, SledResponseCache, SledSettingsStore};

    fn test_router(dir: &tempfile::TempDir) -> Router {
        let db = open_db(dir.path().join("api.sled")).unwrap();
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig {
            fail_texts: vec!["boom".to_string()],
            ..Default::default()
        }));
        let cache = Arc::new(SledResponseCache::new(db.clone()));
        let run_manager: Arc<dyn RunManagerPort> = Arc::new(InMemoryRunManager::new());
        let orchestrator = Arc::new(BatchOrchestrator::new(
            OrchestratorConfig { max_concurrent: 2 },
            engine.clone(),
            cache.clone(),
            run_manager.clone(),
        ));
        let settings = Arc::new(SettingsProvider::new(
            Arc::new(SledSettingsStore::new(db)),
            ProcessingSettings {
                api_key: "sk-1234567890abcdef".to_string(),
                api_base_url: "http://localhost:1".to_string(),
                split_type: SplitType::Newline,
                split_length: 1000,
                split_char: "\\n---\\n".to_string(),
                lines_per_segment: 1,
                system_prompt: String::new(),
                user_prompt: "Echo: {$content}".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                max_tokens: 100,
                temperature: 0.1,
            },
        ));

        let state = AppState::new(
            orchestrator,
            engine,
            cache,
            run_manager,
            settings,
            Arc::new(ApproxTokenCounter),
            4,
        );
        HttpServer::new(ServerConfig::default(), state).build_router()
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);
        let body = call(&router, Method::GET, "/api/ping", None).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_settings_roundtrip_masks_key() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);

        let body = call(&router, Method::GET, "/api/settings/get", None).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["api_key"], "sk-1...cdef");

        let body = call(
            &router,
            Method::POST,
            "/api/settings/update",
            Some(json!({"model": "gpt-4", "max_tokens": 500})),
        )
        .await;
        assert_eq!(body["data"]["model"], "gpt-4");
        assert_eq!(body["data"]["user_prompt"], "Echo: {$content}");

        let body = call(
            &router,
            Method::POST,
            "/api/settings/update",
            Some(json!({"split_type": "length", "split_length": 0})),
        )
        .await;
        assert_eq!(body["errno"], 400);

        let body = call(&router, Method::POST, "/api/settings/reset", None).await;
        assert_eq!(body["data"]["model"], "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_batch_run_reports_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);

        let body = call(
            &router,
            Method::POST,
            "/api/batch/run",
            Some(json!({"content": "hello\nboom\nworld"})),
        )
        .await;

        assert_eq!(body["errno"], 0);
        let data = &body["data"];
        assert_eq!(data["state"], "completed");
        assert_eq!(data["total"], 3);
        assert_eq!(data["completed"], 2);
        assert_eq!(data["failed_indices"], json!([1]));
        assert_eq!(data["output"], "Echo: hello\nEcho: world");
        assert_eq!(data["results"][1]["outcome"]["status"], "failed");

        let stats = call(&router, Method::GET, "/api/cache/stats", None).await;
        assert_eq!(stats["data"]["total_entries"], 2);
    }

    #[tokio::test]
    async fn test_preview_segments() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);

        let body = call(
            &router,
            Method::POST,
            "/api/segments/preview",
            Some(json!({"content": "first line\n\nsecond"})),
        )
        .await;

        assert_eq!(body["data"]["total_segments"], 2);
        assert_eq!(body["data"]["segments"][1]["text"], "second");
    }

    #[tokio::test]
    async fn test_unknown_run_status_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);

        let body = call(
            &router,
            Method::POST,
            "/api/batch/status",
            Some(json!({"run_id": uuid::Uuid::new_v4()})),
        )
        .await;
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_health_with_default_check() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(&dir);

        // FakeCompletionClient 使用默认 health_check
        let body = call(&router, Method::GET, "/api/health", None).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["completion_service"], "ok");
    }
}
