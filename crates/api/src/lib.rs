//! Drowsiness Monitor API Server
//!
//! Control and status surface for the monitor: session lifecycle, alarm
//! mute, live snapshot and Prometheus metrics.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use session::MonitorHandle;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod error;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use settings::{AppConfig, LoggingConfig, ServerConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Monitor driver handle
    pub monitor: MonitorHandle,
    /// Prometheus handle, when the exporter is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(monitor: MonitorHandle, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            monitor,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::status::health))
        .route("/api/v1/status", get(routes::status::status))
        .route("/api/v1/session/start", post(routes::lifecycle::start))
        .route("/api/v1/session/stop", post(routes::lifecycle::stop))
        .route("/api/v1/session/retry", post(routes::lifecycle::retry))
        .route("/api/v1/alarm/mute", post(routes::alarm::set_muted))
        .route("/api/v1/alarm/toggle", post(routes::alarm::toggle))
        .route("/metrics", get(routes::status::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // Already set (tests, embedding) is fine
    if let Err(e) = result {
        tracing::debug!("Tracing subscriber not installed: {}", e);
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Serve the API until ctrl-c
pub async fn run_server(addr: &str, state: SharedState) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::RecordingAlarm;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use dms::DmsConfig;
    use landmark_source::scripted::{ScriptStep, ScriptedProvider};
    use landmark_source::ResourceFailure;
    use session::Monitor;
    use tower::ServiceExt;

    fn app(provider: ScriptedProvider) -> Router {
        let monitor = Monitor::new(DmsConfig::default(), provider, RecordingAlarm::new()).unwrap();
        let (handle, _task) = session::spawn(monitor);
        create_router(Arc::new(AppState::new(handle, None)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(ScriptedProvider::default());
        let (status, json) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["session_state"], "idle");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app(ScriptedProvider::new([]).hold_open());

        let (status, json) = send(&app, "POST", "/api/v1/session/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "active");
        assert!(json["session"]["id"].is_string());

        let (status, json) = send(&app, "POST", "/api/v1/session/start", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");

        let (status, json) = send(&app, "POST", "/api/v1/session/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "idle");

        // Stop is idempotent
        let (status, _) = send(&app, "POST", "/api/v1/session/stop", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failure_and_retry() {
        let provider = ScriptedProvider::new([])
            .hold_open()
            .fail_video(ResourceFailure::permission_denied("blocked"));
        let app = app(provider);

        let (status, json) = send(&app, "POST", "/api/v1/session/start", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["cause"], "permission_denied");

        let (_, json) = send(&app, "GET", "/api/v1/status", None).await;
        assert_eq!(json["state"], "error");
        assert_eq!(json["error_message"], "Camera access was denied");

        let (status, json) = send(&app, "POST", "/api/v1/session/retry", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "active");
    }

    #[tokio::test]
    async fn test_retry_when_idle_conflicts() {
        let app = app(ScriptedProvider::default());
        let (status, _) = send(&app, "POST", "/api/v1/session/retry", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_mute() {
        let app = app(ScriptedProvider::new(ScriptStep::ears(0.1, 3)).hold_open());

        let (status, json) =
            send(&app, "POST", "/api/v1/alarm/mute", Some(r#"{"muted":true}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["muted"], true);
        assert_eq!(json["alarm_armed"], false);

        let (_, json) = send(&app, "POST", "/api/v1/alarm/toggle", None).await;
        assert_eq!(json["muted"], false);
    }

    #[tokio::test]
    async fn test_mute_rejects_bad_body() {
        let app = app(ScriptedProvider::default());
        let (status, _) = send(&app, "POST", "/api/v1/alarm/mute", Some(r#"{"muted":"yes"}"#)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_metrics_without_exporter() {
        let app = app(ScriptedProvider::default());
        let (status, _) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
