//! Status and metrics routes

use axum::{extract::State, Json};
use serde::Serialize;
use session::MonitorSnapshot;

use crate::error::ApiError;
use crate::SharedState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub session_state: &'static str,
}

/// Health check
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let snapshot = state.monitor.snapshot();

    Json(HealthResponse {
        status: "healthy",
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session_state: snapshot.state.name(),
    })
}

/// Current monitor snapshot
pub async fn status(State(state): State<SharedState>) -> Json<MonitorSnapshot> {
    Json(state.monitor.snapshot())
}

/// Prometheus exposition
pub async fn metrics(State(state): State<SharedState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ApiError::MetricsUnavailable)
}
