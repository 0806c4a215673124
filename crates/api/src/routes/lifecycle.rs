//! Session lifecycle routes

use axum::{extract::State, Json};
use session::MonitorSnapshot;
use tracing::info;

use crate::error::ApiError;
use crate::SharedState;

/// Start monitoring; answers once the session is active or failed
pub async fn start(State(state): State<SharedState>) -> Result<Json<MonitorSnapshot>, ApiError> {
    info!("Session start requested");
    state.monitor.start().await?;
    Ok(Json(state.monitor.snapshot()))
}

/// Stop monitoring. Always succeeds.
pub async fn stop(State(state): State<SharedState>) -> Result<Json<MonitorSnapshot>, ApiError> {
    info!("Session stop requested");
    state.monitor.stop().await?;
    Ok(Json(state.monitor.snapshot()))
}

/// Retry after a resource failure
pub async fn retry(State(state): State<SharedState>) -> Result<Json<MonitorSnapshot>, ApiError> {
    info!("Session retry requested");
    state.monitor.retry().await?;
    Ok(Json(state.monitor.snapshot()))
}
