//! Alarm mute routes

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::SharedState;

/// Mute request body
#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

/// Mute state response
#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub muted: bool,
    pub alarm_armed: bool,
}

/// Set the mute flag
pub async fn set_muted(
    State(state): State<SharedState>,
    Json(request): Json<MuteRequest>,
) -> Result<Json<MuteResponse>, ApiError> {
    state.monitor.set_muted(request.muted).await?;
    Ok(Json(mute_response(&state)))
}

/// Flip the mute flag
pub async fn toggle(State(state): State<SharedState>) -> Result<Json<MuteResponse>, ApiError> {
    state.monitor.toggle_mute().await?;
    Ok(Json(mute_response(&state)))
}

fn mute_response(state: &SharedState) -> MuteResponse {
    let snapshot = state.monitor.snapshot();
    MuteResponse {
        muted: snapshot.muted,
        alarm_armed: snapshot.alarm_armed,
    }
}
