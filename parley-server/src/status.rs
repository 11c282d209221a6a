use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::RelayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub status: &'static str,
    pub rooms: usize,
    pub total_connections: usize,
}

/// Read-only health snapshot: current room count and total connection count.
/// Unauthenticated by design.
pub async fn health(State(state): State<RelayState>) -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        rooms: state.registry.room_count(),
        total_connections: state.registry.connection_count(),
    })
}
