//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// Carts with a request in flight.
    pub tracked_carts: usize,
    pub lookup_timeout_ms: u64,
    pub version: &'static str,
}

/// `200 ok` when the database answers, `503 degraded` otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database,
            tracked_carts: state.locks.len(),
            lookup_timeout_ms: state.collaborators.timeout().as_millis() as u64,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
