//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Process health (fast, no storage access)
//! - `/readyz` - Readiness probe (active storage read)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use newsletter_core::subscription;

use crate::state::AppState;

/// GET /livez - Basic liveness probe.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Process health (no storage access).
///
/// Fast endpoint suitable for frequent liveness checks.
#[axum::debug_handler]
pub async fn healthz() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok"
        })),
    )
        .into_response()
}

/// GET /readyz - Readiness probe (active storage check).
///
/// Reads the subscription counter to verify the backing store answers queries.
/// Returns 200 if the read succeeds, 503 if it fails.
#[axum::debug_handler]
pub async fn readyz(State(state): State<AppState>) -> Response {
    match subscription::count(state.store.as_ref()).await {
        Ok(subscriptions) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "ready": true,
                "subscriptions": subscriptions
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "ready": false,
                "error": e.to_string()
            })),
        )
            .into_response(),
    }
}
