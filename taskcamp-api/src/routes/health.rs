/// Health check endpoint
///
/// Liveness only: answers without touching the database, so orchestrators
/// can distinguish "process up" from "database down" (the latter surfaces
/// as 500s on real endpoints).

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
