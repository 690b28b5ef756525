//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Where research, artifact and chat calls are sent.
    pub research_service: String,
    /// Whether worker write-back routes accept calls.
    pub internal_routes: bool,
}

/// Liveness plus the wiring a deployment most often gets wrong.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        research_service: state.config.research.base_url.clone(),
        internal_routes: state.config.internal_api_key.is_some(),
    })
}
