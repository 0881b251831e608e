//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub predictor_url: String,
    pub open_sessions: usize,
}

/// `GET /api/health`: liveness for this server. Does not call the predictor.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        predictor_url: ctx.core.predictor().base_url().to_string(),
        open_sessions: ctx.core.session_count(),
    })
}
