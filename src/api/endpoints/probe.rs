//! Predictor probe endpoints.

use axum::extract::{Path, State};
use axum::Json;

use super::parse_session_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AssessmentView};

/// `POST /api/assessments/:id/probe`: resolves once the probe settles or
/// times out. The outcome is reported through `probe` in the view.
pub async fn run(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentView>, ApiError> {
    let id = parse_session_id(&id)?;
    Ok(Json(ctx.core.probe(id).await?.into()))
}

/// `POST /api/assessments/:id/probe/dismiss`
pub async fn dismiss(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentView>, ApiError> {
    let id = parse_session_id(&id)?;
    Ok(Json(ctx.core.dismiss_probe(id)?.into()))
}
