//! Assessment session endpoints.
//!
//! - `POST /api/assessments`: open a session
//! - `GET /api/assessments/:id`: current view
//! - `PUT /api/assessments/:id/fields`: set or clear one field
//! - `POST /api/assessments/:id/submit`: run the assessment
//! - `DELETE /api/assessments/:id`: end the session

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::parse_session_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AssessmentView, FieldUpdate};
use crate::assessment::Action;

pub async fn create(
    State(ctx): State<ApiContext>,
) -> Result<(StatusCode, Json<AssessmentView>), ApiError> {
    let snapshot = ctx.core.open_session()?;
    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

pub async fn view(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentView>, ApiError> {
    let id = parse_session_id(&id)?;
    Ok(Json(ctx.core.snapshot(id)?.into()))
}

pub async fn set_field(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<AssessmentView>, ApiError> {
    let id = parse_session_id(&id)?;
    let action = match update.value {
        Some(value) => Action::Set {
            field: update.field,
            value,
        },
        None => Action::Clear(update.field),
    };
    Ok(Json(ctx.core.dispatch(id, action)?.into()))
}

/// Waits for the predictor. Predictor failures are part of the returned
/// view, not an HTTP error.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentView>, ApiError> {
    let id = parse_session_id(&id)?;
    Ok(Json(ctx.core.submit(id).await?.into()))
}

pub async fn end(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    ctx.core.close_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}
