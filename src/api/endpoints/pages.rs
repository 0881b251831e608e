//! HTML page handlers.
//!
//! - `GET /`: landing page (`?demo=N`)
//! - `GET /assessment`: open a session and redirect to it
//! - `GET /assessment/:id`: render the session
//! - `POST /assessment/:id`: apply a form post, then redirect back

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::assessment::Action;
use crate::core_state::CoreError;
use crate::landing;
use crate::pages::{self, FormAction};

#[derive(Debug, Deserialize)]
pub struct LandingQuery {
    pub demo: Option<usize>,
}

pub async fn landing(Query(query): Query<LandingQuery>) -> Html<String> {
    Html(landing::render_landing_page(query.demo.unwrap_or(0)))
}

fn session_location(id: Uuid) -> String {
    format!("/assessment/{id}")
}

pub async fn new_assessment(State(ctx): State<ApiContext>) -> Result<Redirect, ApiError> {
    let snapshot = ctx.core.open_session()?;
    Ok(Redirect::to(&session_location(snapshot.id)))
}

/// Stale or unknown ids start over with a fresh session.
pub async fn assessment(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to("/assessment").into_response());
    };
    match ctx.core.snapshot(id) {
        Ok(snapshot) => Ok(Html(pages::render_assessment_page(&snapshot)).into_response()),
        Err(CoreError::SessionNotFound) => Ok(Redirect::to("/assessment").into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn post_assessment(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to("/assessment").into_response());
    };
    let submission =
        pages::parse_form(&form).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let applied = apply_submission(&ctx, id, submission).await;
    match applied {
        Ok(()) => {}
        Err(CoreError::SessionNotFound | CoreError::SessionClosed) => {
            return Ok(Redirect::to("/assessment").into_response());
        }
        Err(e @ (CoreError::Assessment(_) | CoreError::ProbeBusy)) => {
            // The page re-renders current state; the rejected control was
            // already disabled there.
            tracing::debug!(session = %id, error = %e, "Form action rejected");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&session_location(id)).into_response())
}

async fn apply_submission(
    ctx: &ApiContext,
    id: Uuid,
    submission: pages::FormSubmission,
) -> Result<(), CoreError> {
    for (field, value) in submission.updates {
        let action = match value {
            Some(value) => Action::Set { field, value },
            None => Action::Clear(field),
        };
        if let Err(e) = ctx.core.dispatch(id, action) {
            match e {
                CoreError::Assessment(_) => {
                    tracing::debug!(session = %id, %field, error = %e, "Ignoring invalid field value")
                }
                other => return Err(other),
            }
        }
    }

    match submission.action {
        FormAction::Save => {}
        FormAction::Submit => {
            ctx.core.submit(id).await?;
        }
        FormAction::Probe => {
            ctx.core.probe(id).await?;
        }
        FormAction::Dismiss => {
            ctx.core.dismiss_probe(id)?;
        }
    }
    Ok(())
}
