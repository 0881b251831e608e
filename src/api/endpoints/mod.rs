//! API endpoint handlers.
//!
//! JSON handlers mirror the assessment controller operations one to one;
//! `pages` serves the server-rendered HTML.

pub mod assessments;
pub mod health;
pub mod pages;
pub mod probe;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a session id path segment.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid session id: {raw}")))
}
