pub mod client;
pub mod mock;

pub use client::*;
pub use mock::*;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vitals::VitalsPayload;

/// Risk category returned by the predictor.
///
/// Decoding is strict: any other string fails, and the client reports it
/// as `PredictionError::InvalidResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Normal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Normal,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of `POST /predict`. Extra fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: RiskLevel,
}

/// Stable, serializable discriminant of a `PredictionError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionErrorKind {
    HttpStatus,
    Transport,
    Timeout,
    InvalidResponse,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("API Error: {status} - {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("{0}")]
    Transport(String),

    #[error("Predictor did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("Invalid predictor response: {0}")]
    InvalidResponse(String),
}

impl PredictionError {
    pub fn kind(&self) -> PredictionErrorKind {
        match self {
            Self::HttpStatus { .. } => PredictionErrorKind::HttpStatus,
            Self::Transport(_) => PredictionErrorKind::Transport,
            Self::Timeout { .. } => PredictionErrorKind::Timeout,
            Self::InvalidResponse(_) => PredictionErrorKind::InvalidResponse,
        }
    }
}

/// Access to the external prediction service.
///
/// `predict` is the assessment call. `fetch_probe` is a single unchecked
/// `GET /predict`; timing and shape checks belong to the probe control.
pub trait Predictor: Send + Sync {
    fn predict<'a>(
        &'a self,
        payload: &'a VitalsPayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>>;

    fn fetch_probe(&self) -> BoxFuture<'_, Result<serde_json::Value, PredictionError>>;

    /// Base URL the predictor is reached at, for diagnostics.
    fn base_url(&self) -> &str;
}

/// Decode a `POST /predict` body, failing closed on unknown categories.
pub fn decode_prediction(body: &str) -> Result<PredictionResult, PredictionError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| PredictionError::Transport(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| PredictionError::InvalidResponse(e.to_string()))
}
