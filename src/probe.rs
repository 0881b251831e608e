//! Standalone predictor probe ("Predict" control).
//!
//! One `GET /predict` raced against a fixed timer. Failures surface in a
//! dismissible modal; success changes nothing on screen. No retry.

use std::time::Duration;

use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::prediction::{PredictionError, Predictor};

pub const MODAL_TITLE: &str = "API Warning";

pub const TIMEOUT_MESSAGE: &str =
    "The API is taking too long. It may be asleep. Please restart it using the link in the footer.";

pub const INVALID_RESPONSE_MESSAGE: &str =
    "The API did not return the required output. Please check the API or try again later.";

/// Why a probe failed, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    /// Anything other than a timely, well-formed body. The detail is for
    /// logs only.
    InvalidResponse(String),
}

impl ProbeFailure {
    pub fn modal_message(&self) -> &'static str {
        match self {
            Self::Timeout => TIMEOUT_MESSAGE,
            Self::InvalidResponse(_) => INVALID_RESPONSE_MESSAGE,
        }
    }
}

impl From<PredictionError> for ProbeFailure {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Timeout { .. } => Self::Timeout,
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ok,
    Failed(ProbeFailure),
    /// The owning page went away first; nothing is reported.
    Cancelled,
}

/// Run one probe. Whichever of response, timer or cancellation settles
/// first decides the outcome; the others are dropped.
pub async fn run_probe(
    predictor: &dyn Predictor,
    timeout: Duration,
    required_field: &str,
    cancel: &CancellationToken,
) -> ProbeOutcome {
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => ProbeOutcome::Cancelled,
        response = predictor.fetch_probe() => match response {
            Ok(body) => match check_body(&body, required_field) {
                Ok(()) => ProbeOutcome::Ok,
                Err(failure) => ProbeOutcome::Failed(failure),
            },
            Err(err) => ProbeOutcome::Failed(err.into()),
        },
        () = tokio::time::sleep(timeout) => ProbeOutcome::Failed(ProbeFailure::Timeout),
    };

    match &outcome {
        ProbeOutcome::Ok => tracing::info!(base_url = predictor.base_url(), "Predictor probe succeeded"),
        ProbeOutcome::Failed(ProbeFailure::Timeout) => tracing::warn!(
            base_url = predictor.base_url(),
            timeout_secs = timeout.as_secs(),
            "Predictor probe timed out"
        ),
        ProbeOutcome::Failed(ProbeFailure::InvalidResponse(detail)) => tracing::warn!(
            base_url = predictor.base_url(),
            detail,
            "Predictor probe returned an unexpected response"
        ),
        ProbeOutcome::Cancelled => tracing::debug!("Predictor probe cancelled"),
    }
    outcome
}

/// The body must be an object whose `required_field` is present and truthy.
fn check_body(body: &serde_json::Value, required_field: &str) -> Result<(), ProbeFailure> {
    let value = body
        .as_object()
        .and_then(|obj| obj.get(required_field))
        .ok_or_else(|| ProbeFailure::InvalidResponse(format!("missing field `{required_field}`")))?;

    let truthy = match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    };
    if truthy {
        Ok(())
    } else {
        Err(ProbeFailure::InvalidResponse(format!(
            "field `{required_field}` is empty"
        )))
    }
}

// ═══════════════════════════════════════════════════════════
// Modal state
// ═══════════════════════════════════════════════════════════

/// Warning modal owned by the probe control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeModal {
    pub open: bool,
    pub message: String,
}

impl ProbeModal {
    /// Close and clear before a new probe starts.
    pub fn begin(&mut self) {
        self.open = false;
        self.message.clear();
    }

    /// Only failures open the modal.
    pub fn apply(&mut self, outcome: &ProbeOutcome) {
        if let ProbeOutcome::Failed(failure) = outcome {
            self.message = failure.modal_message().to_string();
            self.open = true;
        }
    }

    pub fn dismiss(&mut self) {
        self.open = false;
    }
}
