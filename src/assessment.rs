//! Assessment page controller state.
//!
//! `AssessmentState` is an owned value; every change goes through
//! [`reduce`], which never mutates its input. The state machine is
//!
//! ```text
//! Idle ──Submit──▶ Submitting ──Resolved(Ok)──▶ ShowingResult
//!                      │                            │
//!                      ├──Resolved(Err)──▶ ShowingError
//!                      └──Abandoned──▶ ShowingResult (prior result) or Idle
//! ```
//!
//! and both terminal phases accept another `Submit`. `Abandoned` is applied
//! when the caller driving a submission goes away before it settles. Field edits are
//! accepted in every phase and never change it.

use serde::Serialize;

use crate::prediction::{PredictionError, PredictionErrorKind, PredictionResult};
use crate::presenter::{self, RiskDisplay};
use crate::vitals::{VitalField, VitalSigns, VitalsError, VitalsPayload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    ShowingResult,
    ShowingError,
}

/// Inputs to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set { field: VitalField, value: f64 },
    Clear(VitalField),
    Submit,
    Resolved(Result<PredictionResult, PredictionError>),
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Vitals(#[from] VitalsError),

    #[error("An assessment is already in progress")]
    Busy,

    #[error("No assessment is in progress")]
    NotSubmitting,
}

/// Form values plus the outcome of the last submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssessmentState {
    pub vitals: VitalSigns,
    pub phase: Phase,
    pub result: Option<PredictionResult>,
    /// User-facing message of the last failure.
    pub error: Option<String>,
    pub error_kind: Option<PredictionErrorKind>,
}

impl AssessmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.vitals.is_complete()
    }

    pub fn progress(&self) -> f64 {
        self.vitals.progress()
    }

    /// Request body for the current form, if complete.
    pub fn payload(&self) -> Result<VitalsPayload, VitalsError> {
        self.vitals.to_payload()
    }

    /// Result panel display; `None` while there is no result to show.
    pub fn result_display(&self) -> Option<RiskDisplay> {
        self.result
            .map(|r| presenter::present(Some(r.risk_level)))
    }
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(state: &AssessmentState, action: Action) -> Result<AssessmentState, AssessmentError> {
    let mut next = state.clone();
    match action {
        Action::Set { field, value } => {
            next.vitals.set(field, value)?;
        }
        Action::Clear(field) => {
            next.vitals.clear(field);
        }
        Action::Submit => {
            if state.is_busy() {
                return Err(AssessmentError::Busy);
            }
            state.vitals.to_payload()?;
            // The previous result stays on screen until the new one lands.
            next.phase = Phase::Submitting;
            next.error = None;
            next.error_kind = None;
        }
        Action::Resolved(outcome) => {
            if !state.is_busy() {
                return Err(AssessmentError::NotSubmitting);
            }
            match outcome {
                Ok(result) => {
                    next.phase = Phase::ShowingResult;
                    next.result = Some(result);
                    next.error = None;
                    next.error_kind = None;
                }
                Err(err) => {
                    next.phase = Phase::ShowingError;
                    next.result = None;
                    next.error_kind = Some(err.kind());
                    next.error = Some(err.to_string());
                }
            }
        }
        Action::Abandoned => {
            if !state.is_busy() {
                return Err(AssessmentError::NotSubmitting);
            }
            next.phase = if next.result.is_some() {
                Phase::ShowingResult
            } else {
                Phase::Idle
            };
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::RiskLevel;
    use crate::vitals::tests::complete_vitals;
    use proptest::prelude::*;

    fn ready() -> AssessmentState {
        AssessmentState {
            vitals: complete_vitals(),
            ..AssessmentState::new()
        }
    }

    fn resolved(risk: RiskLevel) -> Action {
        Action::Resolved(Ok(PredictionResult { risk_level: risk }))
    }

    fn server_error() -> Action {
        Action::Resolved(Err(PredictionError::HttpStatus {
            status: 500,
            status_text: "Internal Server Error".into(),
        }))
    }

    #[test]
    fn starts_idle_and_disabled() {
        let state = AssessmentState::new();
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.can_submit());
        assert_eq!(state.progress(), 7.0);
        assert!(state.result_display().is_none());
    }

    #[test]
    fn incomplete_submit_is_denied() {
        let state = AssessmentState::new();
        let err = reduce(&state, Action::Submit).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Vitals(VitalsError::Incomplete { .. })
        ));
    }

    #[test]
    fn submit_then_success_shows_result() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        assert_eq!(submitting.phase, Phase::Submitting);
        assert!(!submitting.can_submit());

        let done = reduce(&submitting, resolved(RiskLevel::High)).unwrap();
        assert_eq!(done.phase, Phase::ShowingResult);
        assert_eq!(done.result.unwrap().risk_level, RiskLevel::High);
        let display = done.result_display().unwrap();
        assert!(display.immediate_action);
        assert!(done.can_submit());
    }

    #[test]
    fn concurrent_submit_is_busy() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        assert_eq!(
            reduce(&submitting, Action::Submit).unwrap_err(),
            AssessmentError::Busy
        );
    }

    #[test]
    fn server_error_clears_prior_result() {
        let first = reduce(&ready(), Action::Submit).unwrap();
        let shown = reduce(&first, resolved(RiskLevel::Low)).unwrap();

        let second = reduce(&shown, Action::Submit).unwrap();
        // Stale result stays visible while the request is in flight.
        assert!(second.result.is_some());

        let failed = reduce(&second, server_error()).unwrap();
        assert_eq!(failed.phase, Phase::ShowingError);
        assert!(failed.result.is_none());
        assert!(failed.error.as_deref().unwrap().contains("500"));
        assert_eq!(failed.error_kind, Some(PredictionErrorKind::HttpStatus));
    }

    #[test]
    fn success_clears_prior_error() {
        let first = reduce(&ready(), Action::Submit).unwrap();
        let failed = reduce(&first, server_error()).unwrap();

        let retry = reduce(&failed, Action::Submit).unwrap();
        assert!(retry.error.is_none());

        let shown = reduce(&retry, resolved(RiskLevel::Normal)).unwrap();
        assert!(shown.error.is_none());
        assert_eq!(shown.result.unwrap().risk_level, RiskLevel::Normal);
    }

    #[test]
    fn abandoned_submit_returns_to_rest() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        let idle = reduce(&submitting, Action::Abandoned).unwrap();
        assert_eq!(idle.phase, Phase::Idle);
        assert!(idle.can_submit());

        let shown = reduce(&submitting, resolved(RiskLevel::Low)).unwrap();
        let again = reduce(&shown, Action::Submit).unwrap();
        let back = reduce(&again, Action::Abandoned).unwrap();
        assert_eq!(back.phase, Phase::ShowingResult);
        assert_eq!(back.result.unwrap().risk_level, RiskLevel::Low);

        assert_eq!(
            reduce(&back, Action::Abandoned).unwrap_err(),
            AssessmentError::NotSubmitting
        );
    }

    #[test]
    fn late_outcome_without_submit_is_rejected() {
        let state = ready();
        assert_eq!(
            reduce(&state, resolved(RiskLevel::High)).unwrap_err(),
            AssessmentError::NotSubmitting
        );
    }

    #[test]
    fn editing_never_changes_phase() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        let edited = reduce(
            &submitting,
            Action::Set {
                field: VitalField::HeartRate,
                value: 140.0,
            },
        )
        .unwrap();
        assert_eq!(edited.phase, Phase::Submitting);
        assert_eq!(edited.vitals.heart_rate, Some(140.0));

        let cleared = reduce(&edited, Action::Clear(VitalField::HeartRate)).unwrap();
        assert_eq!(cleared.phase, Phase::Submitting);
        assert!(!cleared.vitals.is_complete());
    }

    #[test]
    fn invalid_edit_leaves_state_untouched() {
        let state = ready();
        let err = reduce(
            &state,
            Action::Set {
                field: VitalField::Consciousness,
                value: 9.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AssessmentError::Vitals(_)));
        assert_eq!(state, ready());
    }

    proptest! {
        #[test]
        fn submit_enabled_iff_complete(mask in prop::collection::vec(any::<bool>(), 8)) {
            let full = complete_vitals();
            let mut state = AssessmentState::new();
            for (field, keep) in VitalField::ALL.into_iter().zip(mask.iter()) {
                if *keep {
                    state = reduce(&state, Action::Set { field, value: full.get(field).unwrap() }).unwrap();
                }
            }
            let all_kept = mask.iter().all(|k| *k);
            prop_assert_eq!(state.can_submit(), all_kept);
            prop_assert_eq!(reduce(&state, Action::Submit).is_ok(), all_kept);
        }
    }
}
