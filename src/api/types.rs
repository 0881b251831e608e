//! Shared types for the HTTP layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::Phase;
use crate::core_state::{CoreState, SessionSnapshot};
use crate::prediction::{PredictionErrorKind, RiskLevel};
use crate::presenter::RiskDisplay;
use crate::probe::MODAL_TITLE;
use crate::vitals::VitalField;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════

/// `PUT /api/assessments/:id/fields`. A `null` or absent value clears the field.
#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: VitalField,
    #[serde(default)]
    pub value: Option<f64>,
}

// ═══════════════════════════════════════════════════════════
// Views
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct AssessmentView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub fields: Vec<FieldView>,
    pub progress: f64,
    pub complete: bool,
    pub can_submit: bool,
    pub result: Option<ResultView>,
    pub error: Option<ErrorView>,
    pub probe: ProbeView,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub field: VitalField,
    pub label: &'static str,
    pub wire_key: &'static str,
    pub value: Option<f64>,
    pub filled: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub risk_level: RiskLevel,
    pub display: RiskDisplay,
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub kind: Option<PredictionErrorKind>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProbeView {
    pub open: bool,
    pub title: &'static str,
    pub message: String,
    pub in_flight: bool,
}

impl From<SessionSnapshot> for AssessmentView {
    fn from(snap: SessionSnapshot) -> Self {
        let state = &snap.state;
        let fields = VitalField::ALL
            .into_iter()
            .map(|field| FieldView {
                field,
                label: field.label(),
                wire_key: field.wire_key(),
                value: state.vitals.get(field),
                filled: state.vitals.is_filled(field),
            })
            .collect();

        let result = state.result.and_then(|r| {
            state.result_display().map(|display| ResultView {
                risk_level: r.risk_level,
                display,
            })
        });

        let error = state.error.clone().map(|message| ErrorView {
            kind: state.error_kind,
            message,
        });

        Self {
            id: snap.id,
            created_at: snap.created_at,
            phase: state.phase,
            fields,
            progress: state.progress(),
            complete: state.vitals.is_complete(),
            can_submit: state.can_submit(),
            result,
            error,
            probe: ProbeView {
                open: snap.probe.open,
                title: MODAL_TITLE,
                message: snap.probe.message.clone(),
                in_flight: snap.probe_in_flight,
            },
        }
    }
}
