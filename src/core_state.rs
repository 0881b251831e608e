//! Transport-agnostic application state.
//!
//! `CoreState` owns the predictor handle, the runtime configuration and
//! every open assessment session. One session is one page lifetime of the
//! assessment controller: created fresh on page load, dropped on unmount
//! or after a period of inactivity.
//!
//! Locks are held only to read or apply a transition, never across a
//! predictor call.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::assessment::{reduce, Action, AssessmentError, AssessmentState};
use crate::cancel::CancellationToken;
use crate::config::AppConfig;
use crate::prediction::{HttpPredictor, PredictionError, Predictor};
use crate::probe::{self, ProbeModal, ProbeOutcome};

/// Sessions untouched for this long are dropped on the next page load.
const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Assessment session not found")]
    SessionNotFound,

    #[error("Assessment session ended before the request completed")]
    SessionClosed,

    #[error("A predictor probe is already running")]
    ProbeBusy,

    #[error("Internal lock error")]
    LockPoisoned,

    #[error(transparent)]
    Assessment(#[from] AssessmentError),
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

struct AssessmentSession {
    state: AssessmentState,
    probe: ProbeModal,
    probe_in_flight: bool,
    created_at: DateTime<Utc>,
    last_activity: Instant,
    cancel: CancellationToken,
}

impl AssessmentSession {
    fn new() -> Self {
        Self {
            state: AssessmentState::new(),
            probe: ProbeModal::default(),
            probe_in_flight: false,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    fn snapshot(&self, id: Uuid) -> SessionSnapshot {
        SessionSnapshot {
            id,
            state: self.state.clone(),
            probe: self.probe.clone(),
            probe_in_flight: self.probe_in_flight,
            created_at: self.created_at,
        }
    }
}

/// Point-in-time copy of a session, safe to render without holding locks.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: AssessmentState,
    pub probe: ProbeModal,
    pub probe_in_flight: bool,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    predictor: Arc<dyn Predictor>,
    sessions: RwLock<HashMap<Uuid, AssessmentSession>>,
}

impl CoreState {
    pub fn new(config: AppConfig, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            config,
            predictor,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// State backed by the HTTP predictor at `config.predictor_url`.
    pub fn from_config(config: AppConfig) -> Result<Self, PredictionError> {
        let predictor = HttpPredictor::from_config(&config)?;
        Ok(Self::new(config, Arc::new(predictor)))
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    fn write_sessions(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, AssessmentSession>>, CoreError> {
        self.sessions.write().map_err(|_| CoreError::LockPoisoned)
    }

    /// Run `f` against a live session under the write lock.
    fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AssessmentSession) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut sessions = self.write_sessions()?;
        let session = sessions.get_mut(&id).ok_or(CoreError::SessionNotFound)?;
        session.last_activity = Instant::now();
        f(session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// Start a fresh assessment (page load).
    pub fn open_session(&self) -> Result<SessionSnapshot, CoreError> {
        let mut sessions = self.write_sessions()?;

        let before = sessions.len();
        sessions.retain(|_, s| {
            let live = s.last_activity.elapsed() < SESSION_IDLE_TIMEOUT;
            if !live {
                s.cancel.cancel();
            }
            live
        });
        if sessions.len() < before {
            tracing::debug!(pruned = before - sessions.len(), "Dropped idle assessment sessions");
        }

        let id = Uuid::new_v4();
        let session = AssessmentSession::new();
        let snapshot = session.snapshot(id);
        sessions.insert(id, session);
        tracing::info!(session = %id, "Assessment session opened");
        Ok(snapshot)
    }

    /// End an assessment (unmount). In-flight calls are cancelled and
    /// their outcomes discarded.
    pub fn close_session(&self, id: Uuid) -> Result<(), CoreError> {
        let session = self
            .write_sessions()?
            .remove(&id)
            .ok_or(CoreError::SessionNotFound)?;
        session.cancel.cancel();
        tracing::info!(session = %id, "Assessment session closed");
        Ok(())
    }

    pub fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, CoreError> {
        let sessions = self.sessions.read().map_err(|_| CoreError::LockPoisoned)?;
        sessions
            .get(&id)
            .map(|s| s.snapshot(id))
            .ok_or(CoreError::SessionNotFound)
    }

    // ── Form ────────────────────────────────────────────────

    /// Apply a form edit (`Set` / `Clear`).
    pub fn dispatch(&self, id: Uuid, action: Action) -> Result<SessionSnapshot, CoreError> {
        self.with_session(id, |s| {
            s.state = reduce(&s.state, action)?;
            Ok(s.snapshot(id))
        })
    }

    // ── Primary path ────────────────────────────────────────

    /// Submit the form to the predictor and record the outcome.
    pub async fn submit(&self, id: Uuid) -> Result<SessionSnapshot, CoreError> {
        let (payload, cancel) = self.with_session(id, |s| {
            let next = reduce(&s.state, Action::Submit)?;
            let payload = next.payload().map_err(AssessmentError::from)?;
            s.state = next;
            Ok((payload, s.cancel.clone()))
        })?;
        tracing::info!(session = %id, "Assessment submitted");

        let guard = InFlightGuard::new(self, id, InFlight::Submit);
        let outcome = cancel
            .run_until_cancelled(self.predictor.predict(&payload))
            .await;
        guard.disarm();
        let outcome = outcome.ok_or(CoreError::SessionClosed)?;

        match &outcome {
            Ok(result) => {
                tracing::info!(session = %id, risk_level = %result.risk_level, "Assessment completed")
            }
            Err(err) => {
                tracing::warn!(session = %id, kind = ?err.kind(), error = %err, "Assessment failed")
            }
        }

        self.with_session(id, |s| {
            s.state = reduce(&s.state, Action::Resolved(outcome))?;
            Ok(s.snapshot(id))
        })
        .map_err(closed_if_missing)
    }

    // ── Secondary path ──────────────────────────────────────

    /// Run the standalone probe and update the session's modal.
    pub async fn probe(&self, id: Uuid) -> Result<SessionSnapshot, CoreError> {
        let cancel = self.with_session(id, |s| {
            if s.probe_in_flight {
                return Err(CoreError::ProbeBusy);
            }
            s.probe_in_flight = true;
            s.probe.begin();
            Ok(s.cancel.clone())
        })?;

        let guard = InFlightGuard::new(self, id, InFlight::Probe);
        let outcome = probe::run_probe(
            self.predictor(),
            self.config.probe_timeout,
            &self.config.probe_field,
            &cancel,
        )
        .await;
        guard.disarm();

        if outcome == ProbeOutcome::Cancelled {
            return Err(CoreError::SessionClosed);
        }

        self.with_session(id, |s| {
            s.probe_in_flight = false;
            s.probe.apply(&outcome);
            Ok(s.snapshot(id))
        })
        .map_err(closed_if_missing)
    }

    pub fn dismiss_probe(&self, id: Uuid) -> Result<SessionSnapshot, CoreError> {
        self.with_session(id, |s| {
            s.probe.dismiss();
            Ok(s.snapshot(id))
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum InFlight {
    Submit,
    Probe,
}

/// Puts a session back to rest when the future driving a predictor call is
/// dropped before it settles (client disconnect, reload).
struct InFlightGuard<'a> {
    core: &'a CoreState,
    id: Uuid,
    kind: InFlight,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(core: &'a CoreState, id: Uuid, kind: InFlight) -> Self {
        Self {
            core,
            id,
            kind,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let kind = self.kind;
        // A closed session has nothing left to reset.
        let reset = self.core.with_session(self.id, |s| {
            match kind {
                InFlight::Submit => s.state = reduce(&s.state, Action::Abandoned)?,
                InFlight::Probe => s.probe_in_flight = false,
            }
            Ok(())
        });
        if reset.is_ok() {
            tracing::debug!(session = %self.id, ?kind, "Abandoned predictor call reset");
        }
    }
}

/// A session that vanished mid-call was closed, not never opened.
fn closed_if_missing(err: CoreError) -> CoreError {
    match err {
        CoreError::SessionNotFound => CoreError::SessionClosed,
        other => other,
    }
}
