use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::{PredictionError, PredictionResult, Predictor, RiskLevel};
use crate::vitals::VitalsPayload;

/// Scripted reply. `None` means the call never settles.
type Reply<T> = Option<Result<T, PredictionError>>;

/// Mock predictor for testing: returns configurable replies.
///
/// Counts calls, and separately counts calls that actually settled, so a
/// test can tell a dropped future from a completed one.
pub struct MockPredictor {
    predict_reply: Mutex<Reply<PredictionResult>>,
    probe_reply: Mutex<Reply<serde_json::Value>>,
    delay: Option<Duration>,
    predict_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    settled: AtomicUsize,
    last_payload: Mutex<Option<VitalsPayload>>,
}

impl MockPredictor {
    /// Answers `Normal` to predictions and a well-formed probe body.
    pub fn new() -> Self {
        Self {
            predict_reply: Mutex::new(Some(Ok(PredictionResult {
                risk_level: RiskLevel::Normal,
            }))),
            probe_reply: Mutex::new(Some(Ok(serde_json::json!({ "risk_level": "Normal" })))),
            delay: None,
            predict_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            settled: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    pub fn with_risk(self, risk_level: RiskLevel) -> Self {
        self.set_risk(risk_level);
        self
    }

    pub fn with_prediction_error(self, err: PredictionError) -> Self {
        self.set_prediction_error(err);
        self
    }

    pub fn with_probe_body(self, body: serde_json::Value) -> Self {
        *lock(&self.probe_reply) = Some(Ok(body));
        self
    }

    pub fn with_probe_error(self, err: PredictionError) -> Self {
        *lock(&self.probe_reply) = Some(Err(err));
        self
    }

    /// Neither call ever settles.
    pub fn never_settles(self) -> Self {
        *lock(&self.predict_reply) = None;
        *lock(&self.probe_reply) = None;
        self
    }

    /// Every reply is held back by `delay` before settling.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the prediction reply between calls.
    pub fn set_risk(&self, risk_level: RiskLevel) {
        *lock(&self.predict_reply) = Some(Ok(PredictionResult { risk_level }));
    }

    pub fn set_prediction_error(&self, err: PredictionError) {
        *lock(&self.predict_reply) = Some(Err(err));
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Calls whose future ran to completion.
    pub fn settled_calls(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<VitalsPayload> {
        *lock(&self.last_payload)
    }

    async fn reply<T>(&self, reply: Reply<T>) -> Result<T, PredictionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(outcome) => {
                self.settled.fetch_add(1, Ordering::SeqCst);
                outcome
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for MockPredictor {
    fn predict<'a>(
        &'a self,
        payload: &'a VitalsPayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_payload) = Some(*payload);
        let reply = lock(&self.predict_reply).clone();
        self.reply(reply).boxed()
    }

    fn fetch_probe(&self) -> BoxFuture<'_, Result<serde_json::Value, PredictionError>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let reply = lock(&self.probe_reply).clone();
        self.reply(reply).boxed()
    }

    fn base_url(&self) -> &str {
        "mock://predictor"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
