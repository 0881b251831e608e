use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::{decode_prediction, PredictionError, PredictionResult, Predictor};
use crate::config::AppConfig;
use crate::vitals::VitalsPayload;

/// HTTP client for the hosted risk predictor.
pub struct HttpPredictor {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPredictor {
    /// Create a client for `base_url`.
    ///
    /// Only the connect phase is bounded; the assessment call waits as long
    /// as the service takes.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("medrisk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PredictionError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PredictionError> {
        Self::new(&config.predictor_url, config.connect_timeout)
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    async fn post_predict(
        &self,
        payload: &VitalsPayload,
    ) -> Result<PredictionResult, PredictionError> {
        let url = self.predict_url();
        tracing::debug!(?payload, %url, "Sending assessment data");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Predictor rejected assessment");
            return Err(status_error(status));
        }

        let body = response.text().await.map_err(transport_error)?;
        let result = decode_prediction(&body)?;
        tracing::info!(risk_level = %result.risk_level, "Received prediction result");
        Ok(result)
    }

    async fn get_predict(&self) -> Result<serde_json::Value, PredictionError> {
        let url = self.predict_url();
        tracing::debug!(%url, "Probing predictor");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PredictionError::InvalidResponse(e.to_string()))
    }
}

impl Predictor for HttpPredictor {
    fn predict<'a>(
        &'a self,
        payload: &'a VitalsPayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>> {
        self.post_predict(payload).boxed()
    }

    fn fetch_probe(&self) -> BoxFuture<'_, Result<serde_json::Value, PredictionError>> {
        self.get_predict().boxed()
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The text is the registered reason phrase for the code, not whatever phrase
/// the server wrote on its status line. Unregistered codes get an empty text.
fn status_error(status: reqwest::StatusCode) -> PredictionError {
    PredictionError::HttpStatus {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
    }
}

fn transport_error(e: reqwest::Error) -> PredictionError {
    if e.is_decode() {
        PredictionError::Transport(format!("Failed to read predictor response: {e}"))
    } else {
        PredictionError::Transport(e.to_string())
    }
}
