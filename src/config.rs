use std::net::SocketAddr;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedRisk AI";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hosted predictor the assessment form talks to.
pub const DEFAULT_PREDICTOR_URL: &str = "https://ItsMeArm00n-Health-Risk-Predictor.hf.space";

/// Local address the page server binds to.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Budget for the standalone probe before it is reported as a timeout.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// TCP connect timeout for predictor requests. No overall request timeout
/// is applied on the assessment path.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Field the probe expects in the `GET /predict` body.
pub const DEFAULT_PROBE_FIELD: &str = "risk_level";

const ENV_PREDICTOR_URL: &str = "MEDRISK_PREDICTOR_URL";
const ENV_BIND_ADDR: &str = "MEDRISK_BIND_ADDR";
const ENV_PROBE_TIMEOUT: &str = "MEDRISK_PROBE_TIMEOUT_SECS";
const ENV_CONNECT_TIMEOUT: &str = "MEDRISK_CONNECT_TIMEOUT_SECS";
const ENV_PROBE_FIELD: &str = "MEDRISK_PROBE_FIELD";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,medrisk_lib=debug"
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Predictor base URL without trailing slash.
    pub predictor_url: String,
    pub bind_addr: SocketAddr,
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    pub probe_field: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predictor_url: DEFAULT_PREDICTOR_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            probe_field: DEFAULT_PROBE_FIELD.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `MEDRISK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparsable values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let predictor_url = lookup(ENV_PREDICTOR_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.predictor_url);

        let bind_addr = match lookup(ENV_BIND_ADDR) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Invalid {ENV_BIND_ADDR}, using {DEFAULT_BIND_ADDR}");
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let probe_timeout = secs_or(&lookup, ENV_PROBE_TIMEOUT, defaults.probe_timeout);
        let connect_timeout = secs_or(&lookup, ENV_CONNECT_TIMEOUT, defaults.connect_timeout);

        let probe_field = lookup(ENV_PROBE_FIELD)
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or(defaults.probe_field);

        Self {
            predictor_url,
            bind_addr,
            probe_timeout,
            connect_timeout,
            probe_field,
        }
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                tracing::warn!(value = %raw, "Invalid {key}, using {}s", default.as_secs());
                default
            }
        },
        None => default,
    }
}
