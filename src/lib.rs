pub mod api; // HTTP surface: pages + JSON API
pub mod assessment; // Page controller state + reducer
pub mod cancel;
pub mod config;
pub mod core_state; // Transport-agnostic state
pub mod landing;
pub mod pages;
pub mod prediction; // Predictor client + mock
pub mod presenter;
pub mod probe; // Standalone predictor probe
pub mod vitals;

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to create predictor client: {0}")]
    Predictor(#[from] prediction::PredictionError),

    #[error("{0}")]
    Server(String),
}

pub fn run() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match serve() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn serve() -> Result<(), StartupError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let config = config::AppConfig::from_env();
        tracing::info!(
            predictor_url = %config.predictor_url,
            bind_addr = %config.bind_addr,
            probe_timeout_secs = config.probe_timeout.as_secs(),
            "Configuration loaded"
        );

        let bind_addr = config.bind_addr;
        let core = Arc::new(core_state::CoreState::from_config(config)?);
        let server = api::start_server_on(core, bind_addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!("Open {} in a browser", server.info.base_url());

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for shutdown signal: {e}");
        }
        server.stop().await;
        Ok::<(), StartupError>(())
    })
}
