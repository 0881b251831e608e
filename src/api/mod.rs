//! HTTP surface.
//!
//! Serves the landing and assessment pages plus a JSON API that mirrors
//! the assessment controller. Routes under `/api/` never cache.
//!
//! The router is composable: `app_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{start_server_on, AppServer, ServerInfo};
pub use types::ApiContext;
