//! Axum web adapter for mediafetch.
//!
//! Exposes the download pipeline over HTTP:
//! - `GET /api/video` and `GET /api/audio` return the downloaded file
//! - `GET /health` for liveness checks
//!
//! Handlers only talk to `MediaDownloaderPort`; the concrete session
//! manager is wired in [`bootstrap`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by the integration tests
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::{ErrorBody, HttpError};
pub use routes::create_router;
pub use state::AppState;
