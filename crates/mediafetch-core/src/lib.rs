//! Core domain types and port definitions for mediafetch.
//!
//! This crate holds everything the download pipeline and its adapters agree on:
//! - Request/artifact types and input validation
//! - The error taxonomy surfaced to callers
//! - Pipeline configuration
//! - Pure helpers (file classification, platform binary table)
//! - Ports (traits) implemented by `mediafetch-runtime`
//!
//! No process, network or HTTP code lives here.

#![deny(unused_crate_dependencies)]

pub mod classify;
pub mod config;
pub mod error;
pub mod platform;
pub mod ports;
pub mod request;

#[cfg(test)]
use serde_json as _;

pub use classify::{FileClass, MediaCategory, classify};
pub use config::{ConfigError, DEFAULT_FETCH_TIMEOUT, DownloaderConfig};
pub use error::{DownloadError, ProvisionError};
pub use platform::{DEFAULT_BINARY, PlatformKey, resolve_binary_name};
pub use ports::{BinaryProvisioner, MediaDownloaderPort};
pub use request::{DownloadRequest, DownloadedArtifact, MAX_FORMAT_LEN, MediaKind};
