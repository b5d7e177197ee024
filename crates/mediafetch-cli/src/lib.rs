//! Command-line entry point for mediafetch.
//!
//! `serve` runs the HTTP server, `install` provisions the extractor ahead of
//! the first request, `platform` reports which release asset this host maps
//! to.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary target
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod handlers;
pub mod parser;

pub use commands::{BinaryArgs, Commands, InstallArgs, ServeArgs};
pub use parser::Cli;
