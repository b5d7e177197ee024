//! Process runtime for mediafetch.
//!
//! - `provision`: makes the extractor binary available (release download or
//!   operator-supplied path)
//! - `admission`: bounds how many sessions run at once
//! - `session`: one isolated extractor run per request, with guaranteed
//!   working-directory cleanup
//! - `process`: child output capture, shutdown and process-group cleanup

#![deny(unsafe_code)]

pub mod admission;
pub mod process;
pub mod provision;
pub mod session;
mod validate;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use provision::{ReleaseProvisioner, StaticBinary, build_provisioner};
pub use session::{SessionManager, sweep_stale_sessions};
pub use validate::{is_executable, validate_binary};
