//! Child process helpers for extractor runs.

mod capture;
mod group;
mod shutdown;

pub use capture::{OutputCapture, spawn_output_readers};
pub use group::ProcessGroupGuard;
pub use shutdown::{DEFAULT_GRACE_PERIOD, shutdown_child};
