//! Port definitions.
//!
//! Adapters depend on these traits, never on the runtime implementations,
//! so handlers can be exercised against fakes.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{DownloadError, ProvisionError};
use crate::request::{DownloadRequest, DownloadedArtifact};

/// Runs one download session end to end.
///
/// Implementations own session isolation, concurrency bounding and cleanup;
/// by the time `download` returns no per-session state remains on disk.
#[async_trait]
pub trait MediaDownloaderPort: Send + Sync {
    async fn download(&self, request: DownloadRequest) -> Result<DownloadedArtifact, DownloadError>;
}

/// Makes the extractor binary available and returns its path.
#[async_trait]
pub trait BinaryProvisioner: Send + Sync {
    /// Ensure an executable binary exists; install it if the strategy allows.
    async fn ensure(&self) -> Result<PathBuf, ProvisionError>;

    /// Where the binary is (or will be) located, for diagnostics.
    fn target_path(&self) -> PathBuf;
}
