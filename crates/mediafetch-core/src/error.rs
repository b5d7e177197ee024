//! Error types for the download pipeline.
//!
//! `DownloadError` is the single error surfaced at the session boundary.
//! Adapters map its variants to transport-level responses (see the axum
//! crate); `kind()` gives them a stable discriminant to do so.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while making the extractor binary available.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The release download could not be performed.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The release server answered with a non-success status.
    #[error("Release server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Writing the binary or its directory failed.
    #[error("Failed to install binary at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured binary path does not exist.
    #[error("Extractor binary not found at: {0}")]
    NotFound(PathBuf),

    /// The binary exists but has no execute permission.
    #[error("Extractor binary exists but is not executable: {0}")]
    NotExecutable(PathBuf),
}

impl ProvisionError {
    /// Create an `Install` error for the given path.
    pub fn install(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Install {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur during a download session.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Malformed or missing caller input (URL, format).
    #[error("{0}")]
    InvalidInput(String),

    /// The extractor binary could not be provisioned.
    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),

    /// Working directory creation or file access failed.
    #[error("Filesystem error at {path}: {reason}")]
    Filesystem { path: PathBuf, reason: String },

    /// The extractor could not be spawned or exited non-zero.
    #[error("Download failed: {0}")]
    Extraction(String),

    /// The extractor exited 0 but left nothing in the working directory.
    #[error("Download failed: extractor produced no output file")]
    NoOutputProduced,

    /// The produced file exceeds the configured size limit.
    #[error("Downloaded file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// The extractor did not finish within the session timeout.
    #[error("Download timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The admission gate is saturated.
    #[error("Too many concurrent downloads, try again later")]
    TooBusy,
}

impl DownloadError {
    /// Create an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a `Filesystem` error from an I/O error at `path`.
    pub fn filesystem(path: &Path, err: &std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Stable discriminant for client-side handling.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Provisioning(_) => "PROVISIONING_FAILED",
            Self::Filesystem { .. } => "FILESYSTEM_ERROR",
            Self::Extraction(_) => "EXTRACTION_FAILED",
            Self::NoOutputProduced => "NO_OUTPUT",
            Self::TooLarge { .. } => "TOO_LARGE",
            Self::Timeout(_) => "TIMEOUT",
            Self::TooBusy => "TOO_BUSY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_errors_convert_with_question_mark() {
        fn provision() -> Result<(), ProvisionError> {
            Err(ProvisionError::NotFound(PathBuf::from("/opt/yt-dlp")))
        }
        fn download() -> Result<(), DownloadError> {
            provision()?;
            Ok(())
        }

        let err = download().unwrap_err();
        assert_eq!(err.kind(), "PROVISIONING_FAILED");
        assert!(err.to_string().contains("/opt/yt-dlp"));
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = DownloadError::Timeout(Duration::from_secs(90));
        assert_eq!(err.to_string(), "Download timed out after 90 seconds");
    }
}
