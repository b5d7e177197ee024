//! Download pipeline configuration.
//!
//! A single `DownloaderConfig` is built at startup and injected into the
//! session manager. Environment parsing is lenient: a missing, unparseable
//! or zero value falls back to the default and logs a warning.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default maximum file size, in MiB.
pub const DEFAULT_MAX_UPLOAD_MIB: u64 = 500;

/// Default number of sessions allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Default number of requests allowed to wait for a slot.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Default time a request may wait for a slot.
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wall-clock limit for one extractor run.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(600);

/// Default limit for connecting to the release server and for each read
/// while the asset streams in.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URL release assets are fetched from (`{base}/{binary_name}`).
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download";

const BYTES_PER_MIB: u64 = 1_048_576;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_concurrent must be at least 1")]
    NoConcurrency,

    #[error("max_file_size must be greater than zero")]
    ZeroFileSize,

    #[error("session_timeout must be greater than zero")]
    ZeroSessionTimeout,

    #[error("fetch_timeout must be greater than zero")]
    ZeroFetchTimeout,

    #[error("release_url cannot be empty")]
    EmptyReleaseUrl,
}

/// Configuration for the download session manager and binary provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Root under which per-session working directories are created.
    pub temp_dir: PathBuf,
    /// Largest file the extractor may produce, in bytes.
    pub max_file_size: u64,
    /// Admission gate permits.
    pub max_concurrent: usize,
    /// Requests allowed to wait for a permit before new ones are rejected.
    pub queue_capacity: usize,
    /// How long a queued request waits for a permit. Zero rejects immediately.
    pub queue_timeout: Duration,
    /// Wall-clock limit for a single extractor run.
    pub session_timeout: Duration,
    /// Directory the extractor binary is installed into.
    pub bin_dir: PathBuf,
    /// Operator-supplied binary; disables downloading when set.
    pub binary_override: Option<PathBuf>,
    /// Release download base URL.
    pub release_url: String,
    /// Connect and per-read limit for the release download.
    pub fetch_timeout: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DownloaderConfig {
    /// Defaults rooted at the current working directory.
    pub fn with_defaults() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self {
            temp_dir: cwd.join("tmp"),
            max_file_size: mib_to_bytes(DEFAULT_MAX_UPLOAD_MIB),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_timeout: DEFAULT_QUEUE_TIMEOUT,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            bin_dir: cwd.join("media").join("bin"),
            binary_override: None,
            release_url: DEFAULT_RELEASE_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Build from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, `.env` map, tests).
    ///
    /// Recognized keys: `TEMP_DOWNLOAD_DIR`, `MAX_UPLOAD` (MiB),
    /// `MAXSOLICITUD`, `QUEUE_CAPACITY`, `QUEUE_TIMEOUT_SECS`,
    /// `DOWNLOAD_TIMEOUT_SECS`, `YTDLP_BIN_DIR`, `YTDLP_PATH`,
    /// `YTDLP_RELEASE_URL`, `YTDLP_FETCH_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::with_defaults();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("TEMP_DOWNLOAD_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(mib) = positive::<u64, _>(&lookup, "MAX_UPLOAD") {
            config.max_file_size = mib_to_bytes(mib);
        }
        if let Some(n) = positive::<usize, _>(&lookup, "MAXSOLICITUD") {
            config.max_concurrent = n;
        }
        if let Some(n) = non_negative::<usize, _>(&lookup, "QUEUE_CAPACITY") {
            config.queue_capacity = n;
        }
        if let Some(secs) = non_negative::<u64, _>(&lookup, "QUEUE_TIMEOUT_SECS") {
            config.queue_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = positive::<u64, _>(&lookup, "DOWNLOAD_TIMEOUT_SECS") {
            config.session_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = non_empty("YTDLP_BIN_DIR") {
            config.bin_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty("YTDLP_PATH") {
            config.binary_override = Some(PathBuf::from(path));
        }
        if let Some(url) = non_empty("YTDLP_RELEASE_URL") {
            config.release_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = positive::<u64, _>(&lookup, "YTDLP_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Set the temporary files root.
    #[must_use]
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = path.into();
        self
    }

    /// Set the binary installation directory.
    #[must_use]
    pub fn with_bin_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.bin_dir = path.into();
        self
    }

    /// Use a fixed extractor binary instead of provisioning one.
    #[must_use]
    pub fn with_binary_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_override = Some(path.into());
        self
    }

    /// Set the maximum file size in MiB.
    #[must_use]
    pub const fn with_max_upload_mib(mut self, mib: u64) -> Self {
        self.max_file_size = mib_to_bytes(mib);
        self
    }

    #[must_use]
    pub const fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set queue capacity and wait time for the admission gate.
    #[must_use]
    pub const fn with_queue(mut self, capacity: usize, timeout: Duration) -> Self {
        self.queue_capacity = capacity;
        self.queue_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    /// Check invariants the session manager relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::ZeroFileSize);
        }
        if self.session_timeout.is_zero() {
            return Err(ConfigError::ZeroSessionTimeout);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        if self.binary_override.is_none() && self.release_url.trim().is_empty() {
            return Err(ConfigError::EmptyReleaseUrl);
        }
        Ok(())
    }
}

/// Convert MiB to bytes, saturating on overflow.
pub const fn mib_to_bytes(mib: u64) -> u64 {
    mib.saturating_mul(BYTES_PER_MIB)
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}

fn positive<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    parse_number(lookup, key).filter(|v: &T| *v != T::default())
}

fn non_negative<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    parse_number(lookup, key)
}
