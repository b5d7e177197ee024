//! Extractor binary provisioning.
//!
//! Two strategies implement [`BinaryProvisioner`]:
//! - [`ReleaseProvisioner`]: installs the platform's release asset into a
//!   bin directory on first use
//! - [`StaticBinary`]: an operator-supplied path, validated but never fetched
//!
//! Both check the binary on every call, so a deleted install heals itself on
//! the next request. Installation is single-flight: concurrent callers wait
//! on one fetch, and the file appears at its final path only after it is
//! complete and executable (write to a sibling, then rename). The sibling is
//! removed if the install fails or the caller stops waiting for it.

mod fetch;

use async_trait::async_trait;
use mediafetch_core::{
    BinaryProvisioner, DEFAULT_FETCH_TIMEOUT, DownloaderConfig, PlatformKey, ProvisionError,
};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::validate::{is_executable, validate_binary};

/// Choose the provisioning strategy for a configuration.
///
/// A configured override wins; otherwise the release asset for `platform`
/// is installed into `config.bin_dir`.
pub fn build_provisioner(
    config: &DownloaderConfig,
    platform: &PlatformKey,
) -> Arc<dyn BinaryProvisioner> {
    match &config.binary_override {
        Some(path) => {
            debug!(target: "mediafetch.provision", path = %path.display(), "Using static extractor binary");
            Arc::new(StaticBinary::new(path.clone()))
        }
        None => Arc::new(ReleaseProvisioner::for_platform(config, platform)),
    }
}

/// Installs the extractor from a release download.
pub struct ReleaseProvisioner {
    bin_dir: PathBuf,
    binary_name: String,
    release_url: String,
    client: Client,
    install_lock: Mutex<()>,
}

impl ReleaseProvisioner {
    pub fn new(
        bin_dir: impl Into<PathBuf>,
        binary_name: impl Into<String>,
        release_url: impl Into<String>,
    ) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            binary_name: binary_name.into(),
            release_url: release_url.into(),
            client: http_client(DEFAULT_FETCH_TIMEOUT),
            install_lock: Mutex::new(()),
        }
    }

    /// Limit connecting to the release server, and each read of the body,
    /// to `timeout`. A stalled server fails the install instead of holding
    /// the install lock.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Provisioner for the asset matching `platform`.
    pub fn for_platform(config: &DownloaderConfig, platform: &PlatformKey) -> Self {
        Self::new(
            config.bin_dir.clone(),
            platform.binary_name(),
            config.release_url.clone(),
        )
        .with_fetch_timeout(config.fetch_timeout)
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Full URL of the release asset.
    pub fn download_url(&self) -> String {
        format!(
            "{}/{}",
            self.release_url.trim_end_matches('/'),
            self.binary_name
        )
    }

    async fn install(&self, target: &Path) -> Result<(), ProvisionError> {
        tokio::fs::create_dir_all(&self.bin_dir)
            .await
            .map_err(|e| ProvisionError::install(&self.bin_dir, e))?;

        let staging = StagingFile::new(self.bin_dir.join(format!(
            ".{}.{}.partial",
            self.binary_name,
            uuid::Uuid::new_v4().simple()
        )));
        let url = self.download_url();

        info!(
            target: "mediafetch.provision",
            url = %url,
            path = %target.display(),
            "Installing extractor binary"
        );

        let bytes = fetch::download_to(&self.client, &url, staging.path()).await?;
        set_executable(staging.path()).await?;
        staging.commit(target).await?;

        info!(
            target: "mediafetch.provision",
            path = %target.display(),
            bytes,
            "Extractor binary installed"
        );
        Ok(())
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("mediafetch/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// A download in progress next to its final path.
///
/// Removed on drop unless [`commit`](Self::commit) moved it into place.
#[derive(Debug)]
struct StagingFile {
    path: PathBuf,
    committed: bool,
}

impl StagingFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn commit(mut self, target: &Path) -> Result<(), ProvisionError> {
        tokio::fs::rename(&self.path, target)
            .await
            .map_err(|e| ProvisionError::install(target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    target: "mediafetch.provision",
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove partial download"
                );
            }
        }
    }
}

#[async_trait]
impl BinaryProvisioner for ReleaseProvisioner {
    async fn ensure(&self) -> Result<PathBuf, ProvisionError> {
        let target = self.target_path();
        if is_executable(&target) {
            return Ok(target);
        }

        let _guard = self.install_lock.lock().await;

        // Another caller may have finished the install while we waited.
        if is_executable(&target) {
            debug!(target: "mediafetch.provision", path = %target.display(), "Binary installed by concurrent caller");
            return Ok(target);
        }

        self.install(&target).await?;
        Ok(target)
    }

    fn target_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binary_name)
    }
}

/// An operator-supplied extractor binary.
#[derive(Debug, Clone)]
pub struct StaticBinary {
    path: PathBuf,
}

impl StaticBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BinaryProvisioner for StaticBinary {
    async fn ensure(&self) -> Result<PathBuf, ProvisionError> {
        validate_binary(&self.path)
    }

    fn target_path(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| ProvisionError::install(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn set_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}
