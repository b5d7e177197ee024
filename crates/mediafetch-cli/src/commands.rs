//! Subcommands and their arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use mediafetch_axum::{CorsConfig, ServerConfig};
use mediafetch_core::DownloaderConfig;

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default when no command is given)
    Serve(ServeArgs),

    /// Download the yt-dlp release binary for this platform
    Install(InstallArgs),

    /// Show the detected platform and the binary it maps to
    Platform,
}

/// Command-line overrides for the server. Unset flags keep the value from
/// the environment (or `.env`), then the built-in default.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Port to listen on [env: PORT]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Root directory for per-request working directories [env: TEMP_DOWNLOAD_DIR]
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Maximum downloaded file size in MiB [env: MAX_UPLOAD]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_upload_mib: Option<u64>,

    /// Maximum concurrent extractor runs [env: MAXSOLICITUD]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrent: Option<u64>,

    /// Requests allowed to wait for a slot [env: QUEUE_CAPACITY]
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Seconds a queued request waits before giving up [env: QUEUE_TIMEOUT_SECS]
    #[arg(long)]
    pub queue_timeout_secs: Option<u64>,

    /// Seconds before a running extractor is killed [env: DOWNLOAD_TIMEOUT_SECS]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub download_timeout_secs: Option<u64>,

    #[command(flatten)]
    pub binary: BinaryArgs,

    /// Comma-separated allowed CORS origins, `*` for any [env: CORS_ORIGINS]
    #[arg(long)]
    pub cors_origins: Option<String>,

    /// Install the extractor before accepting requests
    #[arg(long)]
    pub provision_on_start: bool,
}

/// Where the extractor binary comes from.
#[derive(Debug, Default, Args)]
pub struct BinaryArgs {
    /// Directory the release binary is installed into [env: YTDLP_BIN_DIR]
    #[arg(long)]
    pub bin_dir: Option<PathBuf>,

    /// Use this extractor binary instead of installing one [env: YTDLP_PATH]
    #[arg(long)]
    pub ytdlp_path: Option<PathBuf>,

    /// Base URL release assets are fetched from [env: YTDLP_RELEASE_URL]
    #[arg(long)]
    pub release_url: Option<String>,

    /// Seconds to wait on the release server before giving up [env: YTDLP_FETCH_TIMEOUT_SECS]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub binary: BinaryArgs,

    /// Replace an existing install
    #[arg(long)]
    pub force: bool,
}

impl BinaryArgs {
    pub fn apply(self, mut config: DownloaderConfig) -> DownloaderConfig {
        if let Some(dir) = self.bin_dir {
            config = config.with_bin_dir(dir);
        }
        if let Some(path) = self.ytdlp_path {
            config = config.with_binary_override(path);
        }
        if let Some(url) = self.release_url {
            config = config.with_release_url(url);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config = config.with_fetch_timeout(Duration::from_secs(secs));
        }
        config
    }
}

impl ServeArgs {
    /// Layer these flags over `config`.
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(origins) = self.cors_origins {
            config.cors = CorsConfig::from_list(&origins);
        }
        config.provision_on_start |= self.provision_on_start;

        let mut downloader = self.binary.apply(config.downloader);
        if let Some(dir) = self.temp_dir {
            downloader = downloader.with_temp_dir(dir);
        }
        if let Some(mib) = self.max_upload_mib {
            downloader = downloader.with_max_upload_mib(mib);
        }
        if let Some(n) = self.max_concurrent {
            downloader = downloader.with_max_concurrent(usize::try_from(n).unwrap_or(usize::MAX));
        }
        if self.queue_capacity.is_some() || self.queue_timeout_secs.is_some() {
            let capacity = self.queue_capacity.unwrap_or(downloader.queue_capacity);
            let timeout = self
                .queue_timeout_secs
                .map_or(downloader.queue_timeout, Duration::from_secs);
            downloader = downloader.with_queue(capacity, timeout);
        }
        if let Some(secs) = self.download_timeout_secs {
            downloader = downloader.with_session_timeout(Duration::from_secs(secs));
        }
        config.downloader = downloader;
        config
    }
}
