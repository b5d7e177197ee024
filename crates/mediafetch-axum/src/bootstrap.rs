//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where the runtime implementations are
//! wired to the HTTP adapter.

use std::sync::Arc;

use anyhow::{Context, Result};
use mediafetch_core::{DownloaderConfig, MediaDownloaderPort, PlatformKey};
use mediafetch_runtime::{SessionManager, build_provisioner, sweep_stale_sessions};
use tracing::{info, warn};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

impl CorsConfig {
    /// Parse a comma-separated origin list. Empty or `*` allows all.
    pub fn from_list(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::AllowAll
        } else {
            Self::AllowOrigins(origins)
        }
    }
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Download pipeline settings.
    pub downloader: DownloaderConfig,
    /// Install the extractor before accepting requests.
    pub provision_on_start: bool,
}

impl ServerConfig {
    /// Create config with default values.
    pub fn with_defaults() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors: CorsConfig::default(),
            downloader: DownloaderConfig::with_defaults(),
            provision_on_start: false,
        }
    }

    /// Build from process environment variables (`PORT`, `CORS_ORIGINS`
    /// and the downloader keys).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::with_defaults();
        config.downloader = DownloaderConfig::from_lookup(&lookup);

        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %raw, "Ignoring invalid PORT"),
            }
        }
        if let Some(raw) = lookup("CORS_ORIGINS") {
            config.cors = CorsConfig::from_list(&raw);
        }
        config
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    /// Download pipeline as trait object.
    pub downloader: Arc<dyn MediaDownloaderPort>,
}

impl AxumContext {
    pub fn new(downloader: Arc<dyn MediaDownloaderPort>) -> Self {
        Self { downloader }
    }
}

/// Bootstrap the server: clean up after earlier runs, choose the
/// provisioning strategy and build the session manager.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let downloader = &config.downloader;
    let platform = PlatformKey::current();

    info!(
        target: "mediafetch.http",
        platform = %platform,
        temp_dir = %downloader.temp_dir.display(),
        bin_dir = %downloader.bin_dir.display(),
        max_concurrent = downloader.max_concurrent,
        max_file_size = downloader.max_file_size,
        "Axum bootstrap resolved configuration"
    );

    let swept = sweep_stale_sessions(&downloader.temp_dir).await;
    if swept > 0 {
        info!(target: "mediafetch.session", swept, "Removed stale session directories");
    }

    let provisioner = build_provisioner(downloader, &platform);
    if config.provision_on_start {
        let path = provisioner
            .ensure()
            .await
            .context("failed to provision extractor binary at startup")?;
        info!(target: "mediafetch.provision", path = %path.display(), "Extractor ready");
    }

    let manager = SessionManager::new(downloader.clone(), provisioner)
        .context("invalid downloader configuration")?;

    Ok(AxumContext::new(Arc::new(manager)))
}

/// Start the HTTP server and run until Ctrl-C or SIGTERM.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config).await?;
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    info!("mediafetch listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Shutdown signal received (ctrl-c)"),
        () = terminate => info!("Shutdown signal received (SIGTERM)"),
    }
}
