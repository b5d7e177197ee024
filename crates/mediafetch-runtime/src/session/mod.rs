//! Download sessions.
//!
//! One session is one extractor run: admit, provision, create a private
//! working directory, run the extractor with argv only, pick up the file it
//! produced, read it, remove the directory. The directory is removed and
//! the extractor's process group killed on every path, including timeouts,
//! failures and cancellation.

mod invocation;
mod output;
mod workdir;

pub use invocation::{ExtractorCommand, OUTPUT_STEM, output_template};
pub use workdir::{SESSION_PREFIX, SessionDir, session_id, sweep_stale_sessions};

use async_trait::async_trait;
use mediafetch_core::{
    BinaryProvisioner, ConfigError, DownloadError, DownloadRequest, DownloadedArtifact,
    DownloaderConfig, MediaDownloaderPort, classify,
};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::admission::AdmissionGate;
use crate::process::{
    DEFAULT_GRACE_PERIOD, ProcessGroupGuard, shutdown_child, spawn_output_readers,
};

/// Stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// How long to wait for output pipes to close after the child exits.
const PIPE_DRAIN_WAIT: Duration = Duration::from_secs(2);

/// Runs download sessions against the extractor.
pub struct SessionManager {
    config: DownloaderConfig,
    provisioner: Arc<dyn BinaryProvisioner>,
    gate: AdmissionGate,
    counter: AtomicU64,
}

impl SessionManager {
    /// Create a manager after validating `config`.
    pub fn new(
        config: DownloaderConfig,
        provisioner: Arc<dyn BinaryProvisioner>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let gate = AdmissionGate::from_config(&config);
        Ok(Self {
            config,
            provisioner,
            gate,
            counter: AtomicU64::new(0),
        })
    }

    pub const fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub const fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Run one session to completion.
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadedArtifact, DownloadError> {
        let _permit = self.gate.admit().await?;
        let binary = self.provisioner.ensure().await?;

        let id = session_id(self.counter.fetch_add(1, Ordering::Relaxed));
        let session = SessionDir::create(&self.config.temp_dir, id).await?;

        let result = self.execute(&binary, &session, request).await;
        session.close().await;
        result
    }

    async fn execute(
        &self,
        binary: &Path,
        session: &SessionDir,
        request: &DownloadRequest,
    ) -> Result<DownloadedArtifact, DownloadError> {
        let invocation = ExtractorCommand::new(binary, request.url().as_str())
            .max_filesize(self.config.max_file_size)
            .flag("--no-playlist")
            .output_template(output_template(session.path()))
            .format(request.format());

        let mut cmd = invocation.build();
        cmd.current_dir(session.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            DownloadError::Extraction(format!(
                "could not start {}: {e}",
                binary.display()
            ))
        })?;
        // Dropped before the session directory, on every exit path.
        let _group = ProcessGroupGuard::new(child.id());
        debug!(
            target: "mediafetch.session",
            session = session.id(),
            pid = child.id(),
            "Extractor started"
        );

        let capture = spawn_output_readers(&mut child, session.id(), STDERR_TAIL_LINES);

        let status = match timeout(self.config.session_timeout, child.wait()).await {
            Ok(status) => status.map_err(|e| DownloadError::Extraction(e.to_string()))?,
            Err(_) => {
                warn!(
                    target: "mediafetch.session",
                    session = session.id(),
                    timeout_secs = self.config.session_timeout.as_secs(),
                    "Extractor timed out, terminating"
                );
                if let Err(e) = shutdown_child(&mut child, DEFAULT_GRACE_PERIOD).await {
                    warn!(target: "mediafetch.session", session = session.id(), error = %e, "Failed to stop extractor");
                }
                capture.finish(PIPE_DRAIN_WAIT).await;
                return Err(DownloadError::Timeout(self.config.session_timeout));
            }
        };

        let stderr_tail = capture.finish(PIPE_DRAIN_WAIT).await;
        if !status.success() {
            return Err(DownloadError::Extraction(failure_message(
                status.code(),
                &stderr_tail,
            )));
        }

        let produced = output::select_output(session.path()).await?;
        if produced.size > self.config.max_file_size {
            return Err(DownloadError::TooLarge {
                size: produced.size,
                limit: self.config.max_file_size,
            });
        }

        let class = classify(&produced.name);
        let bytes = tokio::fs::read(&produced.path)
            .await
            .map_err(|e| DownloadError::filesystem(&produced.path, &e))?;

        Ok(DownloadedArtifact {
            bytes,
            mimetype: class.mimetype.to_string(),
            filename: produced.name,
            category: class.category,
        })
    }
}

/// Summarize a failed run, preferring the extractor's own error lines.
fn failure_message(code: Option<i32>, stderr_tail: &[String]) -> String {
    let errors: Vec<&str> = stderr_tail
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR"))
        .collect();

    let detail = if errors.is_empty() {
        stderr_tail
            .iter()
            .rev()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .map(str::to_string)
    } else {
        Some(errors.join("; "))
    };

    let status = code.map_or_else(
        || "extractor terminated by signal".to_string(),
        |c| format!("extractor exited with status {c}"),
    );

    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => status,
    }
}

#[async_trait]
impl MediaDownloaderPort for SessionManager {
    async fn download(&self, request: DownloadRequest) -> Result<DownloadedArtifact, DownloadError> {
        let started = Instant::now();
        info!(
            target: "mediafetch.session",
            url = %request.url(),
            format = request.format(),
            "Download requested"
        );

        let result = self.run(&request).await;
        match &result {
            Ok(artifact) => info!(
                target: "mediafetch.session",
                filename = %artifact.filename,
                bytes = artifact.bytes.len(),
                elapsed_ms = started.elapsed().as_millis(),
                "Download finished"
            ),
            Err(e) => warn!(
                target: "mediafetch.session",
                kind = e.kind(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis(),
                "Download failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_prefers_error_lines() {
        let tail = vec![
            "[youtube] abc: Downloading webpage".to_string(),
            "ERROR: [youtube] abc: Video unavailable".to_string(),
            "".to_string(),
        ];
        assert_eq!(
            failure_message(Some(1), &tail),
            "extractor exited with status 1: ERROR: [youtube] abc: Video unavailable"
        );
    }

    #[test]
    fn failure_message_falls_back_to_last_line() {
        let tail = vec!["first".to_string(), "  last  ".to_string(), " ".to_string()];
        assert_eq!(
            failure_message(Some(2), &tail),
            "extractor exited with status 2: last"
        );
    }

    #[test]
    fn failure_message_without_output() {
        assert_eq!(
            failure_message(None, &[]),
            "extractor terminated by signal"
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let provisioner: Arc<dyn BinaryProvisioner> =
            Arc::new(crate::StaticBinary::new("/usr/bin/yt-dlp"));
        let config = DownloaderConfig::with_defaults().with_max_concurrent(0);
        assert!(SessionManager::new(config, provisioner).is_err());
    }
}
