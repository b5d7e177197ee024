//! Fake extractors and helpers for session tests.
//!
//! Each fake is a small shell script receiving the same argv the real
//! extractor would: `--max-filesize N --no-playlist -o <template> -f <fmt> -- <url>`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mediafetch_core::{BinaryProvisioner, DownloaderConfig};
use mediafetch_runtime::{SessionManager, StaticBinary};
use tempfile::TempDir;

/// Writes `download.<ext>` next to the `-o` template (argv position 5).
pub fn write_output(ext: &str, contents: &str) -> String {
    format!(
        "out=\"$(dirname \"$5\")/download.{ext}\"\nprintf '%s' '{contents}' > \"$out\"\n"
    )
}

/// Whether `pid` is a live, non-zombie process.
///
/// Killed helpers are orphans reaped by init, so they can linger as zombies.
pub fn is_running(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if kill(Pid::from_raw(pid), None).is_err() {
        return false;
    }
    std::fs::read_to_string(format!("/proc/{pid}/stat")).map_or(true, |stat| {
        stat.rsplit_once(')')
            .is_none_or(|(_, rest)| !rest.trim_start().starts_with('Z'))
    })
}

/// Poll until `pid` is gone or `limit` passes; returns whether it is gone.
pub async fn wait_until_gone(pid: i32, limit: Duration) -> bool {
    let deadline = std::time::Instant::now() + limit;
    while is_running(pid) {
        if std::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}

/// Create an executable script named `name` in `dir`.
pub fn fake_extractor(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Scratch layout for one test: a temp root for sessions and a bin dir.
pub struct Sandbox {
    pub root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("bin")).unwrap();
        std::fs::create_dir(root.path().join("sessions")).unwrap();
        Self { root }
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.path().join("sessions")
    }

    pub fn extractor(&self, body: &str) -> PathBuf {
        fake_extractor(&self.bin_dir(), "yt-dlp", body)
    }

    pub fn config(&self) -> DownloaderConfig {
        DownloaderConfig::with_defaults()
            .with_temp_dir(self.temp_dir())
            .with_bin_dir(self.bin_dir())
            .with_session_timeout(Duration::from_secs(20))
            .with_queue(8, Duration::from_secs(20))
    }

    /// Manager running the script at `binary`.
    pub fn manager(&self, binary: &Path, config: DownloaderConfig) -> SessionManager {
        let provisioner: Arc<dyn BinaryProvisioner> = Arc::new(StaticBinary::new(binary));
        SessionManager::new(config, provisioner).unwrap()
    }

    /// Session directories still present under the temp root.
    pub fn leftover_sessions(&self) -> Vec<String> {
        std::fs::read_dir(self.temp_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
