//! Per-session working directories.
//!
//! A [`SessionDir`] owns its directory: `close()` removes it on the normal
//! path, and `Drop` removes it if the session future was cancelled or
//! returned early.

use mediafetch_core::DownloadError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix shared by every session directory name.
pub const SESSION_PREFIX: &str = "yt-dlp_";

/// Build a session id unique within `temp_dir`.
///
/// `yt-dlp_{pid}_{millis}_{counter}_{nonce}`. The pid names the owning
/// process for [`sweep_stale_sessions`]; the counter and random suffix keep
/// concurrent sessions in the same millisecond apart.
pub fn session_id(counter: u64) -> String {
    let pid = std::process::id();
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("{SESSION_PREFIX}{pid}_{millis}_{counter}_{}", &nonce[..8])
}

/// Pid of the process that created the session directory `name`.
fn owner_pid(name: &str) -> Option<u32> {
    name.strip_prefix(SESSION_PREFIX)?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Whether another live process owns directories named with `pid`.
#[cfg(unix)]
fn owned_by_other_process(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if pid == std::process::id() {
        return false;
    }
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(not(unix))]
fn owned_by_other_process(_pid: u32) -> bool {
    false
}

/// Working directory for one extractor run.
#[derive(Debug)]
pub struct SessionDir {
    id: String,
    path: PathBuf,
    closed: bool,
}

impl SessionDir {
    /// Create `temp_dir/id`, creating `temp_dir` too if needed.
    pub async fn create(temp_dir: &Path, id: String) -> Result<Self, DownloadError> {
        // Guard first, so a cancelled create still cleans up.
        let dir = Self {
            path: temp_dir.join(&id),
            id,
            closed: false,
        };
        tokio::fs::create_dir_all(&dir.path)
            .await
            .map_err(|e| DownloadError::filesystem(&dir.path, &e))?;
        debug!(target: "mediafetch.session", session = %dir.id, path = %dir.path.display(), "Created session directory");
        Ok(dir)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it.
    ///
    /// Removal failures are logged, never returned: the session result has
    /// already been decided by the time cleanup runs.
    pub async fn close(mut self) {
        self.closed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!(target: "mediafetch.session", session = %self.id, "Removed session directory");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    target: "mediafetch.session",
                    session = %self.id,
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove session directory"
                );
            }
        }
    }
}

impl Drop for SessionDir {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    target: "mediafetch.session",
                    session = %self.id,
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove abandoned session directory"
                );
            }
        }
    }
}

/// Remove session directories left behind by processes that have exited.
///
/// Only entries named with the session prefix are touched, and entries
/// whose owning pid is another running process are kept, so instances can
/// share one temp root. Directories carrying this process's own pid belong
/// to an earlier process that had the same pid: call this before the first
/// session starts. Returns the number of directories removed.
pub async fn sweep_stale_sessions(temp_dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(temp_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(target: "mediafetch.session", path = %temp_dir.display(), error = %e, "Cannot scan temp directory");
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(SESSION_PREFIX) {
            continue;
        }
        if owner_pid(&name).is_some_and(owned_by_other_process) {
            debug!(target: "mediafetch.session", name = %name, "Keeping session directory of a running process");
            continue;
        }
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        if !is_dir {
            continue;
        }
        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(
                target: "mediafetch.session",
                path = %entry.path().display(),
                error = %e,
                "Failed to remove stale session directory"
            ),
        }
    }

    if removed > 0 {
        debug!(target: "mediafetch.session", removed, "Swept stale session directories");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Above any kernel's pid_max, so never a running process.
    const DEAD_PID: u32 = 2_147_483_647;

    #[test]
    fn session_ids_are_prefixed_and_distinct() {
        let a = session_id(1);
        let b = session_id(1);
        assert!(a.starts_with(SESSION_PREFIX));
        assert_ne!(a, b);
    }

    #[test]
    fn session_ids_name_the_owning_process() {
        let id = session_id(7);
        assert_eq!(owner_pid(&id), Some(std::process::id()));
        assert_eq!(owner_pid("yt-dlp_notes"), None);
        assert_eq!(owner_pid("other_123_1"), None);
    }

    #[tokio::test]
    async fn close_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let dir = SessionDir::create(root.path(), session_id(0)).await.unwrap();
        std::fs::write(dir.path().join("download.mp4"), b"data").unwrap();
        let path = dir.path().to_path_buf();

        dir.close().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let dir = SessionDir::create(root.path(), session_id(0)).await.unwrap();
            std::fs::write(dir.path().join("download.mp4.part"), b"x").unwrap();
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn creates_missing_temp_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let dir = SessionDir::create(&nested, session_id(0)).await.unwrap();
        assert!(dir.path().is_dir());
        dir.close().await;
    }

    #[tokio::test]
    async fn sweep_only_touches_session_directories() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(format!("yt-dlp_{DEAD_PID}_1_0_abc"))).unwrap();
        std::fs::create_dir(root.path().join(format!("yt-dlp_{DEAD_PID}_2_0_def"))).unwrap();
        std::fs::create_dir(root.path().join("keep-me")).unwrap();
        std::fs::write(root.path().join("yt-dlp_notes.txt"), b"x").unwrap();

        assert_eq!(sweep_stale_sessions(root.path()).await, 2);
        assert!(root.path().join("keep-me").exists());
        assert!(root.path().join("yt-dlp_notes.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sweep_keeps_directories_of_running_processes() {
        let root = tempfile::tempdir().unwrap();
        let mut neighbour = std::process::Command::new("sleep").arg("30").spawn().unwrap();

        let live = root.path().join(format!("yt-dlp_{}_1_0_abc", neighbour.id()));
        let dead = root.path().join(format!("yt-dlp_{DEAD_PID}_1_0_abc"));
        let ours = root.path().join(format!("yt-dlp_{}_1_0_abc", std::process::id()));
        let unowned = root.path().join("yt-dlp_legacy");
        for dir in [&live, &dead, &ours, &unowned] {
            std::fs::create_dir(dir).unwrap();
        }

        let removed = sweep_stale_sessions(root.path()).await;
        neighbour.kill().unwrap();
        neighbour.wait().unwrap();

        assert_eq!(removed, 3);
        assert!(live.exists());
        assert!(!dead.exists());
        assert!(!ours.exists());
        assert!(!unowned.exists());
    }

    #[tokio::test]
    async fn sweep_of_missing_root_is_a_noop() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(sweep_stale_sessions(&root.path().join("absent")).await, 0);
    }
}
