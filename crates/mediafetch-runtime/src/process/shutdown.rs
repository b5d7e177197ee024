//! Shutdown for `tokio::process::Child` with SIGTERM → SIGKILL escalation.
//!
//! Extractor children run in their own process group (the extractor may
//! spawn helpers such as ffmpeg), so the signal goes to the whole group when
//! one exists and to the single pid otherwise.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Shut down a child process and reap it.
///
/// # Strategy
/// 1. Send SIGTERM (to the process group if the child leads one)
/// 2. Wait up to `grace` for exit
/// 3. Send SIGKILL and reap
///
/// On non-unix platforms the child is killed immediately.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    // No pid means the child was already reaped.
    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;
    let pid = Pid::from_raw(pid);

    // Phase 1: SIGTERM
    let sent = match signal::killpg(pid, Signal::SIGTERM) {
        Err(nix::errno::Errno::ESRCH) => signal::kill(pid, Signal::SIGTERM),
        other => other,
    };
    if let Err(e) = sent {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    // Phase 2: SIGKILL. Helpers in the group go first, then the leader via
    // Child::kill, which also reaps it.
    let _ = signal::killpg(pid, Signal::SIGKILL);
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_responds_to_sigterm() {
        let mut child = Command::new("sleep")
            .arg("30")
            .process_group(0)
            .spawn()
            .expect("failed to spawn sleep");

        let started = Instant::now();
        let status = shutdown_child(&mut child, Duration::from_secs(5)).await;
        assert!(status.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_escalates_when_sigterm_is_ignored() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30")
            .spawn()
            .expect("failed to spawn sh");

        // Let the shell install its trap.
        sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let status = shutdown_child(&mut child, Duration::from_millis(300))
            .await
            .unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn shutdown_handles_already_exited() {
        let mut child = Command::new("echo")
            .arg("test")
            .spawn()
            .expect("failed to spawn echo");

        sleep(Duration::from_millis(100)).await;

        let result = shutdown_child(&mut child, DEFAULT_GRACE_PERIOD).await;
        assert!(result.is_ok());
    }
}
