//! Process-group ownership for extractor runs.

#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tracing::{debug, warn};

/// SIGKILLs a child's whole process group when dropped.
///
/// The child must have been spawned as a group leader (`process_group(0)`).
/// Dropping the guard then takes down every helper the child forked, even
/// when the child itself has already exited or was killed on its own.
#[derive(Debug)]
pub struct ProcessGroupGuard {
    #[cfg(unix)]
    pgid: Option<Pid>,
}

impl ProcessGroupGuard {
    /// Guard the group led by `leader` (a child pid, `None` once reaped).
    pub fn new(leader: Option<u32>) -> Self {
        #[cfg(unix)]
        {
            Self {
                pgid: leader
                    .and_then(|pid| i32::try_from(pid).ok())
                    .map(Pid::from_raw),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = leader;
            Self {}
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.take() {
            match killpg(pgid, Signal::SIGKILL) {
                Ok(()) => {
                    debug!(target: "mediafetch.session", pgid = pgid.as_raw(), "Killed extractor process group");
                }
                Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => {
                    warn!(target: "mediafetch.session", pgid = pgid.as_raw(), error = %e, "Failed to kill extractor process group");
                }
            }
        }
    }
}
