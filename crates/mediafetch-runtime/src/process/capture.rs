//! Stdout/stderr capture for extractor runs.
//!
//! Both streams are drained concurrently (a full pipe would stall the
//! child) and logged at debug. The last lines of stderr are kept so a
//! failed run can report what the extractor said.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::debug;

/// Reader tasks attached to one child.
pub struct OutputCapture {
    stdout: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<Vec<String>>>,
}

/// Spawn background tasks draining the child's piped stdout and stderr.
///
/// Streams that were not piped are skipped. At most `tail_lines` stderr
/// lines are retained.
pub fn spawn_output_readers(child: &mut Child, session_id: &str, tail_lines: usize) -> OutputCapture {
    let session: Arc<str> = Arc::from(session_id);

    let stdout = child.stdout.take().map(|out| {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            drain(out, &session, "stdout", 0).await;
        })
    });

    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(async move { drain(err, &session, "stderr", tail_lines).await })
    });

    OutputCapture { stdout, stderr }
}

impl OutputCapture {
    /// Collect the retained stderr lines.
    ///
    /// Waits at most `wait` for the streams to close; a helper process that
    /// inherited the pipes must not hold the session open.
    pub async fn finish(self, wait: Duration) -> Vec<String> {
        let stderr = async {
            match self.stderr {
                Some(handle) => handle.await.unwrap_or_default(),
                None => Vec::new(),
            }
        };

        let lines = tokio::time::timeout(wait, stderr).await.unwrap_or_default();
        if let Some(handle) = self.stdout {
            handle.abort();
        }
        lines
    }
}

async fn drain<R>(stream: R, session: &str, stream_type: &str, keep: usize) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(keep);
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(text)) = lines.next_line().await {
        debug!(target: "mediafetch.session", session, stream = stream_type, "{}", text);
        if keep == 0 {
            continue;
        }
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(text);
    }
    tail.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn keeps_only_the_stderr_tail() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("for i in 1 2 3 4 5; do echo line$i >&2; done; echo out")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let capture = spawn_output_readers(&mut child, "test-session", 2);
        assert!(child.wait().await.unwrap().success());

        let tail = capture.finish(Duration::from_secs(5)).await;
        assert_eq!(tail, vec!["line4".to_string(), "line5".to_string()]);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn unpiped_streams_yield_nothing() {
        let mut child = Command::new("true").spawn().unwrap();
        let capture = spawn_output_readers(&mut child, "test-session", 10);
        child.wait().await.unwrap();
        assert!(capture.finish(Duration::from_secs(1)).await.is_empty());
    }
}
