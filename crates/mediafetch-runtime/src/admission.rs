//! Admission gate bounding concurrent download sessions.
//!
//! A counting semaphore with `max_concurrent` permits. Requests that cannot
//! take a permit immediately join a bounded wait queue; a full queue or an
//! expired wait yields [`DownloadError::TooBusy`]. Permits are RAII guards,
//! so every exit path of a session (including cancellation) releases them.

use mediafetch_core::{DownloadError, DownloaderConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::debug;

/// Concurrency limiter for download sessions.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    waiting: AtomicUsize,
    queue_capacity: usize,
    queue_timeout: Duration,
}

/// Held for the lifetime of one session.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

/// Decrements the waiter count when a queued request leaves the queue.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AdmissionGate {
    pub fn new(max_concurrent: usize, queue_capacity: usize, queue_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            waiting: AtomicUsize::new(0),
            queue_capacity,
            queue_timeout,
        }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(
            config.max_concurrent,
            config.queue_capacity,
            config.queue_timeout,
        )
    }

    /// Take a permit, waiting in the queue if necessary.
    pub async fn admit(&self) -> Result<AdmissionPermit, DownloadError> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Ok(AdmissionPermit { _permit: permit });
        }

        if self.queue_timeout.is_zero() {
            return Err(DownloadError::TooBusy);
        }

        let position = self.waiting.fetch_add(1, Ordering::AcqRel);
        let _slot = QueueSlot(&self.waiting);
        if position >= self.queue_capacity {
            debug!(
                target: "mediafetch.session",
                waiting = position,
                capacity = self.queue_capacity,
                "Admission queue full"
            );
            return Err(DownloadError::TooBusy);
        }

        match timeout(self.queue_timeout, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(AdmissionPermit { _permit: permit }),
            // Closed semaphore or expired wait
            Ok(Err(_)) | Err(_) => {
                debug!(
                    target: "mediafetch.session",
                    timeout_ms = self.queue_timeout.as_millis(),
                    "Gave up waiting for an admission permit"
                );
                Err(DownloadError::TooBusy)
            }
        }
    }

    /// Sessions currently holding a permit.
    pub fn active(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.permits.available_permits())
    }

    /// Requests currently queued for a permit.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }
}
