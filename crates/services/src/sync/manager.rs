use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use quiz_core::model::MistakeRecord;
use storage::LocalState;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::SyncConfig;
use super::queue::MistakeQueue;
use crate::error::SyncError;
use crate::remote::RemoteStore;

/// Result of a single flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued.
    Empty,
    /// The remote store accepted this many records.
    Delivered(usize),
    /// The write failed; the queue is untouched and a retry is scheduled.
    Deferred,
}

struct Inner {
    queue: MistakeQueue,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    timer: Mutex<Option<JoinHandle<()>>>,
    flushing: tokio::sync::Mutex<()>,
}

/// Batches mistake records and delivers them to the remote store.
///
/// Construct with [`MistakeSyncManager::start`], which drains records left
/// over from a previous run. Call [`MistakeSyncManager::shutdown`] to cancel
/// the pending retry timer. Clones share one queue and one timer.
#[derive(Clone)]
pub struct MistakeSyncManager {
    inner: Arc<Inner>,
}

impl MistakeSyncManager {
    #[must_use]
    pub fn new(local: LocalState, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: MistakeQueue::new(local),
                remote,
                config,
                timer: Mutex::new(None),
                flushing: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Build the manager and schedule a background flush of leftover records.
    ///
    /// Returns without waiting for the remote store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the local queue cannot be read.
    pub async fn start(
        local: LocalState,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let manager = Self::new(local, remote, config);
        let leftover = manager.pending().await?;
        if leftover > 0 {
            debug!(leftover, "draining mistakes from a previous run");
            manager.inner.flush_now();
        }
        Ok(manager)
    }

    #[must_use]
    pub fn config(&self) -> SyncConfig {
        self.inner.config
    }

    /// Queue a record. Reaching the batch size starts a flush in the
    /// background; otherwise a deferred flush is armed if none is pending.
    /// Never waits for the remote store.
    ///
    /// Returns the queue length after the append.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the queue cannot be written.
    pub async fn enqueue(&self, record: MistakeRecord) -> Result<usize, SyncError> {
        let len = self.inner.queue.push(record).await?;
        debug!(pending = len, "mistake queued");
        if len >= self.inner.config.batch_size {
            self.inner.flush_now();
        } else {
            self.inner.arm_timer();
        }
        Ok(len)
    }

    /// Send every queued record in one bulk write.
    ///
    /// Flushes are serialized; a call made while another is in flight waits
    /// for it and then sends whatever is still queued.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` on local storage failures. Remote failures
    /// are reported as `FlushOutcome::Deferred`.
    pub async fn flush(&self) -> Result<FlushOutcome, SyncError> {
        self.inner.flush().await
    }

    /// Number of records waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the queue cannot be read.
    pub async fn pending(&self) -> Result<usize, SyncError> {
        Ok(self.inner.queue.snapshot().await?.len())
    }

    #[must_use]
    pub fn timer_armed(&self) -> bool {
        self.inner
            .timer_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the pending deferred flush. Queued records stay persisted.
    pub fn shutdown(&self) {
        self.inner.cancel_timer();
        debug!("mistake sync stopped");
    }
}

impl Inner {
    fn timer_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(&self) {
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
        }
    }

    /// Arm the deferred flush unless one is already pending.
    fn arm_timer(self: &Arc<Self>) {
        self.schedule(self.config.interval, false);
    }

    /// Replace any pending flush with one that runs as soon as the runtime allows.
    fn flush_now(self: &Arc<Self>) {
        self.schedule(Duration::ZERO, true);
    }

    fn schedule(self: &Arc<Self>, delay: Duration, replace: bool) {
        let mut slot = self.timer_slot();
        if let Some(pending) = slot.as_ref().filter(|handle| !handle.is_finished()) {
            if !replace {
                return;
            }
            pending.abort();
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Detach this task's own handle so the flush does not abort it.
            drop(inner.timer_slot().take());
            if let Err(err) = inner.flush().await {
                warn!(error = %err, "background mistake flush failed");
            }
        }));
        debug!(delay_secs = delay.as_secs(), "mistake flush scheduled");
    }

    async fn flush(self: &Arc<Self>) -> Result<FlushOutcome, SyncError> {
        let _in_flight = self.flushing.lock().await;

        let batch = self.queue.snapshot().await?;
        if batch.is_empty() {
            return Ok(FlushOutcome::Empty);
        }
        self.cancel_timer();

        info!(count = batch.len(), "syncing mistakes");
        match self.remote.insert_mistakes(&batch).await {
            Ok(()) => {
                let remaining = self.queue.remove_delivered(&batch).await?;
                info!(delivered = batch.len(), remaining, "mistake sync succeeded");
                if remaining > 0 {
                    self.arm_timer();
                }
                Ok(FlushOutcome::Delivered(batch.len()))
            }
            Err(err) => {
                warn!(error = %err, pending = batch.len(), "mistake sync failed; will retry");
                self.arm_timer();
                Ok(FlushOutcome::Deferred)
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
