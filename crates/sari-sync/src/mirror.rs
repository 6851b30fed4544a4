//! # Remote Mirror
//!
//! Background task that copies the newest committed document to the remote
//! [`DocumentStore`].
//!
//! ## Debounced Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mirror Task                                      │
//! │                                                                         │
//! │  Store::commit ──update(doc)──► watch ─► pending = newest doc          │
//! │                                            deadline = now + debounce    │
//! │                                            (capped at first + max_delay)│
//! │                                                                         │
//! │  commit t=0ms    ─┐                                                     │
//! │  commit t=120ms  ─┼─ one put() of the t=300ms document at t=800ms      │
//! │  commit t=300ms  ─┘                                                     │
//! │                                                                         │
//! │  put() fails ──► retry with exponential backoff (max_attempts)         │
//! │              └─► still failing: warn!, keep doc pending,               │
//! │                  MirrorStatus.last_error = reason                       │
//! │                                                                         │
//! │  Flush    ──► write pending now, reply with the result                 │
//! │  Shutdown ──► write pending, stop                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents travel over a `watch` slot that only holds the newest one, so
//! a commit never waits on the task, even while it is backing off. Flush
//! and shutdown requests use a separate command channel.
//!
//! Remote failures never reach the committing caller as an error. The
//! store reads [`MirrorStatus`] and attaches a notice instead.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use sari_core::StoreDocument;

use crate::error::{StoreError, StoreResult};
use crate::local::LocalStore;
use crate::remote::DocumentStore;

// =============================================================================
// Settings & Status
// =============================================================================

/// Mirror timing.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// Quiet period after the last commit before writing.
    pub debounce: Duration,
    /// Longest a document may wait while commits keep arriving.
    pub max_delay: Duration,
    /// Attempts per write, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        MirrorSettings {
            debounce: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl MirrorSettings {
    pub fn with_debounce(debounce: Duration) -> Self {
        MirrorSettings {
            debounce,
            max_delay: (debounce * 10).max(debounce),
            ..Self::default()
        }
    }
}

/// Observable state of the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStatus {
    /// A committed document has not reached the remote store yet.
    pub pending: bool,
    /// Successful remote writes since start.
    pub writes: u64,
    pub last_success: Option<DateTime<Utc>>,
    /// Reason of the most recent failed write, cleared by the next success.
    pub last_error: Option<String>,
}

impl MirrorStatus {
    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}

// =============================================================================
// Handle
// =============================================================================

#[derive(Debug)]
enum MirrorCommand {
    Flush(oneshot::Sender<Result<(), String>>),
    Shutdown(oneshot::Sender<Result<(), String>>),
}

type DocumentSlot = Option<Arc<StoreDocument>>;

/// Handle for feeding and controlling the mirror task.
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    cmd_tx: mpsc::Sender<MirrorCommand>,
    doc_tx: Arc<watch::Sender<DocumentSlot>>,
    status_rx: watch::Receiver<MirrorStatus>,
}

impl MirrorHandle {
    /// Replaces the document waiting to be mirrored. Never blocks.
    pub fn update(&self, document: StoreDocument) -> StoreResult<()> {
        if self.cmd_tx.is_closed() {
            return Err(StoreError::MirrorStopped);
        }
        self.doc_tx.send_replace(Some(Arc::new(document)));
        Ok(())
    }

    /// Writes any pending document now.
    pub async fn flush(&self) -> StoreResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(MirrorCommand::Flush(reply_tx))
            .await
            .map_err(|_| StoreError::MirrorStopped)?;
        reply_rx
            .await
            .map_err(|_| StoreError::MirrorStopped)?
            .map_err(StoreError::Remote)
    }

    /// Writes any pending document and stops the task.
    pub async fn shutdown(&self) -> StoreResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(MirrorCommand::Shutdown(reply_tx))
            .await
            .map_err(|_| StoreError::MirrorStopped)?;
        reply_rx
            .await
            .map_err(|_| StoreError::MirrorStopped)?
            .map_err(StoreError::Remote)
    }

    pub fn status(&self) -> MirrorStatus {
        self.status_rx.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<MirrorStatus> {
        self.status_rx.clone()
    }
}

// =============================================================================
// Mirror Task
// =============================================================================

/// The mirror task. Consumed by [`Mirror::start`].
pub struct Mirror {
    remote: Arc<dyn DocumentStore>,
    local: Arc<dyn LocalStore>,
    tenant: String,
    settings: MirrorSettings,
    status_tx: watch::Sender<MirrorStatus>,
}

impl Mirror {
    pub fn new(
        remote: Arc<dyn DocumentStore>,
        local: Arc<dyn LocalStore>,
        tenant: impl Into<String>,
        settings: MirrorSettings,
    ) -> Self {
        let (status_tx, _) = watch::channel(MirrorStatus::default());
        Mirror {
            remote,
            local,
            tenant: tenant.into(),
            settings,
            status_tx,
        }
    }

    /// Spawns the task and returns its handle.
    pub fn start(self) -> MirrorHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (doc_tx, doc_rx) = watch::channel(None);
        let status_rx = self.status_tx.subscribe();

        tokio::spawn(async move {
            self.run(cmd_rx, doc_rx).await;
        });

        MirrorHandle {
            cmd_tx,
            doc_tx: Arc::new(doc_tx),
            status_rx,
        }
    }

    async fn run(
        self,
        mut cmd_rx: mpsc::Receiver<MirrorCommand>,
        mut doc_rx: watch::Receiver<DocumentSlot>,
    ) {
        info!(
            tenant = %self.tenant,
            debounce_ms = self.settings.debounce.as_millis() as u64,
            "Remote mirror started"
        );

        let mut pending: DocumentSlot = None;
        let mut deadline: Option<Instant> = None;
        let mut first_queued: Option<Instant> = None;

        loop {
            let wake = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                changed = doc_rx.changed() => {
                    if changed.is_err() {
                        // Every handle is gone; write what is left
                        let _ = self.write_pending(&mut pending).await;
                        break;
                    }
                    let latest = doc_rx.borrow_and_update().clone();
                    if self.absorb(latest, &mut pending) {
                        let now = Instant::now();
                        let first = *first_queued.get_or_insert(now);
                        deadline = Some(
                            (now + self.settings.debounce).min(first + self.settings.max_delay),
                        );
                    }
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(MirrorCommand::Flush(reply)) => {
                        self.take_latest(&mut doc_rx, &mut pending);
                        deadline = None;
                        first_queued = None;
                        let result = self.write_pending(&mut pending).await;
                        let _ = reply.send(result);
                    }
                    Some(MirrorCommand::Shutdown(reply)) => {
                        info!(tenant = %self.tenant, "Remote mirror shutting down");
                        cmd_rx.close();
                        self.take_latest(&mut doc_rx, &mut pending);
                        let result = self.write_pending(&mut pending).await;
                        let _ = reply.send(result);
                        break;
                    }
                    None => {
                        self.take_latest(&mut doc_rx, &mut pending);
                        let _ = self.write_pending(&mut pending).await;
                        break;
                    }
                },
                _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                    deadline = None;
                    first_queued = None;
                    let _ = self.write_pending(&mut pending).await;
                }
            }
        }

        info!(tenant = %self.tenant, "Remote mirror stopped");
    }

    /// Moves an unseen document from the slot into `pending`.
    fn take_latest(
        &self,
        doc_rx: &mut watch::Receiver<DocumentSlot>,
        pending: &mut DocumentSlot,
    ) -> bool {
        if !doc_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let latest = doc_rx.borrow_and_update().clone();
        self.absorb(latest, pending)
    }

    fn absorb(&self, latest: DocumentSlot, pending: &mut DocumentSlot) -> bool {
        match latest {
            Some(document) => {
                *pending = Some(document);
                self.status_tx.send_modify(|s| s.pending = true);
                true
            }
            None => false,
        }
    }

    /// Writes the pending document, keeping it pending on failure.
    async fn write_pending(&self, pending: &mut DocumentSlot) -> Result<(), String> {
        let Some(document) = pending.take() else {
            return Ok(());
        };

        match self.write(&document).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                *pending = Some(document);
                Err(reason)
            }
        }
    }

    async fn write(&self, document: &StoreDocument) -> Result<(), String> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.settings.initial_backoff,
            max_interval: self.settings.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();

        let mut attempt = 1;
        loop {
            match self.remote.put(&self.tenant, document).await {
                Ok(()) => {
                    let at = Utc::now();
                    if let Err(e) = self.local.mark_mirrored(at).await {
                        warn!(error = %e, "Failed to record mirror time locally");
                    }
                    self.status_tx.send_modify(|s| {
                        s.pending = false;
                        s.writes += 1;
                        s.last_success = Some(at);
                        s.last_error = None;
                    });
                    debug!(tenant = %self.tenant, attempt, "Remote mirror write complete");
                    return Ok(());
                }
                Err(e) if attempt < self.settings.max_attempts => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or(self.settings.max_backoff);
                    debug!(
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Remote mirror write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(
                        tenant = %self.tenant,
                        attempts = attempt,
                        error = %reason,
                        "Remote mirror write failed; changes are saved locally only"
                    );
                    self.status_tx
                        .send_modify(|s| s.last_error = Some(reason.clone()));
                    return Err(reason);
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryLocalStore;
    use crate::remote::MemoryDocumentStore;
    use sari_core::Settings;

    fn document(name: &str) -> StoreDocument {
        StoreDocument {
            settings: Settings {
                business_name: name.to_string(),
                ..Settings::default()
            },
            ..StoreDocument::default()
        }
    }

    fn start(
        remote: &Arc<MemoryDocumentStore>,
        local: &Arc<MemoryLocalStore>,
        settings: MirrorSettings,
    ) -> MirrorHandle {
        Mirror::new(remote.clone(), local.clone(), "tindahan", settings).start()
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_within_window_coalesce() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let mirror = start(&remote, &local, MirrorSettings::default());

        mirror.update(document("one")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        mirror.update(document("two")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        mirror.update(document("three")).unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(remote.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(remote.write_count(), 1);
        assert_eq!(
            remote.document("tindahan").unwrap().settings.business_name,
            "three"
        );
        assert!(!mirror.status().pending);
        assert!(local.last_mirrored().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_delay_bounds_a_busy_window() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let settings = MirrorSettings {
            debounce: Duration::from_millis(500),
            max_delay: Duration::from_millis(1000),
            ..MirrorSettings::default()
        };
        let mirror = start(&remote, &local, settings);

        // A commit every 300 ms never leaves a 500 ms gap
        for i in 0..5 {
            mirror.update(document(&format!("v{}", i))).unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        assert!(remote.write_count() >= 1);
    }

    #[tokio::test]
    async fn test_flush_writes_immediately() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let mirror = start(&remote, &local, MirrorSettings::with_debounce(Duration::from_secs(60)));

        mirror.update(document("now")).unwrap();
        mirror.flush().await.unwrap();

        assert_eq!(remote.write_count(), 1);
        assert_eq!(mirror.status().writes, 1);

        // Nothing pending: flush is a no-op
        mirror.flush().await.unwrap();
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_recorded_and_retried_on_flush() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let mirror = start(&remote, &local, MirrorSettings::default());

        remote.set_failing(true);
        mirror.update(document("offline")).unwrap();
        let err = mirror.flush().await.unwrap_err();
        assert!(err.is_remote());

        let status = mirror.status();
        assert!(status.pending);
        assert!(!status.is_healthy());
        assert!(local.last_mirrored().is_none());

        remote.set_failing(false);
        mirror.flush().await.unwrap();
        assert_eq!(remote.write_count(), 1);
        assert!(mirror.status().is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_never_wait_on_a_backing_off_task() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let settings = MirrorSettings {
            debounce: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            max_attempts: 5,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(30),
        };
        let mirror = start(&remote, &local, settings);

        remote.set_failing(true);
        mirror.update(document("first")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The task is asleep between retries; far more updates than any
        // channel capacity still return immediately
        for i in 0..500 {
            mirror.update(document(&format!("v{}", i))).unwrap();
        }

        remote.set_failing(false);
        tokio::time::sleep(Duration::from_secs(120)).await;
        mirror.flush().await.unwrap();

        assert_eq!(
            remote.document("tindahan").unwrap().settings.business_name,
            "v499"
        );
        assert!(!mirror.status().pending);
    }

    #[tokio::test]
    async fn test_shutdown_writes_pending_and_stops() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let mirror = start(&remote, &local, MirrorSettings::with_debounce(Duration::from_secs(60)));

        mirror.update(document("last")).unwrap();
        mirror.shutdown().await.unwrap();
        assert_eq!(remote.write_count(), 1);

        let err = mirror.update(document("late")).unwrap_err();
        assert!(matches!(err, StoreError::MirrorStopped));
    }
}
