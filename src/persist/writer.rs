// src/persist/writer.rs

//! Debounced background writer.
//!
//! Payloads are coalesced until the channel has been quiet for the debounce
//! window; only the newest one is written. A payload whose digest equals the
//! last one written is skipped. The first failed write switches the writer
//! to [`PersistenceMode::None`] and emits a single error notification;
//! edits are never blocked or rolled back by persistence.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

use crate::engine::Notification;
use crate::errors::{GanttError, Result};
use crate::persist::payload_digest;
use crate::persist::store::SnapshotStore;
use crate::types::PersistenceMode;

/// Default quiet window before a payload is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Counters describing what the writer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    /// Mode in effect (degrades to `None` after a failure).
    pub mode: PersistenceMode,
    /// Payloads actually written to the store.
    pub writes: usize,
    /// Payloads replaced by a newer one before they were written.
    pub coalesced: usize,
    /// Payloads not written because they were unchanged or persistence was
    /// off.
    pub skipped: usize,
    pub failures: usize,
}

impl PersistReport {
    fn new(mode: PersistenceMode) -> Self {
        Self {
            mode,
            writes: 0,
            coalesced: 0,
            skipped: 0,
            failures: 0,
        }
    }
}

enum WriterMessage {
    Payload(String),
    Flush(oneshot::Sender<PersistReport>),
}

/// Handle to the background writer task.
#[derive(Debug)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterMessage>,
    join: JoinHandle<PersistReport>,
}

impl std::fmt::Debug for WriterMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterMessage::Payload(p) => write!(f, "Payload({} bytes)", p.len()),
            WriterMessage::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl WriterHandle {
    /// Queue a payload. It is written once the debounce window passes
    /// without a newer payload.
    pub async fn submit(&self, payload: String) -> Result<()> {
        self.tx
            .send(WriterMessage::Payload(payload))
            .await
            .map_err(|_| GanttError::Persistence("writer has stopped".to_string()))
    }

    /// Write any pending payload now and return the counters so far.
    pub async fn flush(&self) -> Result<PersistReport> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriterMessage::Flush(ack_tx))
            .await
            .map_err(|_| GanttError::Persistence("writer has stopped".to_string()))?;
        ack_rx
            .await
            .map_err(|_| GanttError::Persistence("writer dropped flush request".to_string()))
    }

    /// Write any pending payload, stop the writer and return its final
    /// counters.
    pub async fn shutdown(self) -> Result<PersistReport> {
        drop(self.tx);
        self.join
            .await
            .map_err(|e| GanttError::Persistence(format!("writer task failed: {e}")))
    }
}

/// Spawn the background writer.
///
/// `notify_tx` receives the one-off notification emitted when a write fails.
pub fn spawn_writer(
    store: Box<dyn SnapshotStore>,
    debounce: Duration,
    notify_tx: Option<mpsc::Sender<Notification>>,
) -> WriterHandle {
    let (tx, rx) = mpsc::channel::<WriterMessage>(64);
    let join = tokio::spawn(writer_loop(store, debounce, notify_tx, rx));
    WriterHandle { tx, join }
}

struct Writer {
    store: Box<dyn SnapshotStore>,
    notify_tx: Option<mpsc::Sender<Notification>>,
    last_digest: Option<String>,
    report: PersistReport,
}

async fn writer_loop(
    store: Box<dyn SnapshotStore>,
    debounce: Duration,
    notify_tx: Option<mpsc::Sender<Notification>>,
    mut rx: mpsc::Receiver<WriterMessage>,
) -> PersistReport {
    let mode = store.mode();
    info!(?mode, debounce_ms = debounce.as_millis() as u64, "persistence writer started");

    let mut writer = Writer {
        store,
        notify_tx,
        last_digest: None,
        report: PersistReport::new(mode),
    };
    let mut pending: Option<String> = None;

    loop {
        let message = if pending.is_some() {
            match timeout(debounce, rx.recv()).await {
                Ok(message) => message,
                Err(_quiet) => {
                    if let Some(payload) = pending.take() {
                        writer.write(&payload).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match message {
            Some(WriterMessage::Payload(payload)) => {
                if pending.replace(payload).is_some() {
                    writer.report.coalesced += 1;
                    trace!("pending payload superseded");
                }
            }
            Some(WriterMessage::Flush(ack)) => {
                if let Some(payload) = pending.take() {
                    writer.write(&payload).await;
                }
                let _ = ack.send(writer.report);
            }
            None => {
                if let Some(payload) = pending.take() {
                    writer.write(&payload).await;
                }
                break;
            }
        }
    }

    info!(
        writes = writer.report.writes,
        skipped = writer.report.skipped,
        failures = writer.report.failures,
        "persistence writer finished"
    );
    writer.report
}

impl Writer {
    async fn write(&mut self, payload: &str) {
        if self.report.mode == PersistenceMode::None {
            self.report.skipped += 1;
            return;
        }

        let digest = payload_digest(payload);
        if self.last_digest.as_deref() == Some(digest.as_str()) {
            debug!("payload unchanged since last write; skipping");
            self.report.skipped += 1;
            return;
        }

        match self.store.save(payload) {
            Ok(()) => {
                self.report.writes += 1;
                self.last_digest = Some(digest);
            }
            Err(e) => {
                self.report.failures += 1;
                self.report.mode = PersistenceMode::None;
                error!(error = %e, "saving project failed; persistence disabled");
                if let Some(tx) = &self.notify_tx {
                    let _ = tx
                        .send(Notification::error(
                            "could not save the project; persistence is now off, export to JSON to keep your work",
                        ))
                        .await;
                }
            }
        }
    }
}
