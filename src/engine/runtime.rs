// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{GanttError, Result};
use crate::persist::{PersistReport, WriterHandle};

use super::core::PlannerCore;
use super::{CoreCommand, Edit, Notification, RuntimeEvent};

/// Capacity of the runtime's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Drives the [`PlannerCore`] in response to `RuntimeEvent`s, and delegates
/// persistence to the background writer.
///
/// This is a pure IO shell around `PlannerCore`, which contains all the
/// planning semantics. This struct handles async IO: reading events from
/// channels, forwarding payloads and surfacing notifications.
pub struct Runtime {
    core: PlannerCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    writer: WriterHandle,
    notify_tx: Option<mpsc::Sender<Notification>>,
}

/// What is left once the runtime has stopped.
#[derive(Debug)]
pub struct RuntimeReport {
    /// Final controller state.
    pub core: PlannerCore,
    /// Final persistence counters.
    pub persist: PersistReport,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: PlannerCore,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        writer: WriterHandle,
        notify_tx: Option<mpsc::Sender<Notification>>,
    ) -> Self {
        Self {
            core,
            event_rx,
            writer,
            notify_tx,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core.
    /// - Executes commands returned by the core (persist, notify).
    ///
    /// Stops on `ShutdownRequested` or when every event sender is gone, then
    /// drains the writer.
    pub async fn run(mut self) -> Result<RuntimeReport> {
        info!("ganttdag runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        let persist = self.writer.shutdown().await?;
        info!(writes = persist.writes, mode = ?persist.mode, "runtime exiting");
        Ok(RuntimeReport {
            core: self.core,
            persist,
        })
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Persist(payload) => {
                self.writer.submit(payload).await?;
            }
            CoreCommand::Notify(notification) => {
                match &self.notify_tx {
                    Some(tx) => {
                        if tx.send(notification).await.is_err() {
                            warn!("notification receiver dropped");
                        }
                    }
                    None => debug!(message = %notification.message, "notification (no listener)"),
                }
            }
        }
        Ok(())
    }
}

/// Apply a batch of edits through a freshly spawned runtime, then shut it
/// down and return its report.
///
/// The runtime is running before the first edit is sent, so batches larger
/// than the channel capacity drain instead of blocking.
pub async fn run_batch(
    core: PlannerCore,
    writer: WriterHandle,
    notify_tx: Option<mpsc::Sender<Notification>>,
    edits: Vec<Edit>,
) -> Result<RuntimeReport> {
    let (event_tx, event_rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);
    let handle = tokio::spawn(Runtime::new(core, event_rx, writer, notify_tx).run());

    let count = edits.len();
    for edit in edits {
        if event_tx.send(RuntimeEvent::Edit(edit)).await.is_err() {
            warn!("runtime stopped before the batch was fully sent");
            break;
        }
    }
    let _ = event_tx.send(RuntimeEvent::ShutdownRequested).await;
    debug!(edits = count, "batch sent");

    handle
        .await
        .map_err(|e| GanttError::Other(anyhow::Error::new(e)))?
}
