//! Command channel between [`ClockHandle`] clients and the host loop.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{COMMAND_CAPACITY, ClockHost};
use crate::config::{ClockConfig, ClockPatch};
use crate::controller::ClockController;
use crate::error::{ClockError, Result};
use crate::render::Renderer;
use crate::scheduler::{Reconciliation, SchedulerSnapshot};
use crate::time::WallClock;

/// Request served by the host loop. Each carries its reply sender.
pub(crate) enum ClockCommand {
    Reconcile {
        patch: ClockPatch,
        reply: oneshot::Sender<Option<Reconciliation>>,
    },
    ReconcileJson {
        text: String,
        reply: oneshot::Sender<Result<Option<Reconciliation>>>,
    },
    ForceRedraw {
        reply: oneshot::Sender<bool>,
    },
    Configuration {
        reply: oneshot::Sender<ClockConfig>,
    },
    Snapshot {
        reply: oneshot::Sender<SchedulerSnapshot>,
    },
    Destroy {
        reply: oneshot::Sender<()>,
    },
}

/// Async client for a clock running on its own tokio task.
///
/// Cloneable; the task exits once it is cancelled or every clone is dropped.
/// Only the handle returned by [`spawn`](Self::spawn) can [`join`](Self::join).
#[derive(Debug)]
pub struct ClockHandle {
    request_tx: mpsc::Sender<ClockCommand>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Move `controller` onto a new tokio task and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R, C>(controller: ClockController<R, C>) -> Self
    where
        R: Renderer + 'static,
        C: WallClock + 'static,
    {
        Self::spawn_with_cancel(controller, CancellationToken::new())
    }

    /// Like [`spawn`](Self::spawn), stopping when `cancel` fires.
    pub fn spawn_with_cancel<R, C>(
        controller: ClockController<R, C>,
        cancel: CancellationToken,
    ) -> Self
    where
        R: Renderer + 'static,
        C: WallClock + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel(COMMAND_CAPACITY);
        let host = ClockHost::new(controller, request_rx, cancel.clone());
        let task = tokio::spawn(host.run());
        Self {
            request_tx,
            cancel,
            task: Some(task),
        }
    }

    /// Apply a partial configuration.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the host loop has stopped.
    pub async fn reconcile(&self, patch: ClockPatch) -> Result<Option<Reconciliation>> {
        self.request(|reply| ClockCommand::Reconcile { patch, reply }).await
    }

    /// Parse a JSON patch and apply it.
    ///
    /// # Errors
    ///
    /// [`ClockError::Config`] for malformed patches while the clock is
    /// alive, or [`ClockError::Channel`] when the host loop has stopped.
    /// After destroy the text is ignored and `Ok(None)` is returned.
    pub async fn reconcile_json(&self, text: &str) -> Result<Option<Reconciliation>> {
        let text = text.to_owned();
        self.request(|reply| ClockCommand::ReconcileJson { text, reply }).await?
    }

    /// Paint now without touching the pending timer. `false` after destroy.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the host loop has stopped.
    pub async fn force_redraw(&self) -> Result<bool> {
        self.request(|reply| ClockCommand::ForceRedraw { reply }).await
    }

    /// Current configuration.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the host loop has stopped.
    pub async fn configuration(&self) -> Result<ClockConfig> {
        self.request(|reply| ClockCommand::Configuration { reply }).await
    }

    /// Point-in-time scheduler state.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the host loop has stopped.
    pub async fn snapshot(&self) -> Result<SchedulerSnapshot> {
        self.request(|reply| ClockCommand::Snapshot { reply }).await
    }

    /// Destroy the clock. Idempotent; the loop keeps answering queries.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the host loop has stopped.
    pub async fn destroy(&self) -> Result<()> {
        self.request(|reply| ClockCommand::Destroy { reply }).await
    }

    /// Stop the host loop. The clock is destroyed on the way out.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drop this handle's sender and wait for the loop to exit.
    ///
    /// The loop exits once every clone is dropped or the token is cancelled.
    ///
    /// # Errors
    ///
    /// [`ClockError::Channel`] when the task panicked, or when called on a
    /// clone (which does not own the task).
    pub async fn join(self) -> Result<()> {
        let Self {
            request_tx, task, ..
        } = self;
        drop(request_tx);
        let task = task.ok_or_else(|| {
            ClockError::Channel("only the spawning handle can join the clock task".to_owned())
        })?;
        task.await
            .map_err(|e| ClockError::Channel(format!("clock host task failed: {e}")))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ClockCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send(command(reply_tx))
            .await
            .map_err(|e| ClockError::Channel(format!("failed to send clock command: {e}")))?;
        reply_rx
            .await
            .map_err(|e| ClockError::Channel(format!("clock command reply dropped: {e}")))
    }
}

impl Clone for ClockHandle {
    fn clone(&self) -> Self {
        Self {
            request_tx: self.request_tx.clone(),
            cancel: self.cancel.clone(),
            task: None,
        }
    }
}
