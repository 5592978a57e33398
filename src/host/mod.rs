//! Tokio host loop for a [`ClockController`].
//!
//! [`ClockHandle::spawn`] moves a controller into a background task that
//! sleeps until the pending timer's deadline, follows the controller's
//! visibility subscription and serves commands from any number of
//! [`ClockHandle`] clones. The task owns the controller, so every event for
//! one clock is handled strictly one at a time.
//!
//! ```rust,ignore
//! let handle = ClockHandle::spawn(controller);
//! handle.reconcile(ClockPatch::display_mode(DisplayMode::WithSeconds)).await?;
//! handle.destroy().await?;
//! handle.join().await?;
//! ```

pub mod channel;

pub use channel::ClockHandle;

use std::future::pending;
use tokio::sync::mpsc;
use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::ClockController;
use crate::render::Renderer;
use crate::scheduler::{HostVisibility, PendingTimer, VisibilitySubscription};
use crate::time::WallClock;
use channel::ClockCommand;

/// Default capacity of the command queue.
pub const COMMAND_CAPACITY: usize = 16;

/// Server side of a [`ClockHandle`]: owns the controller and runs the loop.
pub(crate) struct ClockHost<R: Renderer, C: WallClock> {
    controller: ClockController<R, C>,
    request_rx: mpsc::Receiver<ClockCommand>,
    visibility: Option<VisibilitySubscription>,
    cancel: CancellationToken,
}

impl<R: Renderer, C: WallClock> ClockHost<R, C> {
    pub(crate) fn new(
        controller: ClockController<R, C>,
        request_rx: mpsc::Receiver<ClockCommand>,
        cancel: CancellationToken,
    ) -> Self {
        let visibility = controller.visibility_events();
        Self {
            controller,
            request_rx,
            visibility,
            cancel,
        }
    }

    /// Run until cancelled or every handle is dropped.
    ///
    /// After the controller is destroyed the loop keeps answering queries
    /// (configuration, snapshot) so late callers see a consistent state.
    pub(crate) async fn run(mut self) {
        info!(
            visible = self.controller.is_visible(),
            mode = %self.controller.configuration().display_mode,
            "clock host loop started"
        );

        loop {
            let timer = self.controller.pending_timer();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("clock host loop cancelled");
                    break;
                }
                signal = next_visibility(&mut self.visibility) => match signal {
                    Some(signal) => {
                        debug!(?signal, "host visibility changed");
                        self.controller.on_visibility_changed(signal);
                    }
                    None => {
                        debug!("visibility source closed; keeping last state");
                        self.visibility = None;
                    }
                },
                fired = wait_for(timer) => {
                    self.controller.on_timer_fired(fired.id);
                }
                command = self.request_rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        info!("all clock handles dropped");
                        break;
                    }
                },
            }

            if self.controller.is_destroyed() {
                self.visibility = None;
            }
        }

        self.controller.destroy();
    }

    fn handle(&mut self, command: ClockCommand) {
        match command {
            ClockCommand::Reconcile { patch, reply } => {
                let _ = reply.send(self.controller.reconcile(&patch));
            }
            ClockCommand::ReconcileJson { text, reply } => {
                let _ = reply.send(self.controller.reconcile_json(&text));
            }
            ClockCommand::ForceRedraw { reply } => {
                let _ = reply.send(self.controller.force_redraw());
            }
            ClockCommand::Configuration { reply } => {
                let _ = reply.send(self.controller.configuration().clone());
            }
            ClockCommand::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            ClockCommand::Destroy { reply } => {
                self.controller.destroy();
                let _ = reply.send(());
            }
        }
    }
}

/// Resolve at the timer's deadline; never resolve when nothing is armed.
async fn wait_for(timer: Option<PendingTimer>) -> PendingTimer {
    match timer {
        Some(timer) => {
            sleep_until(timer.deadline).await;
            timer
        }
        None => pending().await,
    }
}

/// Next visibility change. `None` once the source closes; never resolves
/// without a subscription.
async fn next_visibility(
    subscription: &mut Option<VisibilitySubscription>,
) -> Option<HostVisibility> {
    match subscription {
        Some(subscription) => subscription.changed().await,
        None => pending().await,
    }
}
