//! Clock controller facade.
//!
//! [`ClockController`] is what a host embeds: construct it with a mount
//! point, an initial configuration, a renderer and a visibility source, then
//! feed it timer fires and visibility changes (or let [`crate::host`] do so).
//! Every method is a silent no-op after [`destroy`](ClockController::destroy).

use tracing::{info, warn};

use crate::config::{ClockConfig, ClockPatch};
use crate::error::Result;
use crate::render::{MountPoint, Renderer};
use crate::scheduler::runner::PaintOutcome;
use crate::scheduler::{
    ClockScheduler, GateTransition, HostVisibility, PendingTimer, Reconciliation,
    SchedulerSnapshot, TimerId, VisibilityGate, VisibilitySource, VisibilitySubscription,
};
use crate::time::WallClock;

/// Public lifecycle API for one analog clock.
pub struct ClockController<R: Renderer, C: WallClock> {
    scheduler: ClockScheduler<R, C>,
    mount: Option<MountPoint>,
}

impl<R: Renderer, C: WallClock> ClockController<R, C> {
    /// Mount the clock and start ticking.
    ///
    /// Subscribes to `visibility` first. When visible, the current time is
    /// painted once and the first boundary timer is armed; when hidden,
    /// nothing is painted or armed until the host reports visible.
    ///
    /// # Errors
    ///
    /// - [`ClockError::Visibility`](crate::ClockError::Visibility) when the
    ///   visibility source cannot be subscribed to.
    /// - [`ClockError::Render`](crate::ClockError::Render) when the renderer
    ///   cannot mount.
    pub fn new<V: VisibilitySource + ?Sized>(
        mount: MountPoint,
        config: ClockConfig,
        mut renderer: R,
        visibility: &V,
        clock: C,
    ) -> Result<Self> {
        let gate = VisibilityGate::open(visibility)?;
        renderer.mount(&mount, &config)?;
        info!(
            mount = %mount,
            mode = %config.display_mode,
            visible = gate.is_visible(),
            "clock mounted"
        );

        let mut controller = Self {
            scheduler: ClockScheduler::new(renderer, clock, config, gate),
            mount: Some(mount),
        };
        if controller.scheduler.is_visible() {
            if controller.scheduler.paint() == PaintOutcome::Detached {
                controller.destroy();
            } else {
                controller.scheduler.arm();
            }
        }
        Ok(controller)
    }

    /// Apply a typed partial configuration.
    ///
    /// Returns the rebuild/patch decision, or `None` after destroy.
    pub fn reconcile(&mut self, patch: &ClockPatch) -> Option<Reconciliation> {
        self.scheduler.reconcile(patch)
    }

    /// Parse a JSON patch and apply it.
    ///
    /// # Errors
    ///
    /// Malformed patches return [`ClockError::Config`](crate::ClockError::Config)
    /// and leave the configuration and pending timer untouched. After
    /// destroy the text is not parsed and `Ok(None)` is returned.
    pub fn reconcile_json(&mut self, text: &str) -> Result<Option<Reconciliation>> {
        if self.is_destroyed() {
            return Ok(None);
        }
        let patch = ClockPatch::from_json(text).inspect_err(|e| {
            warn!(error = %e, "rejected clock configuration patch");
        })?;
        Ok(self.reconcile(&patch))
    }

    /// Parse a TOML patch and apply it.
    ///
    /// # Errors
    ///
    /// Same contract as [`reconcile_json`](Self::reconcile_json).
    pub fn reconcile_toml(&mut self, text: &str) -> Result<Option<Reconciliation>> {
        if self.is_destroyed() {
            return Ok(None);
        }
        let patch = ClockPatch::from_toml(text).inspect_err(|e| {
            warn!(error = %e, "rejected clock configuration patch");
        })?;
        Ok(self.reconcile(&patch))
    }

    /// Paint the current time now without touching the pending timer.
    ///
    /// Returns `false` after destroy.
    pub fn force_redraw(&mut self) -> bool {
        if self.scheduler.is_destroyed() {
            return false;
        }
        if self.scheduler.paint() == PaintOutcome::Detached {
            self.destroy();
        }
        true
    }

    /// Read-only view of the current configuration.
    pub fn configuration(&self) -> &ClockConfig {
        self.scheduler.config()
    }

    /// Disarm, unsubscribe from visibility and release the mount point.
    ///
    /// Safe to call any number of times.
    pub fn destroy(&mut self) {
        if let Some(mount) = self.mount.take() {
            info!(mount = %mount, "destroying clock");
        }
        self.scheduler.shutdown();
    }

    /// Host hook: the pending timer's deadline has passed.
    pub fn on_timer_fired(&mut self, id: TimerId) -> bool {
        let fired = self.scheduler.on_timer_fired(id);
        self.release_mount_if_destroyed();
        fired
    }

    /// Host hook: the visibility signal changed.
    pub fn on_visibility_changed(&mut self, signal: HostVisibility) -> Option<GateTransition> {
        let transition = self.scheduler.on_visibility_changed(signal);
        self.release_mount_if_destroyed();
        transition
    }

    /// Re-arm for the next boundary (no-op when hidden or destroyed).
    pub fn arm(&mut self) {
        self.scheduler.arm();
    }

    /// Cancel the pending timer. Returns `true` if one was pending.
    pub fn disarm(&mut self) -> bool {
        self.scheduler.disarm()
    }

    /// The pending timer, if any.
    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.scheduler.pending_timer()
    }

    /// Number of pending timers: 0 or 1.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Host-observed visibility.
    pub fn is_visible(&self) -> bool {
        self.scheduler.is_visible()
    }

    /// Whether the clock has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.scheduler.is_destroyed()
    }

    /// Mount point, until destroy.
    pub fn mount_point(&self) -> Option<&MountPoint> {
        self.mount.as_ref()
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        self.scheduler.renderer()
    }

    /// Point-in-time state view.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.scheduler.snapshot()
    }

    /// Live visibility feed for a host loop, until destroy.
    pub fn visibility_events(&self) -> Option<VisibilitySubscription> {
        self.scheduler.visibility_subscription()
    }

    fn release_mount_if_destroyed(&mut self) {
        if self.scheduler.is_destroyed() {
            self.mount = None;
        }
    }
}

impl<R: Renderer, C: WallClock> Drop for ClockController<R, C> {
    fn drop(&mut self) {
        self.destroy();
    }
}
