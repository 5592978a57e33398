//! Redraw scheduling loop.
//!
//! [`ClockScheduler`] keeps at most one pending one-shot timer. When the
//! timer fires it paints once and re-arms from the *current* time, giving an
//! unbounded chain of one-shot timers instead of a fixed interval. Every tick
//! re-validates wall-clock alignment, so clock adjustments, sleep/wake and
//! event-loop jitter never accumulate.
//!
//! The scheduler only *records* the pending deadline; the host loop
//! ([`crate::host`]) or a test drives it by calling
//! [`on_timer_fired`](ClockScheduler::on_timer_fired) when the deadline passes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ClockConfig, DisplayMode};
use crate::render::{RenderError, Renderer, isolate};
use crate::scheduler::boundary::next_boundary;
use crate::scheduler::visibility::{VisibilityGate, VisibilitySubscription};
use crate::time::WallClock;

/// Identity of one armed timer. A fire carrying a stale id is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// The single outstanding redraw timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    /// Timer identity.
    pub id: TimerId,
    /// Monotonic instant at which the timer should fire.
    pub deadline: Instant,
    /// Wall boundary the redraw is aligned to.
    pub boundary: NaiveDateTime,
    /// Delay computed when the timer was armed.
    pub delay: Duration,
}

/// Point-in-time view of scheduler state for hosts and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Host-observed visibility.
    pub visible: bool,
    /// Whether a timer is pending.
    pub armed: bool,
    /// Whether the scheduler has been destroyed.
    pub destroyed: bool,
    /// Active display mode.
    pub display_mode: DisplayMode,
    /// Boundary the last fired timer was aligned to.
    pub last_boundary: Option<NaiveDateTime>,
    /// Boundary of the pending timer.
    pub next_boundary: Option<NaiveDateTime>,
    /// Redraw attempts so far (boundary, resume and forced).
    pub redraws: u64,
    /// Redraw attempts the renderer reported as failed.
    pub render_faults: u64,
    /// Message of the most recent renderer fault.
    #[serde(default)]
    pub last_fault: Option<String>,
}

/// Whether a paint left the renderer attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaintOutcome {
    /// Painted, or failed and isolated; keep ticking.
    Attached,
    /// Renderer reported its mount point gone.
    Detached,
}

/// Single-owner redraw scheduler state machine.
///
/// Holds the current configuration, the visibility gate and the pending
/// timer. All mutation goes through `&mut self`, so timer fires, visibility
/// changes and reconciliations for one clock can never interleave.
pub struct ClockScheduler<R: Renderer, C: WallClock> {
    pub(super) renderer: R,
    pub(super) clock: C,
    pub(super) config: ClockConfig,
    pub(super) gate: VisibilityGate,
    pending: Option<PendingTimer>,
    next_timer_id: u64,
    last_boundary: Option<NaiveDateTime>,
    redraws: u64,
    render_faults: u64,
    last_fault: Option<String>,
    destroyed: bool,
}

impl<R: Renderer, C: WallClock> ClockScheduler<R, C> {
    /// Create a disarmed scheduler. Call [`arm`](Self::arm) to start ticking.
    pub fn new(renderer: R, clock: C, config: ClockConfig, gate: VisibilityGate) -> Self {
        Self {
            renderer,
            clock,
            config,
            gate,
            pending: None,
            next_timer_id: 0,
            last_boundary: None,
            redraws: 0,
            render_faults: 0,
            last_fault: None,
            destroyed: false,
        }
    }

    /// Cancel any pending timer, then arm one for the next boundary if visible.
    ///
    /// Hidden or destroyed schedulers are left with no timer.
    pub fn arm(&mut self) {
        self.cancel_pending();
        if self.destroyed || !self.gate.is_visible() {
            return;
        }

        let boundary = next_boundary(self.clock.now(), self.config.display_mode);
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.pending = Some(PendingTimer {
            id,
            deadline: Instant::now() + boundary.delay,
            boundary: boundary.at,
            delay: boundary.delay,
        });
        debug!(
            timer = id.get(),
            delay_ms = boundary.delay_ms(),
            boundary = %boundary.at,
            mode = %self.config.display_mode,
            "redraw timer armed"
        );
    }

    /// Cancel the pending timer. Returns `true` if one was pending.
    pub fn disarm(&mut self) -> bool {
        let cancelled = self.cancel_pending();
        if cancelled {
            debug!("redraw timer disarmed");
        }
        cancelled
    }

    /// Handle the host reporting that timer `id` has elapsed.
    ///
    /// Paints exactly once and re-arms. Returns `false` (and does nothing)
    /// when `id` is not the pending timer, e.g. a fire that raced a cancel.
    pub fn on_timer_fired(&mut self, id: TimerId) -> bool {
        if self.destroyed {
            return false;
        }
        let fired = match self.pending {
            Some(timer) if timer.id == id => timer,
            _ => {
                debug!(timer = id.get(), "ignoring stale timer fire");
                return false;
            }
        };

        self.pending = None;
        self.last_boundary = Some(fired.boundary);
        if self.paint() == PaintOutcome::Detached {
            self.shutdown();
            return true;
        }
        self.arm();
        true
    }

    /// The pending timer, if any.
    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.pending
    }

    /// Number of pending timers: 0 or 1.
    pub fn pending_count(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    /// Current configuration.
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Host-observed visibility.
    pub fn is_visible(&self) -> bool {
        self.gate.is_visible()
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// A clone of the live visibility subscription, until shutdown.
    pub fn visibility_subscription(&self) -> Option<VisibilitySubscription> {
        self.gate.subscription()
    }

    /// Point-in-time state view.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            visible: self.gate.is_visible(),
            armed: self.pending.is_some(),
            destroyed: self.destroyed,
            display_mode: self.config.display_mode,
            last_boundary: self.last_boundary,
            next_boundary: self.pending.map(|t| t.boundary),
            redraws: self.redraws,
            render_faults: self.render_faults,
            last_fault: self.last_fault.clone(),
        }
    }

    /// Paint the current time once.
    ///
    /// Renderer faults, panics included, are logged and counted but never
    /// stop the clock.
    pub(crate) fn paint(&mut self) -> PaintOutcome {
        let now = self.clock.now();
        self.redraws += 1;
        let renderer = &mut self.renderer;
        let config = &self.config;
        match isolate(|| renderer.redraw(now, config)) {
            Ok(()) => PaintOutcome::Attached,
            Err(RenderError::Detached) => {
                info!("renderer detached during redraw");
                PaintOutcome::Detached
            }
            Err(e) => {
                self.record_fault(&e);
                PaintOutcome::Attached
            }
        }
    }

    /// Record an isolated renderer fault.
    pub(super) fn record_fault(&mut self, error: &RenderError) {
        self.render_faults += 1;
        self.last_fault = Some(error.to_string());
        warn!(error = %error, faults = self.render_faults, "renderer fault isolated; clock keeps ticking");
    }

    /// Tear down: disarm, drop the visibility subscription, unmount.
    ///
    /// Idempotent; after the first call every operation is a no-op.
    pub fn shutdown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.cancel_pending();
        self.gate.close();
        self.renderer.unmount();
        info!(redraws = self.redraws, faults = self.render_faults, "clock scheduler destroyed");
    }

    fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
