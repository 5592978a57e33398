//! Visibility gate.
//!
//! Translates a host foreground/background signal into suspend/resume of the
//! redraw loop:
//!
//! - `Visible -> Hidden`: disarm. Nothing is painted while hidden.
//! - `Hidden -> Visible`: paint once immediately (the display is stale by
//!   however long it was hidden), then arm for the next boundary.
//!
//! Hosts expose their signal through [`VisibilitySource`]. Signals that
//! cannot be read as a boolean ([`HostVisibility::Unknown`]) count as
//! visible, so a broken signal never freezes the clock.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{ClockError, Result};
use crate::render::Renderer;
use crate::scheduler::runner::{ClockScheduler, PaintOutcome};
use crate::time::WallClock;

/// Raw host visibility signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HostVisibility {
    /// Foreground.
    Visible,
    /// Background.
    Hidden,
    /// Not interpretable; treated as visible.
    #[default]
    Unknown,
}

impl HostVisibility {
    /// Whether the signal should let the clock tick.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

impl From<bool> for HostVisibility {
    fn from(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::Hidden }
    }
}

impl From<Option<bool>> for HostVisibility {
    fn from(visible: Option<bool>) -> Self {
        visible.map_or(Self::Unknown, Self::from)
    }
}

/// Gate transition produced by a visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Went hidden; loop disarmed.
    Suspended,
    /// Came back; painted once and re-armed.
    Resumed,
}

/// Live feed of host visibility changes.
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) releases the
/// subscription.
#[derive(Debug, Clone)]
pub struct VisibilitySubscription {
    rx: watch::Receiver<HostVisibility>,
}

impl VisibilitySubscription {
    /// Wrap a watch receiver. Values already in the channel count as seen.
    pub fn new(mut rx: watch::Receiver<HostVisibility>) -> Self {
        let _ = rx.borrow_and_update();
        Self { rx }
    }

    /// Latest signal.
    pub fn current(&self) -> HostVisibility {
        *self.rx.borrow()
    }

    /// Wait for the next change. `None` once the source has gone away.
    pub async fn changed(&mut self) -> Option<HostVisibility> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Release the subscription.
    pub fn unsubscribe(self) {}
}

/// Host capability reporting foreground/background state.
pub trait VisibilitySource {
    /// Current signal.
    fn current(&self) -> HostVisibility;

    /// Start receiving changes.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Visibility`] when the source cannot be observed.
    fn subscribe(&self) -> Result<VisibilitySubscription>;
}

/// Watch-channel visibility source; flip it with a [`VisibilityController`].
#[derive(Debug, Clone)]
pub struct ChannelVisibility {
    rx: watch::Receiver<HostVisibility>,
}

/// Host side of a [`ChannelVisibility`].
#[derive(Debug)]
pub struct VisibilityController {
    tx: watch::Sender<HostVisibility>,
}

/// Create a linked controller/source pair starting at `initial`.
#[must_use]
pub fn visibility_channel(initial: HostVisibility) -> (VisibilityController, ChannelVisibility) {
    let (tx, rx) = watch::channel(initial);
    (VisibilityController { tx }, ChannelVisibility { rx })
}

impl VisibilityController {
    /// Publish a new signal. Repeating the current value is not a change.
    pub fn set(&self, visibility: HostVisibility) {
        self.tx.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    /// Publish [`HostVisibility::Visible`].
    pub fn show(&self) {
        self.set(HostVisibility::Visible);
    }

    /// Publish [`HostVisibility::Hidden`].
    pub fn hide(&self) {
        self.set(HostVisibility::Hidden);
    }

    /// Number of live subscriptions (plus the source itself).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl VisibilitySource for ChannelVisibility {
    fn current(&self) -> HostVisibility {
        *self.rx.borrow()
    }

    fn subscribe(&self) -> Result<VisibilitySubscription> {
        if self.rx.has_changed().is_err() {
            return Err(ClockError::Visibility(
                "visibility source closed".to_owned(),
            ));
        }
        Ok(VisibilitySubscription::new(self.rx.clone()))
    }
}

/// Two-state gate plus the subscription that feeds it.
#[derive(Debug)]
pub struct VisibilityGate {
    visible: bool,
    subscription: Option<VisibilitySubscription>,
}

impl VisibilityGate {
    /// Subscribe to `source` and take its current state.
    ///
    /// # Errors
    ///
    /// Subscription failures are returned unchanged; a clock cannot run
    /// without knowing when it is hidden.
    pub fn open<V: VisibilitySource + ?Sized>(source: &V) -> Result<Self> {
        let subscription = source.subscribe()?;
        let visible = subscription.current().is_visible();
        debug!(visible, "visibility gate opened");
        Ok(Self {
            visible,
            subscription: Some(subscription),
        })
    }

    /// Gate with a fixed initial state and no subscription. Changes must be
    /// pushed with [`ClockScheduler::on_visibility_changed`].
    pub fn detached(initial: HostVisibility) -> Self {
        Self {
            visible: initial.is_visible(),
            subscription: None,
        }
    }

    /// Current gate state.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// A clone of the live subscription, for a host loop to await on.
    pub fn subscription(&self) -> Option<VisibilitySubscription> {
        self.subscription.clone()
    }

    /// Whether a subscription is held.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drop the subscription.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("visibility subscription released");
        }
    }
}

impl<R: Renderer, C: WallClock> ClockScheduler<R, C> {
    /// Apply a host visibility signal.
    ///
    /// Returns the transition taken, or `None` when the signal matches the
    /// current state or the scheduler is destroyed.
    pub fn on_visibility_changed(&mut self, signal: HostVisibility) -> Option<GateTransition> {
        if self.is_destroyed() {
            return None;
        }
        let visible = signal.is_visible();
        if visible == self.gate.visible {
            return None;
        }
        self.gate.visible = visible;

        if !visible {
            self.disarm();
            info!("clock hidden; redraws suspended");
            return Some(GateTransition::Suspended);
        }

        info!("clock visible; catching up and resuming");
        if self.paint() == PaintOutcome::Detached {
            self.shutdown();
        } else {
            self.arm();
        }
        Some(GateTransition::Resumed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::{ClockConfig, DisplayMode};
    use crate::render::{RecordingRenderer, RenderLog};
    use crate::time::{ManualClock, wall_time};

    fn make_scheduler(
        initial: HostVisibility,
    ) -> (ClockScheduler<RecordingRenderer, ManualClock>, RenderLog, ManualClock) {
        let log = RenderLog::new();
        let clock = ManualClock::new(wall_time(10, 30, 45, 123).unwrap());
        let mut scheduler = ClockScheduler::new(
            RecordingRenderer::new(log.clone()),
            clock.clone(),
            ClockConfig::with_mode(DisplayMode::MinuteOnly),
            VisibilityGate::detached(initial),
        );
        scheduler.arm();
        (scheduler, log, clock)
    }

    #[test]
    fn unknown_signal_fails_open() {
        assert!(HostVisibility::Unknown.is_visible());
        assert_eq!(HostVisibility::from(None), HostVisibility::Unknown);
        assert_eq!(HostVisibility::from(Some(false)), HostVisibility::Hidden);
        assert_eq!(HostVisibility::from(true), HostVisibility::Visible);
    }

    #[test]
    fn hiding_disarms_without_redraw() {
        let (mut scheduler, log, _clock) = make_scheduler(HostVisibility::Visible);
        assert_eq!(scheduler.pending_count(), 1);

        let transition = scheduler.on_visibility_changed(HostVisibility::Hidden);
        assert_eq!(transition, Some(GateTransition::Suspended));
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(log.redraw_count(), 0);
    }

    #[test]
    fn showing_redraws_once_then_arms_once() {
        let (mut scheduler, log, clock) = make_scheduler(HostVisibility::Hidden);
        assert_eq!(scheduler.pending_count(), 0);

        clock.set(wall_time(11, 2, 10, 500).unwrap());
        let transition = scheduler.on_visibility_changed(HostVisibility::Visible);

        assert_eq!(transition, Some(GateTransition::Resumed));
        assert_eq!(log.redraw_times(), vec![wall_time(11, 2, 10, 500).unwrap()]);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.pending_timer().unwrap().boundary,
            wall_time(11, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn failed_catch_up_redraw_still_arms() {
        let (mut scheduler, log, _clock) = make_scheduler(HostVisibility::Hidden);
        log.fail_redraws(true);

        let transition = scheduler.on_visibility_changed(HostVisibility::Visible);

        assert_eq!(transition, Some(GateTransition::Resumed));
        assert_eq!(log.redraw_count(), 1);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.snapshot().render_faults, 1);
    }

    #[test]
    fn detached_catch_up_redraw_destroys() {
        let (mut scheduler, log, _clock) = make_scheduler(HostVisibility::Hidden);
        log.detach_on_next_redraw();

        scheduler.on_visibility_changed(HostVisibility::Visible);

        assert!(scheduler.is_destroyed());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn repeated_signal_is_noop() {
        let (mut scheduler, log, _clock) = make_scheduler(HostVisibility::Visible);
        let id = scheduler.pending_timer().unwrap().id;
        assert_eq!(scheduler.on_visibility_changed(HostVisibility::Visible), None);
        assert_eq!(scheduler.on_visibility_changed(HostVisibility::Unknown), None);
        assert_eq!(scheduler.pending_timer().unwrap().id, id);
        assert_eq!(log.redraw_count(), 0);
    }

    #[test]
    fn visibility_ignored_after_shutdown() {
        let (mut scheduler, log, _clock) = make_scheduler(HostVisibility::Hidden);
        scheduler.shutdown();
        assert_eq!(scheduler.on_visibility_changed(HostVisibility::Visible), None);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(log.redraw_count(), 0);
    }

    #[test]
    fn gate_open_reads_initial_state() {
        let (_controller, source) = visibility_channel(HostVisibility::Hidden);
        let gate = VisibilityGate::open(&source).unwrap();
        assert!(!gate.is_visible());
        assert!(gate.is_subscribed());
    }

    #[test]
    fn subscribe_fails_when_source_closed() {
        let (controller, source) = visibility_channel(HostVisibility::Visible);
        drop(controller);
        let result = VisibilityGate::open(&source);
        assert!(matches!(result, Err(ClockError::Visibility(_))));
    }

    #[test]
    fn close_releases_subscription() {
        let (controller, source) = visibility_channel(HostVisibility::Visible);
        let mut gate = VisibilityGate::open(&source).unwrap();
        assert_eq!(controller.receiver_count(), 2);
        gate.close();
        gate.close();
        assert!(!gate.is_subscribed());
        assert_eq!(controller.receiver_count(), 1);
    }

    #[tokio::test]
    async fn subscription_sees_changes_not_repeats() {
        let (controller, source) = visibility_channel(HostVisibility::Visible);
        let mut subscription = source.subscribe().unwrap();

        controller.show();
        controller.hide();
        assert_eq!(subscription.changed().await, Some(HostVisibility::Hidden));

        drop(controller);
        assert_eq!(subscription.changed().await, None);
    }
}
