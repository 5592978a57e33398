//! End-to-end behaviour of the clock scheduler through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use clockface::render::{DialElement, RecordingRenderer, RenderEvent, RenderLog};
use clockface::scheduler::{VisibilityController, next_boundary};
use clockface::time::{ManualClock, wall_time};
use clockface::{
    ClockConfig, ClockController, ClockPatch, DisplayMode, GateTransition, HandAngles,
    HostVisibility, MountPoint, Reconciliation, visibility_channel,
};

struct Harness {
    clock: ClockController<RecordingRenderer, ManualClock>,
    log: RenderLog,
    time: ManualClock,
    visibility: VisibilityController,
}

fn harness(mode: DisplayMode, initial: HostVisibility) -> Harness {
    let log = RenderLog::new();
    let time = ManualClock::new(wall_time(10, 30, 45, 123).expect("valid time"));
    let (visibility, source) = visibility_channel(initial);
    let clock = ClockController::new(
        MountPoint::new("dashboard"),
        ClockConfig::with_mode(mode),
        RecordingRenderer::new(log.clone()),
        &source,
        time.clone(),
    )
    .expect("controller");
    Harness {
        clock,
        log,
        time,
        visibility,
    }
}

/// Advance the manual clock to the pending deadline and fire it.
fn fire_pending(h: &mut Harness) {
    let timer = h.clock.pending_timer().expect("timer armed");
    h.time.advance(timer.delay);
    assert!(h.clock.on_timer_fired(timer.id));
}

#[test]
fn minute_mode_first_delay() {
    let h = harness(DisplayMode::MinuteOnly, HostVisibility::Visible);
    assert_eq!(
        h.clock.pending_timer().unwrap().delay,
        Duration::from_millis(14_877)
    );
}

#[test]
fn seconds_mode_first_delay() {
    let h = harness(DisplayMode::WithSeconds, HostVisibility::Visible);
    assert_eq!(
        h.clock.pending_timer().unwrap().delay,
        Duration::from_millis(877)
    );
}

#[test]
fn boundary_math_matches_controller() {
    let now = wall_time(23, 59, 59, 999).unwrap();
    assert_eq!(next_boundary(now, DisplayMode::WithSeconds).delay_ms(), 1);
    assert_eq!(next_boundary(now, DisplayMode::MinuteOnly).delay_ms(), 1);
}

#[test]
fn hidden_at_construction_does_nothing_until_visible() {
    let mut h = harness(DisplayMode::WithSeconds, HostVisibility::Hidden);
    assert_eq!(h.clock.pending_count(), 0);
    assert_eq!(h.log.redraw_count(), 0);

    h.time.advance(Duration::from_secs(30));
    assert_eq!(h.clock.pending_count(), 0);
    assert_eq!(h.log.redraw_count(), 0);

    let transition = h.clock.on_visibility_changed(HostVisibility::Visible);
    assert_eq!(transition, Some(GateTransition::Resumed));
    assert_eq!(h.log.redraw_count(), 1);
    assert_eq!(h.clock.pending_count(), 1);
}

#[test]
fn becoming_visible_redraws_once_and_arms_once() {
    let mut h = harness(DisplayMode::MinuteOnly, HostVisibility::Visible);
    h.clock.on_visibility_changed(HostVisibility::Hidden);
    h.log.clear();

    h.time.set(wall_time(12, 0, 20, 0).unwrap());
    h.clock.on_visibility_changed(HostVisibility::Visible);

    let events = h.log.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        RenderEvent::Redraw { now, .. } if now == wall_time(12, 0, 20, 0).unwrap()
    ));
    assert_eq!(h.clock.pending_count(), 1);
    assert_eq!(
        h.clock.pending_timer().unwrap().delay,
        Duration::from_millis(40_000)
    );
}

#[test]
fn mode_change_rebuilds_and_cosmetic_change_patches() {
    let mut h = harness(DisplayMode::MinuteOnly, HostVisibility::Visible);
    let first_generation = h.clock.renderer().scene().unwrap().generation();

    let decision = h
        .clock
        .reconcile(&ClockPatch::display_mode(DisplayMode::WithSeconds));
    assert_eq!(decision, Some(Reconciliation::Rebuild));
    let scene = h.clock.renderer().scene().unwrap();
    assert!(scene.has_second_hand());
    assert_eq!(scene.generation(), first_generation + 1);
    assert_eq!(
        h.clock.pending_timer().unwrap().delay,
        Duration::from_millis(877)
    );

    let decision = h.clock.reconcile(&ClockPatch::accent_color("x"));
    assert_eq!(decision, Some(Reconciliation::Patch));
    let scene = h.clock.renderer().scene().unwrap();
    assert_eq!(scene.generation(), first_generation + 1);
    assert!(scene.elements().contains(&DialElement::SecondHand {
        color: "x".to_owned()
    }));
    assert_eq!(h.log.rebuild_count(), 1);
    assert_eq!(h.log.patch_count(), 1);
}

#[test]
fn destroy_twice_leaves_no_timers() {
    let mut h = harness(DisplayMode::WithSeconds, HostVisibility::Visible);
    h.clock.destroy();
    h.clock.destroy();
    assert_eq!(h.clock.pending_count(), 0);
    assert!(h.clock.is_destroyed());

    h.visibility.hide();
    h.visibility.show();
    assert_eq!(h.clock.on_visibility_changed(HostVisibility::Hidden), None);
    assert_eq!(h.clock.pending_count(), 0);
}

#[test]
fn chain_self_corrects_after_late_fires() {
    let mut h = harness(DisplayMode::WithSeconds, HostVisibility::Visible);

    for lateness_ms in [0, 35, 250, 999] {
        let timer = h.clock.pending_timer().unwrap();
        h.time.advance(timer.delay + Duration::from_millis(lateness_ms));
        assert!(h.clock.on_timer_fired(timer.id));

        let next = h.clock.pending_timer().unwrap();
        assert_eq!(
            next.delay,
            Duration::from_millis(1_000 - lateness_ms),
            "lateness {lateness_ms}ms must be absorbed by the next delay"
        );
    }
    assert_eq!(h.log.redraw_count(), 5);
}

#[test]
fn clock_jump_realigns_next_boundary() {
    let mut h = harness(DisplayMode::MinuteOnly, HostVisibility::Visible);
    let timer = h.clock.pending_timer().unwrap();

    // Wall clock stepped back by an NTP correction while the timer slept.
    h.time.set(wall_time(10, 29, 58, 500).unwrap());
    assert!(h.clock.on_timer_fired(timer.id));

    let next = h.clock.pending_timer().unwrap();
    assert_eq!(next.boundary, wall_time(10, 30, 0, 0).unwrap());
    assert_eq!(next.delay, Duration::from_millis(1_500));
}

#[test]
fn renderer_faults_do_not_stop_the_clock() {
    let mut h = harness(DisplayMode::WithSeconds, HostVisibility::Visible);
    h.log.fail_redraws(true);
    fire_pending(&mut h);
    fire_pending(&mut h);
    h.log.fail_redraws(false);
    fire_pending(&mut h);

    let snapshot = h.clock.snapshot();
    assert_eq!(snapshot.render_faults, 2);
    assert_eq!(snapshot.redraws, 4);
    assert!(snapshot.armed);
}

#[test]
fn painted_time_matches_hand_angles() {
    let mut h = harness(DisplayMode::WithSeconds, HostVisibility::Visible);
    fire_pending(&mut h);

    let angles = h.clock.renderer().scene().unwrap().angles().unwrap();
    assert_eq!(angles, HandAngles::at(&wall_time(10, 30, 46, 0).unwrap()));
    assert_eq!(angles.second, 276.0);
}

#[test]
fn snapshot_serializes_to_json() {
    let h = harness(DisplayMode::MinuteOnly, HostVisibility::Visible);
    let json = serde_json::to_value(h.clock.snapshot()).unwrap();
    assert_eq!(json["display_mode"], "minute_only");
    assert_eq!(json["armed"], true);
    assert_eq!(json["redraws"], 1);
}
