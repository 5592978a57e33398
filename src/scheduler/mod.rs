//! Redraw scheduler core.
//!
//! Arms one boundary-aligned one-shot timer at a time, suspends while the
//! host reports the clock hidden, and re-arms after every configuration
//! change.

pub mod boundary;
pub mod reconcile;
pub mod runner;
pub mod visibility;

pub use boundary::{Boundary, next_boundary};
pub use reconcile::Reconciliation;
pub use runner::{ClockScheduler, PendingTimer, SchedulerSnapshot, TimerId};
pub use visibility::{
    ChannelVisibility, GateTransition, HostVisibility, VisibilityController, VisibilityGate,
    VisibilitySource, VisibilitySubscription, visibility_channel,
};
