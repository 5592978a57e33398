//! Clockface: a self-correcting analog clock redraw scheduler.
//!
//! The crate decides *when* an analog clock face must be repainted and
//! leaves *how* to a pluggable [`Renderer`]:
//!
//! - **Boundary timers**: one one-shot timer at a time, always aimed at the
//!   next wall-clock minute (or second) boundary and recomputed from the
//!   current time on every fire, so drift never accumulates.
//! - **Visibility gate**: no timers while the host reports the clock hidden;
//!   one catch-up redraw when it becomes visible again.
//! - **Reconciliation**: configuration patches rebuild the dial when the
//!   display mode changes and patch it in place otherwise.
//!
//! [`ClockController`] is the synchronous state machine; [`ClockHandle`]
//! runs one on a tokio task.

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod render;
pub mod scheduler;
pub mod time;

pub use config::{ClockConfig, ClockPatch, ClockSettings, DisplayMode, VisualParameters};
pub use controller::ClockController;
pub use error::{ClockError, Result};
pub use host::ClockHandle;
pub use render::{HandAngles, MountPoint, RenderError, Renderer};
pub use scheduler::{
    GateTransition, HostVisibility, Reconciliation, SchedulerSnapshot, VisibilitySource,
    visibility_channel,
};
pub use time::{SystemClock, WallClock};
