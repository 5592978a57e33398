//! Renderer seam. The scheduler decides *when* to paint, renderers decide *how*.
//!
//! [`Renderer`] is the capability the scheduler consumes. The scheduler
//! guarantees call timing (boundary fires, resume-from-hidden, forced
//! redraws) and the time value passed in; it makes no assumption about the
//! drawing backend.

pub mod geometry;
pub mod recording;
pub mod scene;
pub mod terminal;

pub use geometry::HandAngles;
pub use recording::{RecordingRenderer, RenderEvent, RenderLog};
pub use scene::{DialElement, DialScene};
pub use terminal::TerminalRenderer;

use chrono::NaiveDateTime;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::ClockConfig;
use crate::error::ClockError;

/// Opaque host mount handle.
///
/// The scheduler hands it to the renderer at construction and drops it at
/// destroy; nothing else reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint(String);

impl MountPoint {
    /// Wrap a host-defined identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Host-defined identifier.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by a renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The frame could not be painted. The clock keeps ticking.
    #[error("paint failed: {0}")]
    Paint(String),

    /// The host tore down the mount point while painting. The scheduler
    /// destroys itself instead of re-arming.
    #[error("mount point detached")]
    Detached,
}

impl From<RenderError> for ClockError {
    fn from(e: RenderError) -> Self {
        ClockError::Render(e.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Paint(e.to_string())
    }
}

/// Run one renderer call, reporting a panic as [`RenderError::Paint`].
///
/// Renderers are host code; a panic inside one must not unwind through the
/// scheduler and stop the clock.
pub(crate) fn isolate(call: impl FnOnce() -> Result<(), RenderError>) -> Result<(), RenderError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Err(RenderError::Paint(format!("renderer panicked: {message}")))
    })
}

/// Drawing backend driven by the scheduler.
pub trait Renderer: Send {
    /// Create visual elements for `config` inside `mount`.
    fn mount(&mut self, mount: &MountPoint, config: &ClockConfig) -> Result<(), RenderError>;

    /// Paint the clock showing `now`.
    fn redraw(&mut self, now: NaiveDateTime, config: &ClockConfig) -> Result<(), RenderError>;

    /// Discard and recreate every visual element (display mode changed).
    fn rebuild(&mut self, config: &ClockConfig) -> Result<(), RenderError>;

    /// Update existing visual elements in place (cosmetic change).
    fn patch(&mut self, config: &ClockConfig) -> Result<(), RenderError>;

    /// Release the mount point. Called once, on destroy.
    fn unmount(&mut self) {}
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn mount(&mut self, mount: &MountPoint, config: &ClockConfig) -> Result<(), RenderError> {
        (**self).mount(mount, config)
    }

    fn redraw(&mut self, now: NaiveDateTime, config: &ClockConfig) -> Result<(), RenderError> {
        (**self).redraw(now, config)
    }

    fn rebuild(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        (**self).rebuild(config)
    }

    fn patch(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        (**self).patch(config)
    }

    fn unmount(&mut self) {
        (**self).unmount();
    }
}
