//! Headless renderer that records every call.
//!
//! Used by tests and by hosts that paint elsewhere but still want the
//! scheduler's timing. Clones of a [`RenderLog`] share the same history.

use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex};

use super::scene::DialScene;
use super::{MountPoint, RenderError, Renderer};
use crate::config::{ClockConfig, DisplayMode};

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// `mount` was called.
    Mounted {
        /// Mount point id.
        mount: String,
        /// Display mode at mount time.
        mode: DisplayMode,
    },
    /// `redraw` was called.
    Redraw {
        /// Time passed to the renderer.
        now: NaiveDateTime,
        /// Display mode at redraw time.
        mode: DisplayMode,
    },
    /// `rebuild` was called.
    Rebuilt {
        /// New display mode.
        mode: DisplayMode,
    },
    /// `patch` was called.
    Patched,
    /// `unmount` was called.
    Unmounted,
}

#[derive(Debug, Default)]
struct LogInner {
    events: Vec<RenderEvent>,
    fail_redraws: bool,
    detach_on_redraw: bool,
    fail_reconciles: bool,
    detach_on_reconcile: bool,
}

/// Shared, inspectable renderer history plus fault switches.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    inner: Arc<Mutex<LogInner>>,
}

impl RenderLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.lock().events.clone()
    }

    /// Times passed to `redraw`, oldest first.
    pub fn redraw_times(&self) -> Vec<NaiveDateTime> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Redraw { now, .. } => Some(*now),
                _ => None,
            })
            .collect()
    }

    /// Number of `redraw` calls.
    pub fn redraw_count(&self) -> usize {
        self.count(|e| matches!(e, RenderEvent::Redraw { .. }))
    }

    /// Number of `rebuild` calls.
    pub fn rebuild_count(&self) -> usize {
        self.count(|e| matches!(e, RenderEvent::Rebuilt { .. }))
    }

    /// Number of `patch` calls.
    pub fn patch_count(&self) -> usize {
        self.count(|e| matches!(e, RenderEvent::Patched))
    }

    /// Forget recorded events; fault switches are kept.
    pub fn clear(&self) {
        self.lock().events.clear();
    }

    /// Make every `redraw` fail with [`RenderError::Paint`] (still recorded).
    pub fn fail_redraws(&self, fail: bool) {
        self.lock().fail_redraws = fail;
    }

    /// Make the next `redraw` report [`RenderError::Detached`].
    pub fn detach_on_next_redraw(&self) {
        self.lock().detach_on_redraw = true;
    }

    /// Make every `rebuild` and `patch` fail with [`RenderError::Paint`]
    /// (still recorded).
    pub fn fail_reconciles(&self, fail: bool) {
        self.lock().fail_reconciles = fail;
    }

    /// Make the next `rebuild` or `patch` report [`RenderError::Detached`].
    pub fn detach_on_next_reconcile(&self) {
        self.lock().detach_on_reconcile = true;
    }

    fn count(&self, pred: impl Fn(&RenderEvent) -> bool) -> usize {
        self.lock().events.iter().filter(|e| pred(e)).count()
    }

    fn reconcile_fault(&self) -> Result<(), RenderError> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.detach_on_reconcile) {
            return Err(RenderError::Detached);
        }
        if inner.fail_reconciles {
            return Err(RenderError::Paint("injected reconcile fault".to_owned()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Renderer that keeps a [`DialScene`] and records calls into a [`RenderLog`].
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    log: RenderLog,
    scene: Option<DialScene>,
}

impl RecordingRenderer {
    /// Renderer recording into `log`.
    pub fn new(log: RenderLog) -> Self {
        Self { log, scene: None }
    }

    /// Current scene, once mounted.
    pub fn scene(&self) -> Option<&DialScene> {
        self.scene.as_ref()
    }
}

impl Renderer for RecordingRenderer {
    fn mount(&mut self, mount: &MountPoint, config: &ClockConfig) -> Result<(), RenderError> {
        self.scene = Some(DialScene::build(config));
        self.log.lock().events.push(RenderEvent::Mounted {
            mount: mount.id().to_owned(),
            mode: config.display_mode,
        });
        Ok(())
    }

    fn redraw(&mut self, now: NaiveDateTime, config: &ClockConfig) -> Result<(), RenderError> {
        let mut log = self.log.lock();
        log.events.push(RenderEvent::Redraw {
            now,
            mode: config.display_mode,
        });
        if std::mem::take(&mut log.detach_on_redraw) {
            return Err(RenderError::Detached);
        }
        if log.fail_redraws {
            return Err(RenderError::Paint("injected redraw fault".to_owned()));
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.set_time(now);
        }
        Ok(())
    }

    fn rebuild(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        self.log.lock().events.push(RenderEvent::Rebuilt {
            mode: config.display_mode,
        });
        self.log.reconcile_fault()?;
        if let Some(scene) = self.scene.as_mut() {
            scene.rebuild(config);
        }
        Ok(())
    }

    fn patch(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        self.log.lock().events.push(RenderEvent::Patched);
        self.log.reconcile_fault()?;
        if let Some(scene) = self.scene.as_mut() {
            scene.patch(config);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.scene = None;
        self.log.lock().events.push(RenderEvent::Unmounted);
    }
}
