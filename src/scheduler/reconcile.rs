//! Option reconciliation.
//!
//! A [`ClockPatch`] is merged onto the current [`ClockConfig`]. Only a
//! display-mode change alters the set of visual elements (the seconds hand
//! appears or disappears), so only that path rebuilds; everything else is
//! patched in place. Either way the loop is re-armed, because the pending
//! timer may have been computed under the old granularity.

use tracing::{debug, warn};

use crate::config::{ClockConfig, ClockPatch};
use crate::render::{RenderError, Renderer, isolate};
use crate::scheduler::runner::ClockScheduler;
use crate::time::WallClock;

/// How the rendered output must change after a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Display mode changed: discard and recreate every visual element.
    Rebuild,
    /// Cosmetic change only: update existing elements in place.
    Patch,
}

/// Merge `patch` onto `current` and decide rebuild vs. patch.
pub fn plan(current: &ClockConfig, patch: &ClockPatch) -> (ClockConfig, Reconciliation) {
    let next = current.merged(patch);
    let decision = if next.display_mode == current.display_mode {
        Reconciliation::Patch
    } else {
        Reconciliation::Rebuild
    };
    (next, decision)
}

impl<R: Renderer, C: WallClock> ClockScheduler<R, C> {
    /// Apply `patch`, rebuild or patch the renderer, then re-arm.
    ///
    /// Returns `None` after shutdown. A renderer fault during rebuild/patch
    /// is isolated like a redraw fault: the new configuration is kept and the
    /// loop is still re-armed.
    pub fn reconcile(&mut self, patch: &ClockPatch) -> Option<Reconciliation> {
        if self.is_destroyed() {
            return None;
        }

        let (next, decision) = plan(&self.config, patch);
        let previous_mode = self.config.display_mode;
        self.config = next;

        let renderer = &mut self.renderer;
        let config = &self.config;
        let applied = isolate(|| match decision {
            Reconciliation::Rebuild => renderer.rebuild(config),
            Reconciliation::Patch => renderer.patch(config),
        });
        debug!(
            ?decision,
            from = %previous_mode,
            to = %self.config.display_mode,
            "configuration reconciled"
        );

        match applied {
            Ok(()) => {}
            Err(RenderError::Detached) => {
                warn!("renderer detached during reconcile");
                self.shutdown();
                return Some(decision);
            }
            Err(e) => self.record_fault(&e),
        }

        self.arm();
        Some(decision)
    }
}
