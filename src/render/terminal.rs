//! Text renderer: one line per frame on any [`Write`] sink.

use chrono::NaiveDateTime;
use std::io::Write;
use tracing::debug;

use super::scene::DialScene;
use super::{MountPoint, RenderError, Renderer};
use crate::config::ClockConfig;

/// Paints the dial as a single text line per redraw.
///
/// ```text
/// [kitchen] 10:30:46  hour 315.4°  minute 184.6°  second 276.0°
/// ```
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    scene: Option<DialScene>,
    mount: Option<MountPoint>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Renderer writing frames to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            scene: None,
            mount: None,
        }
    }

    /// Current scene, once mounted.
    pub fn scene(&self) -> Option<&DialScene> {
        self.scene.as_ref()
    }

    /// Consume the renderer and return the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn scene_mut(&mut self) -> Result<&mut DialScene, RenderError> {
        self.scene.as_mut().ok_or(RenderError::Detached)
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn mount(&mut self, mount: &MountPoint, config: &ClockConfig) -> Result<(), RenderError> {
        debug!(mount = %mount, mode = %config.display_mode, "terminal renderer mounted");
        self.scene = Some(DialScene::build(config));
        self.mount = Some(mount.clone());
        Ok(())
    }

    fn redraw(&mut self, now: NaiveDateTime, config: &ClockConfig) -> Result<(), RenderError> {
        let scene = self.scene_mut()?;
        scene.set_time(now);
        let line = format_frame(scene, now, config);
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    fn rebuild(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        self.scene_mut()?.rebuild(config);
        Ok(())
    }

    fn patch(&mut self, config: &ClockConfig) -> Result<(), RenderError> {
        self.scene_mut()?.patch(config);
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(mount) = self.mount.take() {
            debug!(mount = %mount, "terminal renderer unmounted");
        }
        self.scene = None;
    }
}

fn format_frame(scene: &DialScene, now: NaiveDateTime, config: &ClockConfig) -> String {
    let mut line = String::new();
    if let Some(label) = scene.label() {
        line.push_str(&format!("[{label}] "));
    }

    let Some(angles) = scene.angles() else {
        return line;
    };

    if config.display_mode.shows_seconds() {
        line.push_str(&now.format("%H:%M:%S").to_string());
    } else {
        line.push_str(&now.format("%H:%M").to_string());
    }
    line.push_str(&format!(
        "  hour {:.1}°  minute {:.1}°",
        angles.hour, angles.minute
    ));
    if scene.has_second_hand() {
        line.push_str(&format!("  second {:.1}°", angles.second));
    }
    line
}
