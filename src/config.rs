//! Configuration types for the clock scheduler.
//!
//! [`ClockConfig`] is the value object the scheduler works with; it is
//! replaced wholesale on every reconciliation. [`ClockPatch`] is the partial
//! overlay a host sends to change it, and [`ClockSettings`] is the on-disk
//! TOML form used by the demo host.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ClockError, Result};

/// Granularity of the redraw cadence.
///
/// Also controls whether a seconds hand exists in the rendered output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Redraw at the top of every minute; no seconds hand.
    #[default]
    #[serde(alias = "minute", alias = "minutes")]
    MinuteOnly,
    /// Redraw at the top of every second; seconds hand shown.
    #[serde(alias = "seconds", alias = "second")]
    WithSeconds,
}

impl DisplayMode {
    /// Whether the rendered output carries a seconds hand.
    pub fn shows_seconds(self) -> bool {
        matches!(self, Self::WithSeconds)
    }

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MinuteOnly => "minute_only",
            Self::WithSeconds => "with_seconds",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "minute_only" | "minute" | "minutes" | "minuteonly" => Ok(Self::MinuteOnly),
            "with_seconds" | "seconds" | "second" | "withseconds" => Ok(Self::WithSeconds),
            other => Err(ClockError::Config(format!(
                "unrecognized display mode: {other:?}"
            ))),
        }
    }
}

/// Rendering options passed straight through to the renderer.
///
/// Values are stored as given; the scheduler never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualParameters {
    /// Dial diameter in renderer units.
    pub size: i32,
    /// Colour of the clock face.
    pub face_color: String,
    /// Colour of the hour and minute hands.
    pub hand_color: String,
    /// Accent colour (seconds hand, centre cap).
    pub accent_color: String,
    /// Optional caption drawn under the dial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for VisualParameters {
    fn default() -> Self {
        Self {
            size: 160,
            face_color: "#ffffff".to_owned(),
            hand_color: "#1f2937".to_owned(),
            accent_color: "#ef4444".to_owned(),
            label: None,
        }
    }
}

/// Full clock configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Active display mode.
    pub display_mode: DisplayMode,
    /// Opaque rendering options.
    #[serde(flatten)]
    pub visual: VisualParameters,
}

impl ClockConfig {
    /// Config with the given display mode and default visuals.
    pub fn with_mode(display_mode: DisplayMode) -> Self {
        Self {
            display_mode,
            visual: VisualParameters::default(),
        }
    }

    /// Overlay `patch` onto a copy of this config.
    ///
    /// An empty-string `label` clears the label.
    pub fn merged(&self, patch: &ClockPatch) -> Self {
        let mut next = self.clone();
        if let Some(mode) = patch.display_mode {
            next.display_mode = mode;
        }
        if let Some(size) = patch.size {
            next.visual.size = size;
        }
        if let Some(color) = &patch.face_color {
            next.visual.face_color = color.clone();
        }
        if let Some(color) = &patch.hand_color {
            next.visual.hand_color = color.clone();
        }
        if let Some(color) = &patch.accent_color {
            next.visual.accent_color = color.clone();
        }
        if let Some(label) = &patch.label {
            next.visual.label = if label.is_empty() {
                None
            } else {
                Some(label.clone())
            };
        }
        next
    }
}

/// Partial configuration update. Absent fields keep their current value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockPatch {
    /// New display mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    /// New dial size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i32>,
    /// New face colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_color: Option<String>,
    /// New hand colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_color: Option<String>,
    /// New accent colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    /// New label; empty string clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ClockPatch {
    /// Patch that only changes the display mode.
    pub fn display_mode(mode: DisplayMode) -> Self {
        Self {
            display_mode: Some(mode),
            ..Self::default()
        }
    }

    /// Patch that only changes the accent colour.
    pub fn accent_color(color: impl Into<String>) -> Self {
        Self {
            accent_color: Some(color.into()),
            ..Self::default()
        }
    }

    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Parse a patch from JSON text (`{"display_mode": "with_seconds"}`).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Config`] on malformed JSON or an unrecognised
    /// display mode.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ClockError::Config(e.to_string()))
    }

    /// Parse a patch from TOML text (`display_mode = "minute_only"`).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Config`] on malformed TOML or an unrecognised
    /// display mode.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ClockError::Config(e.to_string()))
    }
}

/// Terminal demo settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of boundary redraws to paint before exiting.
    pub redraws: u32,
    /// Start with the visibility signal reporting hidden.
    pub start_hidden: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            redraws: 5,
            start_hidden: false,
        }
    }
}

/// On-disk settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Initial clock configuration.
    pub clock: ClockConfig,
    /// Demo host settings.
    pub demo: DemoConfig,
}

impl ClockSettings {
    /// Load settings from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ClockError::Config(e.to_string()))
    }

    /// Save settings to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the settings cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ClockError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default settings path: `~/.config/clockface/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("clockface").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("clockface")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/clockface-config/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_minute_only() {
        let config = ClockConfig::default();
        assert_eq!(config.display_mode, DisplayMode::MinuteOnly);
        assert!(!config.display_mode.shows_seconds());
        assert!(config.visual.size > 0);
        assert!(config.visual.label.is_none());
    }

    #[test]
    fn display_mode_parses_aliases() {
        assert_eq!(
            "minute".parse::<DisplayMode>().unwrap(),
            DisplayMode::MinuteOnly
        );
        assert_eq!(
            "With-Seconds".parse::<DisplayMode>().unwrap(),
            DisplayMode::WithSeconds
        );
        assert_eq!(
            " seconds ".parse::<DisplayMode>().unwrap(),
            DisplayMode::WithSeconds
        );
        assert!(matches!(
            "hourly".parse::<DisplayMode>(),
            Err(ClockError::Config(_))
        ));
    }

    #[test]
    fn merged_overlays_only_present_fields() {
        let base = ClockConfig::default();
        let patch = ClockPatch {
            accent_color: Some("x".to_owned()),
            size: Some(-20),
            ..ClockPatch::default()
        };
        let next = base.merged(&patch);
        assert_eq!(next.display_mode, base.display_mode);
        assert_eq!(next.visual.accent_color, "x");
        // Negative sizes are stored as given.
        assert_eq!(next.visual.size, -20);
        assert_eq!(next.visual.face_color, base.visual.face_color);
    }

    #[test]
    fn empty_label_clears_label() {
        let mut base = ClockConfig::default();
        base.visual.label = Some("Kitchen".to_owned());
        let patch = ClockPatch {
            label: Some(String::new()),
            ..ClockPatch::default()
        };
        assert!(base.merged(&patch).visual.label.is_none());
    }

    #[test]
    fn patch_from_json_accepts_known_mode() {
        let patch = ClockPatch::from_json(r#"{"display_mode": "with_seconds"}"#).unwrap();
        assert_eq!(patch.display_mode, Some(DisplayMode::WithSeconds));
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_from_json_accepts_alias() {
        let patch = ClockPatch::from_json(r#"{"display_mode": "seconds"}"#).unwrap();
        assert_eq!(patch.display_mode, Some(DisplayMode::WithSeconds));
    }

    #[test]
    fn patch_from_json_rejects_unknown_mode() {
        let result = ClockPatch::from_json(r#"{"display_mode": "hourly"}"#);
        assert!(matches!(result, Err(ClockError::Config(_))));
    }

    #[test]
    fn patch_from_toml_parses_colors() {
        let patch = ClockPatch::from_toml(
            r##"
accent_color = "#00ff00"
label = "Kitchen"
"##,
        )
        .unwrap();
        assert_eq!(patch.accent_color.as_deref(), Some("#00ff00"));
        assert_eq!(patch.label.as_deref(), Some("Kitchen"));
        assert!(patch.display_mode.is_none());
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(ClockPatch::default().is_empty());
        assert!(ClockPatch::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn settings_missing_sections_use_defaults() {
        let settings: ClockSettings = toml::from_str("[clock]").unwrap();
        assert_eq!(settings, ClockSettings::default());
    }

    #[test]
    fn settings_deserialize_flattened_visuals() {
        let toml_str = r##"
[clock]
display_mode = "with_seconds"
size = 240
accent_color = "#123456"

[demo]
redraws = 2
start_hidden = true
"##;
        let settings: ClockSettings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.clock.display_mode, DisplayMode::WithSeconds);
        assert_eq!(settings.clock.visual.size, 240);
        assert_eq!(settings.clock.visual.accent_color, "#123456");
        assert_eq!(settings.clock.visual.hand_color, "#1f2937");
        assert_eq!(settings.demo.redraws, 2);
        assert!(settings.demo.start_hidden);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = ClockSettings::default();
        settings.clock.display_mode = DisplayMode::WithSeconds;
        settings.clock.visual.label = Some("Hallway".to_owned());
        settings.demo.redraws = 9;

        settings.save_to_file(&path).expect("save");
        let loaded = ClockSettings::from_file(&path).expect("load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = ClockSettings::from_file(std::path::Path::new("/nonexistent/clockface.toml"));
        assert!(matches!(result, Err(ClockError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[clock]\ndisplay_mode = \"hourly\"\n").unwrap();
        let result = ClockSettings::from_file(&path);
        assert!(matches!(result, Err(ClockError::Config(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = ClockSettings::default_config_path();
        assert!(path.ends_with("clockface/config.toml"));
    }
}
