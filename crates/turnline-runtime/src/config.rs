#![forbid(unsafe_code)]

//! Timeline configuration.
//!
//! Every tunable of the timeline lives in one [`TimelineConfig`], grouped by
//! the engine it feeds. Defaults reproduce the constants the engines ship
//! with, so `TimelineConfig::default()` behaves exactly like constructing
//! each engine with its own defaults.
//!
//! # Loading
//!
//! With the `config-files` feature the config can be read from TOML or JSON.
//! Missing sections and fields fall back to their defaults.
//!
//! ```toml
//! [sync]
//! reference_fraction = 0.4
//! min_active_change_interval_ms = 150
//!
//! [tooltip]
//! width_tiers = [320.0, 240.0, 160.0]
//! ```
//!
//! ```rust,ignore
//! let config = TimelineConfig::from_toml_file("turnline.toml")?;
//! ```

#[cfg(feature = "config-files")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use turnline_core::marker::{DEFAULT_LABEL_PREFIXES, DEFAULT_SUMMARY_GRAPHEMES, SummaryRules};
use turnline_layout::drag::DragConfig;
use turnline_layout::tooltip::{
    DEFAULT_MAX_LINES, DEFAULT_TOOLTIP_GAP, DEFAULT_VIEWPORT_PADDING, DEFAULT_WIDTH_TIERS,
    TooltipConfig,
};
use turnline_layout::track::{
    DEFAULT_MARKER_SIZE, DEFAULT_MIN_GAP, DEFAULT_MIN_THUMB, DEFAULT_TRACK_PADDING, TrackConfig,
};

/// Fraction of the main viewport height where the reference line sits.
pub const DEFAULT_REFERENCE_FRACTION: f64 = 0.45;
/// Minimum spacing between two committed active-marker changes.
pub const DEFAULT_MIN_ACTIVE_CHANGE_INTERVAL_MS: u64 = 120;

// ---------------------------------------------------------------------------
// Top-level TimelineConfig
// ---------------------------------------------------------------------------

/// All tunables of a timeline instance.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct TimelineConfig {
    /// Marker placement on the track.
    pub track: TrackSection,
    /// Main-document to track synchronisation.
    pub sync: SyncSection,
    /// Tooltip placement and truncation.
    pub tooltip: TooltipSection,
    /// Dragging the timeline panel.
    pub drag: DragSection,
    /// Debounce and retry timings.
    pub schedule: ScheduleSection,
    /// Marker summaries.
    pub model: ModelSection,
}

impl TimelineConfig {
    /// Load from a TOML string. Rejects configs that fail [`validate`](Self::validate).
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string. Rejects configs that fail [`validate`](Self::validate).
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Return `self` if valid, otherwise every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check every parameter is within its acceptable range.
    ///
    /// Returns a list of human-readable problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        non_negative(&mut errors, "track.padding", self.track.padding);
        non_negative(&mut errors, "track.min_gap", self.track.min_gap);
        non_negative(&mut errors, "track.marker_size", self.track.marker_size);
        non_negative(&mut errors, "track.min_thumb", self.track.min_thumb);
        non_negative(&mut errors, "track.visible_buffer", self.track.visible_buffer);

        if !(0.0..=1.0).contains(&self.sync.reference_fraction) {
            errors.push(format!(
                "sync.reference_fraction must be in [0, 1], got {}",
                self.sync.reference_fraction
            ));
        }

        if self.tooltip.width_tiers.is_empty() {
            errors.push("tooltip.width_tiers must not be empty".into());
        }
        for tier in &self.tooltip.width_tiers {
            if !tier.is_finite() || *tier <= 0.0 {
                errors.push(format!("tooltip.width_tiers must be > 0, got {tier}"));
            }
        }
        non_negative(&mut errors, "tooltip.gap", self.tooltip.gap);
        non_negative(
            &mut errors,
            "tooltip.viewport_padding",
            self.tooltip.viewport_padding,
        );
        if self.tooltip.max_lines == 0 {
            errors.push("tooltip.max_lines must be > 0".into());
        }

        non_negative(&mut errors, "drag.margin", self.drag.margin);
        if !(0.0..1.0).contains(&self.drag.bounce_factor) {
            errors.push(format!(
                "drag.bounce_factor must be in [0, 1), got {}",
                self.drag.bounce_factor
            ));
        }
        non_negative(
            &mut errors,
            "drag.near_boundary_threshold",
            self.drag.near_boundary_threshold,
        );
        non_negative(&mut errors, "drag.drag_threshold", self.drag.drag_threshold);

        if self.schedule.bootstrap_max_attempts == 0 {
            errors.push("schedule.bootstrap_max_attempts must be > 0".into());
        }

        if self.model.max_summary_graphemes == 0 {
            errors.push("model.max_summary_graphemes must be > 0".into());
        }

        errors
    }

    /// Build a [`TrackConfig`] from this config.
    #[must_use]
    pub fn to_track_config(&self) -> TrackConfig {
        TrackConfig {
            padding: self.track.padding,
            min_gap: self.track.min_gap,
            marker_size: self.track.marker_size,
            long_canvas: self.track.long_canvas,
            min_thumb: self.track.min_thumb,
        }
    }

    /// Build a [`TooltipConfig`] from this config.
    #[must_use]
    pub fn to_tooltip_config(&self) -> TooltipConfig {
        TooltipConfig {
            width_tiers: self.tooltip.width_tiers.clone(),
            gap: self.tooltip.gap,
            viewport_padding: self.tooltip.viewport_padding,
            max_lines: self.tooltip.max_lines,
            ellipsis: self.tooltip.ellipsis.clone(),
        }
    }

    /// Build a [`DragConfig`] from this config.
    #[must_use]
    pub fn to_drag_config(&self) -> DragConfig {
        DragConfig {
            margin: self.drag.margin,
            bounce_factor: self.drag.bounce_factor,
            near_boundary_threshold: self.drag.near_boundary_threshold,
            drag_threshold: self.drag.drag_threshold,
        }
    }

    /// Build [`SummaryRules`] from this config.
    #[must_use]
    pub fn to_summary_rules(&self) -> SummaryRules {
        SummaryRules {
            label_prefixes: self.model.label_prefixes.clone(),
            max_graphemes: self.model.max_summary_graphemes,
        }
    }
}

fn non_negative(errors: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{name} must be >= 0, got {value}"));
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Track placement parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct TrackSection {
    pub padding: f64,
    pub min_gap: f64,
    pub marker_size: f64,
    /// Let the track content grow past its viewport instead of shrinking the gap.
    pub long_canvas: bool,
    pub min_thumb: f64,
    /// Extra pixels rendered above and below the track viewport.
    pub visible_buffer: f64,
}

impl Default for TrackSection {
    fn default() -> Self {
        Self {
            padding: DEFAULT_TRACK_PADDING,
            min_gap: DEFAULT_MIN_GAP,
            marker_size: DEFAULT_MARKER_SIZE,
            long_canvas: true,
            min_thumb: DEFAULT_MIN_THUMB,
            visible_buffer: 100.0,
        }
    }
}

/// Scroll synchronisation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct SyncSection {
    pub reference_fraction: f64,
    pub min_active_change_interval_ms: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            reference_fraction: DEFAULT_REFERENCE_FRACTION,
            min_active_change_interval_ms: DEFAULT_MIN_ACTIVE_CHANGE_INTERVAL_MS,
        }
    }
}

impl SyncSection {
    #[must_use]
    pub fn min_active_change_interval(&self) -> Duration {
        Duration::from_millis(self.min_active_change_interval_ms)
    }
}

/// Tooltip parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct TooltipSection {
    pub width_tiers: Vec<f64>,
    pub gap: f64,
    pub viewport_padding: f64,
    pub max_lines: usize,
    pub ellipsis: String,
}

impl Default for TooltipSection {
    fn default() -> Self {
        Self {
            width_tiers: DEFAULT_WIDTH_TIERS.to_vec(),
            gap: DEFAULT_TOOLTIP_GAP,
            viewport_padding: DEFAULT_VIEWPORT_PADDING,
            max_lines: DEFAULT_MAX_LINES,
            ellipsis: "…".into(),
        }
    }
}

/// Panel drag parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct DragSection {
    pub margin: f64,
    pub bounce_factor: f64,
    pub near_boundary_threshold: f64,
    pub drag_threshold: f64,
}

impl Default for DragSection {
    fn default() -> Self {
        let defaults = DragConfig::default();
        Self {
            margin: defaults.margin,
            bounce_factor: defaults.bounce_factor,
            near_boundary_threshold: defaults.near_boundary_threshold,
            drag_threshold: defaults.drag_threshold,
        }
    }
}

/// Debounce, idle, and retry timings, all in milliseconds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ScheduleSection {
    /// Settle time before a structural change triggers a rebuild.
    pub rebuild_debounce_ms: u64,
    pub list_refresh_ms: u64,
    /// Settle time after a resize before the min-gap correction is queued.
    pub idle_correction_ms: u64,
    /// How long a queued correction waits for an idle callback.
    pub idle_timeout_ms: u64,
    /// How long zero turns must persist before markers are cleared.
    pub empty_grace_ms: u64,
    pub bootstrap_interval_ms: u64,
    pub bootstrap_max_attempts: u32,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            rebuild_debounce_ms: 350,
            list_refresh_ms: 150,
            idle_correction_ms: 140,
            idle_timeout_ms: 200,
            empty_grace_ms: 800,
            bootstrap_interval_ms: 300,
            bootstrap_max_attempts: 10,
        }
    }
}

impl ScheduleSection {
    #[must_use]
    pub fn rebuild_debounce(&self) -> Duration {
        Duration::from_millis(self.rebuild_debounce_ms)
    }

    #[must_use]
    pub fn list_refresh(&self) -> Duration {
        Duration::from_millis(self.list_refresh_ms)
    }

    #[must_use]
    pub fn idle_correction(&self) -> Duration {
        Duration::from_millis(self.idle_correction_ms)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    #[must_use]
    pub fn empty_grace(&self) -> Duration {
        Duration::from_millis(self.empty_grace_ms)
    }

    #[must_use]
    pub fn bootstrap_interval(&self) -> Duration {
        Duration::from_millis(self.bootstrap_interval_ms)
    }
}

/// Marker summary parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ModelSection {
    /// Leading labels stripped from summaries, matched case-insensitively.
    pub label_prefixes: Vec<String>,
    pub max_summary_graphemes: usize,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            label_prefixes: DEFAULT_LABEL_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            max_summary_graphemes: DEFAULT_SUMMARY_GRAPHEMES,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading or validating a [`TimelineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_engine_defaults() {
        let config = TimelineConfig::default();
        assert_eq!(config.to_track_config(), TrackConfig::default());
        assert_eq!(config.to_tooltip_config(), TooltipConfig::default());
        assert_eq!(config.to_drag_config(), DragConfig::default());
        assert_eq!(config.to_summary_rules(), SummaryRules::default());
        assert_eq!(config.sync.reference_fraction, 0.45);
        assert_eq!(
            config.sync.min_active_change_interval(),
            Duration::from_millis(120)
        );
    }

    #[test]
    fn default_is_valid() {
        assert!(TimelineConfig::default().validate().is_empty());
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut config = TimelineConfig::default();
        config.sync.reference_fraction = 1.5;
        config.tooltip.width_tiers = vec![200.0, -1.0];
        config.drag.bounce_factor = 1.0;
        config.track.padding = f64::NAN;

        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("sync.reference_fraction")));
        assert!(errors.iter().any(|e| e.starts_with("track.padding")));
    }

    #[test]
    fn validated_wraps_errors() {
        let mut config = TimelineConfig::default();
        config.schedule.bootstrap_max_attempts = 0;
        let err = config.validated().unwrap_err();
        assert!(matches!(&err, ConfigError::Validation(v) if v.len() == 1));
        assert!(err.to_string().contains("bootstrap_max_attempts"));
    }

    #[test]
    fn schedule_durations() {
        let schedule = ScheduleSection::default();
        assert_eq!(schedule.rebuild_debounce(), Duration::from_millis(350));
        assert_eq!(schedule.list_refresh(), Duration::from_millis(150));
        assert_eq!(schedule.idle_correction(), Duration::from_millis(140));
        assert_eq!(schedule.empty_grace(), Duration::from_millis(800));
        assert_eq!(schedule.bootstrap_interval(), Duration::from_millis(300));
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn partial_toml_uses_defaults() {
        let config = TimelineConfig::from_toml_str(
            r#"
            [sync]
            reference_fraction = 0.4

            [tooltip]
            width_tiers = [320.0, 160.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.reference_fraction, 0.4);
        assert_eq!(config.sync.min_active_change_interval_ms, 120);
        assert_eq!(config.tooltip.width_tiers, vec![320.0, 160.0]);
        assert_eq!(config.track, TrackSection::default());
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn json_loader_validates() {
        let err = TimelineConfig::from_json_str(r#"{"tooltip": {"max_lines": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let config = TimelineConfig::from_json_str(r#"{"track": {"long_canvas": false}}"#).unwrap();
        assert!(!config.track.long_canvas);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnline.toml");
        std::fs::write(&path, "[schedule]\nempty_grace_ms = 1000\n").unwrap();
        let config = TimelineConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.schedule.empty_grace_ms, 1000);

        let missing = TimelineConfig::from_toml_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
