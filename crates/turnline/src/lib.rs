#![forbid(unsafe_code)]

//! Turnline public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from internal crates and offers a lightweight
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use turnline_core::discovery::{DiscoveryChain, DiscoveryMatch, FnSource, TurnSource};
pub use turnline_core::geometry::{Point, Rect, Size};
pub use turnline_core::marker::{
    Marker, MarkerModel, RebuildOutcome, SourceRef, SummaryRules, TurnRecord,
};

// --- Layout re-exports -----------------------------------------------------

pub use turnline_layout::{
    CellMeasure, DragRelease, DragUpdate, PositionSnapshot, Side, SliderThumb, TextMeasure,
    TextMetrics, TooltipLayout, TrackGeometry,
};

// --- Runtime re-exports ----------------------------------------------------

pub use turnline_runtime::{
    ConfigError, JsonFileStore, Lifecycle, MemoryStore, PersistenceError, ScrollMetrics,
    SettingsStore, TimelineConfig, TimelineController, TimelineHost, TimelineSignal, TrackFrame,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for turnline embedders.
#[derive(Debug)]
pub enum Error {
    /// Configuration failed to load or validate.
    Config(ConfigError),
    /// A settings backend failed.
    Persistence(PersistenceError),
    /// I/O failure outside a backend.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Persistence(err) => write!(f, "persistence: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for turnline APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DiscoveryChain, Error, FnSource, Marker, Point, Rect, Result, ScrollMetrics, Size,
        SourceRef, TimelineConfig, TimelineController, TimelineHost, TimelineSignal, TrackFrame,
        TurnRecord,
    };

    pub use crate::{core, layout, runtime};
}

pub use turnline_core as core;
pub use turnline_layout as layout;
pub use turnline_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn build(config: TimelineConfig) -> Result<TimelineController> {
        Ok(TimelineController::new(config)?)
    }

    #[test]
    fn config_errors_convert() {
        let mut config = TimelineConfig::default();
        config.sync.reference_fraction = 2.0;
        let err = build(config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
        assert!(err.to_string().starts_with("config: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::other("disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }

    #[test]
    fn default_config_builds() {
        assert!(build(TimelineConfig::default()).is_ok());
    }
}
