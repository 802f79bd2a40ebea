#![forbid(unsafe_code)]

//! Turnline Runtime
//!
//! This crate drives a timeline: it turns host signals and wall-clock time
//! into geometry passes, active-marker changes, and render calls.
//!
//! # Key Components
//!
//! - [`TimelineController`] - Owns all timeline state; the single entry point for hosts
//! - [`TimelineHost`] - Trait the embedder implements to receive side effects
//! - [`TimelineSignal`] - Observer notifications sent over an mpsc channel
//! - [`TimelineConfig`] - Every tunable, optionally loaded from TOML or JSON
//! - [`ActiveState`] - Rate-limited active marker selection
//! - [`PersistenceGate`] - Settings storage that disables itself on failure
//! - [`Bootstrap`] - Bounded discovery retry at startup
//!
//! # Role in Turnline
//! `turnline-core` owns the marker data and discovery strategies and
//! `turnline-layout` owns the pure geometry. This crate sequences them:
//! debounced rebuilds, one pipeline pass per animation frame, idle-time
//! corrections, and teardown.
//!
//! # Time
//! Nothing here reads a clock or spawns a thread. Every entry point takes
//! `now`, and hosts wake the controller at
//! [`TimelineController::next_deadline`].

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod persistence;
pub mod scheduler;
pub mod scroll_sync;

pub use bootstrap::{Bootstrap, BootstrapState, BootstrapStep};
pub use config::{
    ConfigError, DEFAULT_MIN_ACTIVE_CHANGE_INTERVAL_MS, DEFAULT_REFERENCE_FRACTION,
    DragSection, ModelSection, ScheduleSection, SyncSection, TimelineConfig, TooltipSection,
    TrackSection,
};
pub use controller::{Lifecycle, TimelineController, TimelineHost, TimelineSignal, TrackFrame};
pub use persistence::{
    JsonFileStore, MemoryStore, POSITION_KEY, PersistenceError, PersistenceGate,
    STARRED_KEY_PREFIX, SettingsStore, starred_key,
};
pub use scheduler::{FrameGate, TimerKind, TimerSet};
pub use scroll_sync::{
    ActiveDecision, ActiveState, ScrollMetrics, compute_active_by_scroll, compute_track_scroll,
};
