#![forbid(unsafe_code)]

//! Pure layout engines for the turn timeline.
//!
//! Nothing in this crate reads a clock or touches a host surface: every
//! engine takes dimensions in and hands positions out, so the runtime can
//! drive them from whatever frame source it owns.
//!
//! - [`track`]: marker positions on the track, min-gap enforcement, and the
//!   track's own scroll handle.
//! - [`tooltip`]: side/width selection and line-budget truncation.
//! - [`text`]: the [`TextMeasure`] seam plus a fixed-advance measurer.
//! - [`drag`]: rubber-band dragging and percentage-based position snapshots.

pub mod drag;
pub mod text;
pub mod tooltip;
pub mod track;

pub use drag::{
    DragConfig, DragConstraintEngine, DragRelease, DragSession, DragUpdate,
    POSITION_SCHEMA_VERSION, PositionSnapshot, clamp_rect, damp_axis,
};
pub use text::{CellMeasure, TextMeasure, TextMetrics, display_width, wrapped_line_count};
pub use tooltip::{
    PlacementInfo, Side, TooltipConfig, TooltipLayout, TooltipLayoutEngine, TooltipPlacement,
    Truncation,
};
pub use track::{
    GeometryEngine, SliderThumb, TrackConfig, TrackGeometry, apply_min_gap, content_height_for,
    distribute, effective_gap,
};
