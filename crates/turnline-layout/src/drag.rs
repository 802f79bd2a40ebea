#![forbid(unsafe_code)]

//! Free dragging of the timeline with rubber-band edges and
//! resolution-independent persistence.
//!
//! A [`DragSession`] lives from pointer-down to pointer-up. While it moves,
//! the element follows the pointer 1:1 inside the viewport margins; past a
//! margin only a fraction of the overflow is applied, so the element resists
//! like a rubber band. On release the element snaps back inside the margins
//! and its rectangle is stored as percentages of the viewport, so a restore
//! at a different viewport size relocates it proportionally.
//!
//! # State Machine
//!
//! `Idle --begin--> Pressed --(travel >= threshold)--> Dragging --end--> Idle`
//!
//! A press released before reaching the threshold is a click and persists
//! nothing.

use serde::{Deserialize, Serialize};
use turnline_core::geometry::{Point, Rect, Size, clamp_soft, ratio_floored};

/// Current persisted position schema version.
pub const POSITION_SCHEMA_VERSION: u16 = 1;

/// Tunables for dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Distance kept from every viewport edge.
    pub margin: f64,
    /// Fraction of overflow applied past a margin (`0 < f < 1`).
    pub bounce_factor: f64,
    /// Distance from a viewport edge that counts as "near".
    pub near_boundary_threshold: f64,
    /// Pointer travel before a press becomes a drag.
    pub drag_threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            bounce_factor: 0.35,
            near_boundary_threshold: 24.0,
            drag_threshold: 3.0,
        }
    }
}

/// One drag gesture, from pointer-down to pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub start_pointer: Point,
    pub start_rect: Rect,
    pub margin: f64,
    pub bounce_factor: f64,
    engaged: bool,
}

impl DragSession {
    /// True once the pointer has travelled past the drag threshold.
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

/// Result of one pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub rect: Rect,
    /// Distance from the element's right edge to the viewport's right edge.
    pub right: f64,
    pub near_boundary: bool,
    /// True when rubber-band damping was applied on either axis.
    pub damped: bool,
}

/// Final position after a completed drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    pub rect: Rect,
    pub snapshot: PositionSnapshot,
}

/// Persisted position, in percent of the viewport at save time.
///
/// Serialized in camelCase. Unknown fields are ignored and `version`
/// defaults to 1, so older and newer blobs both load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSnapshot {
    #[serde(default = "default_schema_version")]
    pub version: u16,
    pub left_percent: f64,
    pub top_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
    /// Viewport width in pixels when saved.
    pub saved_viewport_width: f64,
    /// Viewport height in pixels when saved.
    pub saved_viewport_height: f64,
}

fn default_schema_version() -> u16 {
    POSITION_SCHEMA_VERSION
}

impl PositionSnapshot {
    /// Express `rect` as percentages of `viewport`.
    #[must_use]
    pub fn from_rect(rect: Rect, viewport: Size) -> Self {
        Self {
            version: POSITION_SCHEMA_VERSION,
            left_percent: ratio_floored(rect.x * 100.0, viewport.width),
            top_percent: ratio_floored(rect.y * 100.0, viewport.height),
            width_percent: ratio_floored(rect.width * 100.0, viewport.width),
            height_percent: ratio_floored(rect.height * 100.0, viewport.height),
            saved_viewport_width: viewport.width,
            saved_viewport_height: viewport.height,
        }
    }

    /// Convert back to pixels against the current `viewport`.
    #[must_use]
    pub fn to_rect(&self, viewport: Size) -> Rect {
        Rect::new(
            self.left_percent * viewport.width / 100.0,
            self.top_percent * viewport.height / 100.0,
            self.width_percent * viewport.width / 100.0,
            self.height_percent * viewport.height / 100.0,
        )
    }

    /// True when every field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.left_percent,
            self.top_percent,
            self.width_percent,
            self.height_percent,
            self.saved_viewport_width,
            self.saved_viewport_height,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Apply rubber-band damping to one axis.
///
/// Inside `[min, max]` the value is returned as-is; beyond a bound only
/// `factor` of the overflow is kept.
#[must_use]
pub fn damp_axis(raw: f64, min: f64, max: f64, factor: f64) -> f64 {
    let max = max.max(min);
    if raw < min {
        min - (min - raw) * factor
    } else if raw > max {
        max + (raw - max) * factor
    } else {
        raw
    }
}

/// Hard-clamp `rect` inside `viewport` minus `margin` on every side.
#[must_use]
pub fn clamp_rect(rect: Rect, viewport: Size, margin: f64) -> Rect {
    let x = clamp_soft(rect.x, margin, viewport.width - margin - rect.width);
    let y = clamp_soft(rect.y, margin, viewport.height - margin - rect.height);
    rect.with_origin(x, y)
}

/// Boundary-damped drag positioning.
#[derive(Debug, Clone, Default)]
pub struct DragConstraintEngine {
    config: DragConfig,
    session: Option<DragSession>,
    last: Option<DragUpdate>,
}

impl DragConstraintEngine {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            config: DragConfig {
                bounce_factor: clamp_soft(config.bounce_factor, 0.0, 0.99),
                margin: config.margin.max(0.0),
                ..config
            },
            session: None,
            last: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// True while a pointer is down on the handle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// True once the active press has become a drag.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some_and(|s| s.engaged)
    }

    /// Start a gesture. Any previous session is discarded.
    pub fn begin(&mut self, pointer: Point, rect: Rect) {
        self.session = Some(DragSession {
            start_pointer: pointer,
            start_rect: rect,
            margin: self.config.margin,
            bounce_factor: self.config.bounce_factor,
            engaged: false,
        });
        self.last = None;
        tracing::trace!(target: "turnline.drag", x = pointer.x, y = pointer.y, "drag pressed");
    }

    /// Follow the pointer. Returns `None` without a session or before the
    /// drag threshold is reached.
    pub fn update(&mut self, pointer: Point, viewport: Size) -> Option<DragUpdate> {
        let threshold = self.config.drag_threshold;
        let near = self.config.near_boundary_threshold;
        let session = self.session.as_mut()?;

        if !session.engaged {
            if pointer.manhattan(session.start_pointer) < threshold {
                return None;
            }
            session.engaged = true;
            tracing::debug!(target: "turnline.drag", "drag started");
        }

        let (dx, dy) = pointer.delta_from(session.start_pointer);
        let start = session.start_rect;
        let raw = start.translate(dx, dy);
        let margin = session.margin;
        let max_x = viewport.width - margin - start.width;
        let max_y = viewport.height - margin - start.height;

        let x = damp_axis(raw.x, margin, max_x, session.bounce_factor);
        let y = damp_axis(raw.y, margin, max_y, session.bounce_factor);
        let rect = raw.with_origin(x, y);
        let damped = x != raw.x || y != raw.y;

        let near_boundary = rect.x < near
            || rect.y < near
            || viewport.width - rect.right() < near
            || viewport.height - rect.bottom() < near;

        let update = DragUpdate {
            rect,
            right: rect.right_offset(viewport.width),
            near_boundary,
            damped,
        };
        self.last = Some(update);
        Some(update)
    }

    /// End the gesture. Returns the in-bounds release position, or `None`
    /// when the press never became a drag.
    pub fn end(&mut self, viewport: Size) -> Option<DragRelease> {
        let session = self.session.take()?;
        let last = self.last.take();
        if !session.engaged {
            return None;
        }
        let rect = clamp_rect(
            last.map_or(session.start_rect, |u| u.rect),
            viewport,
            session.margin,
        );
        let snapshot = PositionSnapshot::from_rect(rect, viewport);
        tracing::debug!(
            target: "turnline.drag",
            left_percent = snapshot.left_percent,
            top_percent = snapshot.top_percent,
            "drag released"
        );
        Some(DragRelease { rect, snapshot })
    }

    /// Abandon the gesture without producing a position.
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!(target: "turnline.drag", "drag cancelled");
        }
        self.last = None;
    }

    /// Convert a stored position to pixels for the current viewport and
    /// apply the same margin clamp used while dragging.
    #[must_use]
    pub fn restore(&self, snapshot: &PositionSnapshot, viewport: Size) -> Option<Rect> {
        if !snapshot.is_finite() || viewport.is_degenerate() {
            return None;
        }
        Some(clamp_rect(
            snapshot.to_rect(viewport),
            viewport,
            self.config.margin,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1000.0, 800.0);

    fn track_rect() -> Rect {
        // 24px wide, 40px from the right edge.
        Rect::new(1000.0 - 40.0 - 24.0, 100.0, 24.0, 400.0)
    }

    #[test]
    fn follows_pointer_inside_margins() {
        let mut drag = DragConstraintEngine::new(DragConfig::default());
        drag.begin(Point::new(500.0, 300.0), track_rect());
        let update = drag.update(Point::new(400.0, 320.0), VIEWPORT).expect("engaged");
        assert_eq!(update.rect.x, track_rect().x - 100.0);
        assert_eq!(update.rect.y, 120.0);
        assert!(!update.damped);
        assert!(!update.near_boundary);
    }

    #[test]
    fn press_below_threshold_is_not_a_drag() {
        let mut drag = DragConstraintEngine::new(DragConfig::default());
        drag.begin(Point::new(10.0, 10.0), track_rect());
        assert!(drag.update(Point::new(11.0, 10.0), VIEWPORT).is_none());
        assert!(drag.is_active());
        assert!(!drag.is_dragging());
        assert!(drag.end(VIEWPORT).is_none());
        assert!(!drag.is_active());
    }

    #[test]
    fn overflow_past_margin_is_damped() {
        let mut drag = DragConstraintEngine::new(DragConfig::default());
        let start = track_rect();
        drag.begin(Point::new(900.0, 300.0), start);
        let update = drag.update(Point::new(950.0, 300.0), VIEWPORT).expect("engaged");

        let moved = start.right_offset(1000.0) - update.right;
        assert!(moved > 0.0);
        assert!(moved < 50.0);
        assert!(update.damped);
        assert!(update.near_boundary);
        // 30px of free travel, then 20px of overflow at 0.35.
        assert!((update.right - 3.0).abs() < 1e-9);
    }

    #[test]
    fn damp_axis_is_identity_inside_bounds() {
        assert_eq!(damp_axis(5.0, 0.0, 10.0, 0.35), 5.0);
        assert_eq!(damp_axis(-10.0, 0.0, 10.0, 0.5), -5.0);
        assert_eq!(damp_axis(20.0, 0.0, 10.0, 0.5), 15.0);
    }

    #[test]
    fn release_snaps_inside_margins() {
        let mut drag = DragConstraintEngine::new(DragConfig::default());
        drag.begin(Point::new(900.0, 300.0), track_rect());
        drag.update(Point::new(1100.0, 300.0), VIEWPORT);
        let release = drag.end(VIEWPORT).expect("was dragging");
        assert_eq!(release.rect.right(), 990.0);
        assert!(!drag.is_active());
        assert_eq!(release.snapshot.saved_viewport_width, 1000.0);
    }

    #[test]
    fn snapshot_round_trip_same_viewport() {
        let drag = DragConstraintEngine::new(DragConfig::default());
        let rect = Rect::new(333.3, 222.2, 24.0, 400.0);
        let snapshot = PositionSnapshot::from_rect(rect, VIEWPORT);
        let restored = drag.restore(&snapshot, VIEWPORT).expect("finite snapshot");
        assert!((restored.x - rect.x).abs() < 1.0);
        assert!((restored.y - rect.y).abs() < 1.0);
    }

    #[test]
    fn restore_relocates_proportionally() {
        let drag = DragConstraintEngine::new(DragConfig::default());
        let snapshot = PositionSnapshot::from_rect(Rect::new(500.0, 400.0, 20.0, 100.0), VIEWPORT);
        let restored = drag
            .restore(&snapshot, Size::new(2000.0, 1600.0))
            .expect("finite snapshot");
        assert_eq!(restored, Rect::new(1000.0, 800.0, 40.0, 200.0));
    }

    #[test]
    fn restore_clamps_into_margins() {
        let drag = DragConstraintEngine::new(DragConfig::default());
        let snapshot = PositionSnapshot::from_rect(Rect::new(990.0, 790.0, 20.0, 100.0), VIEWPORT);
        let restored = drag.restore(&snapshot, VIEWPORT).expect("finite snapshot");
        assert_eq!(restored.right(), 990.0);
        assert_eq!(restored.bottom(), 790.0);
    }

    #[test]
    fn restore_rejects_bad_input() {
        let drag = DragConstraintEngine::new(DragConfig::default());
        let mut snapshot = PositionSnapshot::from_rect(Rect::new(1.0, 1.0, 1.0, 1.0), VIEWPORT);
        assert!(drag.restore(&snapshot, Size::new(0.0, 0.0)).is_none());
        snapshot.left_percent = f64::NAN;
        assert!(drag.restore(&snapshot, VIEWPORT).is_none());
    }

    #[test]
    fn snapshot_serializes_camel_case_and_tolerates_extra_fields() {
        let snapshot = PositionSnapshot::from_rect(Rect::new(100.0, 80.0, 10.0, 8.0), VIEWPORT);
        let json = serde_json::to_value(snapshot).expect("serialize");
        assert_eq!(json["leftPercent"], 10.0);
        assert_eq!(json["savedViewportHeight"], 800.0);

        let legacy = r#"{
            "leftPercent": 10, "topPercent": 10, "widthPercent": 1,
            "heightPercent": 1, "savedViewportWidth": 1000,
            "savedViewportHeight": 800, "dockedSide": "right"
        }"#;
        let parsed: PositionSnapshot = serde_json::from_str(legacy).expect("tolerant parse");
        assert_eq!(parsed.version, POSITION_SCHEMA_VERSION);
        assert_eq!(parsed.left_percent, 10.0);
    }

    #[test]
    fn cancel_discards_session() {
        let mut drag = DragConstraintEngine::new(DragConfig::default());
        drag.begin(Point::new(0.0, 0.0), track_rect());
        drag.update(Point::new(50.0, 0.0), VIEWPORT);
        drag.cancel();
        assert!(drag.end(VIEWPORT).is_none());
    }
}
