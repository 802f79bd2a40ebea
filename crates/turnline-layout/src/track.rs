#![forbid(unsafe_code)]

//! Track geometry: mapping markers onto a fixed-height track.
//!
//! [`GeometryEngine`] distributes `N` markers evenly over the usable height
//! of the track, then runs [`apply_min_gap`] so adjacent dots never sit
//! closer than the configured gap. When the configured gap cannot fit, the
//! track either grows taller than its viewport (long-canvas mode, the track
//! then scrolls) or the gap is reduced to the largest feasible value.
//!
//! # Invariants
//!
//! 1. The gap handed to [`apply_min_gap`] never exceeds
//!    `usable_height / max(1, N - 1)`.
//! 2. Every resolved pixel position lies in `[padding, padding + usable]`.
//! 3. For `N >= 2` with a positive usable height, pixel positions strictly
//!    increase with marker index.
//! 4. `track_scroll_top` always lies in `[0, max_track_scroll]`.

use std::ops::Range;

use turnline_core::geometry::{clamp_soft, ratio_floored};
use turnline_core::marker::Marker;

/// Default vertical padding at both ends of the track, in pixels.
pub const DEFAULT_TRACK_PADDING: f64 = 12.0;
/// Default minimum distance between adjacent marker positions.
pub const DEFAULT_MIN_GAP: f64 = 12.0;
/// Default marker dot diameter.
pub const DEFAULT_MARKER_SIZE: f64 = 12.0;
/// Default minimum slider thumb height.
pub const DEFAULT_MIN_THUMB: f64 = 24.0;

/// Tunables for the track engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackConfig {
    pub padding: f64,
    pub min_gap: f64,
    pub marker_size: f64,
    /// Grow the track content beyond its viewport when the gap does not fit.
    pub long_canvas: bool,
    pub min_thumb: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_TRACK_PADDING,
            min_gap: DEFAULT_MIN_GAP,
            marker_size: DEFAULT_MARKER_SIZE,
            long_canvas: true,
            min_thumb: DEFAULT_MIN_THUMB,
        }
    }
}

/// Resolved track dimensions for the current marker set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackGeometry {
    /// Height of the track viewport.
    pub bar_height: f64,
    pub padding: f64,
    /// The gap actually applied (after capping to what fits).
    pub min_gap: f64,
    /// Total scrollable height of the track content.
    pub content_height: f64,
    pub track_scroll_top: f64,
    pub marker_size: f64,
}

impl TrackGeometry {
    /// Height available for marker positions.
    #[inline]
    pub fn usable_height(&self) -> f64 {
        (self.content_height - 2.0 * self.padding).max(0.0)
    }

    #[inline]
    pub fn max_track_scroll(&self) -> f64 {
        (self.content_height - self.bar_height).max(0.0)
    }

    /// True when the content is taller than the track viewport.
    #[inline]
    pub fn overflows(&self) -> bool {
        self.max_track_scroll() > 0.0
    }

    /// Pixel position for a normalized position.
    #[inline]
    pub fn pixel_for(&self, n: f64) -> f64 {
        self.padding + clamp_soft(n, 0.0, 1.0) * self.usable_height()
    }

    /// Visual center of a dot whose top sits at `pixel_position`.
    ///
    /// `Marker::pixel_position` is the dot's top edge, not its center.
    /// Hosts that anchor dots by their center position them here: a lone
    /// marker at pixel 100 with 12 px dots is drawn centered at 106.
    #[inline]
    pub fn marker_center(&self, pixel_position: f64) -> f64 {
        pixel_position + self.marker_size / 2.0
    }
}

/// Geometry of the track's own scroll handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderThumb {
    pub top: f64,
    pub height: f64,
    /// Distance the thumb can travel.
    pub travel: f64,
}

/// Content height for `count` markers on a track of `bar_height`.
///
/// In long-canvas mode the content grows so the full gap fits; otherwise it
/// equals the viewport height.
#[must_use]
pub fn content_height_for(count: usize, bar_height: f64, padding: f64, gap: f64, long: bool) -> f64 {
    let bar_height = bar_height.max(0.0);
    if !long || count < 2 {
        return bar_height;
    }
    let needed = 2.0 * padding + gap.max(0.0) * (count - 1) as f64;
    bar_height.max(needed)
}

/// Cap `gap` to the largest value that fits `count` markers in `usable`.
#[must_use]
pub fn effective_gap(gap: f64, usable: f64, count: usize) -> f64 {
    let gap = gap.max(0.0);
    if count < 2 {
        return gap;
    }
    gap.min(usable.max(0.0) / (count - 1) as f64)
}

/// Evenly distribute `count` normalized positions.
///
/// One marker sits at the center (`0.5`); more markers span `[0, 1]`.
#[must_use]
pub fn distribute(count: usize, usable: f64) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.5],
        _ => {
            let usable = usable.max(0.0);
            let step = usable / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let position = clamp_soft(step * i as f64, 0.0, usable);
                    if usable > 0.0 {
                        clamp_soft(position / usable, 0.0, 1.0)
                    } else {
                        // Zero-height track: keep the logical order.
                        i as f64 / (count - 1) as f64
                    }
                })
                .collect()
        }
    }
}

/// Enforce a minimum spacing between desired positions within
/// `[min_top, max_top]`.
///
/// A forward pass pushes positions down to keep `gap`; if that overruns
/// `max_top`, a backward pass compresses toward the top, and a second
/// forward pass repairs any underrun at `min_top`. Every output is finally
/// clamped into range, so an infeasible gap degrades to a smaller effective
/// spacing rather than escaping the track.
#[must_use]
pub fn apply_min_gap(desired: &[f64], min_top: f64, max_top: f64, gap: f64) -> Vec<f64> {
    let len = desired.len();
    if len == 0 {
        return Vec::new();
    }
    let max_top = max_top.max(min_top);
    let gap = gap.max(0.0);

    let mut out = vec![0.0; len];
    forward_pass(desired, &mut out, min_top, max_top, gap);

    let last = len - 1;
    if out[last] > max_top {
        out[last] = max_top;
        for i in (0..last).rev() {
            out[i] = out[i].min(out[i + 1] - gap);
        }
        if out[0] < min_top {
            let compressed = out.clone();
            forward_pass(&compressed, &mut out, min_top, max_top, gap);
        }
    }

    for value in &mut out {
        *value = clamp_soft(*value, min_top, max_top);
    }
    out
}

fn forward_pass(source: &[f64], out: &mut [f64], min_top: f64, max_top: f64, gap: f64) {
    out[0] = clamp_soft(source[0], min_top, max_top);
    for i in 1..source.len() {
        out[i] = source[i].max(out[i - 1] + gap);
    }
}

/// Maps marker counts and track dimensions to marker positions.
#[derive(Debug, Clone, Default)]
pub struct GeometryEngine {
    config: TrackConfig,
    geometry: TrackGeometry,
}

impl GeometryEngine {
    #[must_use]
    pub fn new(config: TrackConfig) -> Self {
        Self {
            config,
            geometry: TrackGeometry {
                padding: config.padding,
                min_gap: config.min_gap,
                marker_size: config.marker_size,
                ..TrackGeometry::default()
            },
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    #[must_use]
    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    /// Full recompute: distribute, enforce the gap, and write `n`, `base_n`
    /// and `pixel_position` on every marker.
    ///
    /// Degenerate inputs (no markers, zero-height track) leave the markers'
    /// relative order intact and never panic.
    pub fn recompute(&mut self, markers: &mut [Marker], bar_height: f64) -> TrackGeometry {
        let count = markers.len();
        let padding = self.config.padding.max(0.0);
        let bar_height = if bar_height.is_finite() { bar_height.max(0.0) } else { 0.0 };
        let content_height = content_height_for(
            count,
            bar_height,
            padding,
            self.config.min_gap,
            self.config.long_canvas,
        );

        self.geometry.bar_height = bar_height;
        self.geometry.padding = padding;
        self.geometry.content_height = content_height;
        self.geometry.marker_size = self.config.marker_size;
        self.geometry.min_gap =
            effective_gap(self.config.min_gap, self.geometry.usable_height(), count);
        self.geometry.track_scroll_top = clamp_soft(
            self.geometry.track_scroll_top,
            0.0,
            self.geometry.max_track_scroll(),
        );

        if count == 0 {
            return self.geometry;
        }

        let base = distribute(count, self.geometry.usable_height());
        for (marker, n) in markers.iter_mut().zip(&base) {
            marker.base_n = *n;
            marker.n = *n;
        }
        self.resolve_pixels(markers);

        tracing::trace!(
            target: "turnline.track",
            count,
            bar_height,
            content_height,
            gap = self.geometry.min_gap,
            "track geometry recomputed"
        );
        self.geometry
    }

    /// Idle-time correction: re-derive pixel positions from the cached
    /// normalized positions without redistributing.
    pub fn reapply(&mut self, markers: &mut [Marker]) {
        if markers.is_empty() {
            return;
        }
        self.geometry.min_gap =
            effective_gap(self.config.min_gap, self.geometry.usable_height(), markers.len());
        self.resolve_pixels(markers);
        tracing::trace!(target: "turnline.track", count = markers.len(), "min-gap correction applied");
    }

    fn resolve_pixels(&mut self, markers: &mut [Marker]) {
        let geometry = self.geometry;
        let usable = geometry.usable_height();
        let min_top = geometry.padding;
        let max_top = geometry.padding + usable;

        let desired: Vec<f64> = markers.iter().map(|m| geometry.pixel_for(m.n)).collect();
        let resolved = apply_min_gap(&desired, min_top, max_top, geometry.min_gap);

        for (marker, pixel) in markers.iter_mut().zip(resolved) {
            marker.pixel_position = Some(pixel);
            if usable > 0.0 {
                marker.n = clamp_soft((pixel - min_top) / usable, 0.0, 1.0);
            }
        }
    }

    /// Set the track's internal scroll offset, clamped to the valid range.
    pub fn set_track_scroll(&mut self, scroll_top: f64) -> f64 {
        let clamped = if scroll_top.is_finite() {
            clamp_soft(scroll_top, 0.0, self.geometry.max_track_scroll())
        } else {
            0.0
        };
        self.geometry.track_scroll_top = clamped;
        clamped
    }

    /// Index range of markers inside the track viewport, widened by
    /// `buffer` pixels on both sides.
    ///
    /// Relies on pixel positions being non-decreasing, which
    /// [`apply_min_gap`] guarantees.
    #[must_use]
    pub fn visible_range(&self, markers: &[Marker], buffer: f64) -> Range<usize> {
        let top = self.geometry.track_scroll_top - buffer.max(0.0);
        let bottom = self.geometry.track_scroll_top + self.geometry.bar_height + buffer.max(0.0);
        let position = |m: &Marker| m.pixel_position.unwrap_or(self.geometry.padding);

        let start = markers.partition_point(|m| position(m) + self.geometry.marker_size < top);
        let end = markers.partition_point(|m| position(m) <= bottom);
        start..end.max(start)
    }

    /// Slider thumb geometry, or `None` when the track does not scroll.
    #[must_use]
    pub fn slider_thumb(&self) -> Option<SliderThumb> {
        let geometry = &self.geometry;
        if !geometry.overflows() || geometry.bar_height <= 0.0 {
            return None;
        }
        let proportional =
            geometry.bar_height * ratio_floored(geometry.bar_height, geometry.content_height);
        let height = clamp_soft(proportional, self.config.min_thumb, geometry.bar_height);
        let travel = (geometry.bar_height - height).max(0.0);
        let progress = ratio_floored(geometry.track_scroll_top, geometry.max_track_scroll());
        Some(SliderThumb {
            top: clamp_soft(progress, 0.0, 1.0) * travel,
            height,
            travel,
        })
    }

    /// Track scroll offset that corresponds to a dragged thumb top.
    #[must_use]
    pub fn scroll_for_thumb_top(&self, thumb_top: f64) -> f64 {
        let Some(thumb) = self.slider_thumb() else {
            return 0.0;
        };
        let progress = clamp_soft(ratio_floored(thumb_top, thumb.travel), 0.0, 1.0);
        progress * self.geometry.max_track_scroll()
    }
}
