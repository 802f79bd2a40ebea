#![forbid(unsafe_code)]

//! Main-document to track synchronisation and the active-marker decision.
//!
//! The track is a read-only mirror of the main document: scrolling the main
//! document moves the track, never the other way around.
//!
//! Both mappings hinge on a *reference line* placed at a fixed fraction of
//! the main viewport (default 0.45, slightly above center). The active
//! marker is the last one whose document offset is at or above that line,
//! and the track scroll follows the line's progress through the span of
//! marker offsets.
//!
//! [`ActiveState`] rate-limits changes of the active marker so fast scrolls
//! do not make the highlight flicker through every turn: a change arriving
//! sooner than `min_interval` after the previous one is parked as *pending*
//! and committed when the interval expires, with later candidates simply
//! overwriting the parked one.

use std::time::Duration;

use turnline_core::geometry::{clamp_soft, ratio_floored};
use turnline_core::marker::Marker;
use turnline_layout::track::TrackGeometry;
use web_time::Instant;

/// Scroll state of the main document's scroll region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub const fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// Reference line in main-document coordinates.
    #[inline]
    #[must_use]
    pub fn reference_line(&self, fraction: f64) -> f64 {
        self.scroll_top + self.client_height * fraction
    }
}

/// Index of the active marker for a reference line.
///
/// The last marker whose offset is at or above the line wins; when none
/// qualifies, the first marker is active. `None` only for an empty list.
#[must_use]
pub fn compute_active_by_scroll(markers: &[Marker], reference_line: f64) -> Option<usize> {
    if markers.is_empty() {
        return None;
    }
    Some(
        markers
            .iter()
            .rposition(|m| m.document_offset <= reference_line)
            .unwrap_or(0),
    )
}

/// Track scroll offset that mirrors the main document.
///
/// Returns `None` while the user drags the track's scroll handle (leave the
/// track where they put it), `Some(0.0)` when the track content fits its
/// viewport, and otherwise the reference line's progress through the marker
/// offsets scaled to the track's scroll range.
#[must_use]
pub fn compute_track_scroll(
    markers: &[Marker],
    geometry: &TrackGeometry,
    metrics: &ScrollMetrics,
    reference_fraction: f64,
    slider_dragging: bool,
) -> Option<f64> {
    if slider_dragging {
        return None;
    }
    let (Some(first), Some(last)) = (markers.first(), markers.last()) else {
        return Some(0.0);
    };
    if !geometry.overflows() {
        return Some(0.0);
    }
    let span = last.document_offset - first.document_offset;
    let progress = ratio_floored(
        metrics.reference_line(reference_fraction) - first.document_offset,
        span,
    );
    Some(clamp_soft(progress, 0.0, 1.0) * geometry.max_track_scroll())
}

/// What a proposal did to the active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveDecision {
    /// The candidate is already active and nothing was pending.
    Unchanged,
    /// The candidate became active.
    Committed(String),
    /// Too soon after the last change; the candidate is pending until
    /// `deadline`.
    Deferred { deadline: Instant },
    /// The candidate matched the active id and cancelled a pending change.
    PendingCancelled,
}

/// Active marker with change-rate limiting.
#[derive(Debug, Clone)]
pub struct ActiveState {
    active_id: Option<String>,
    pending_id: Option<String>,
    last_change: Option<Instant>,
    commit_deadline: Option<Instant>,
    min_interval: Duration,
}

impl ActiveState {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            active_id: None,
            pending_id: None,
            last_change: None,
            commit_deadline: None,
            min_interval,
        }
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    #[must_use]
    pub fn pending_id(&self) -> Option<&str> {
        self.pending_id.as_deref()
    }

    #[must_use]
    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    /// When the pending change commits, if one is pending.
    #[must_use]
    pub fn commit_deadline(&self) -> Option<Instant> {
        self.commit_deadline
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Offer the decision of the current frame.
    pub fn propose(&mut self, candidate: &str, now: Instant) -> ActiveDecision {
        if self.active_id.as_deref() == Some(candidate) {
            if self.pending_id.take().is_some() {
                self.commit_deadline = None;
                tracing::trace!(target: "turnline.sync", id = candidate, "pending change cancelled");
                return ActiveDecision::PendingCancelled;
            }
            return ActiveDecision::Unchanged;
        }

        let earliest = match self.last_change {
            Some(last) if self.active_id.is_some() => last + self.min_interval,
            _ => now,
        };
        if now >= earliest {
            self.commit(candidate.to_string(), now);
            return ActiveDecision::Committed(candidate.to_string());
        }

        self.pending_id = Some(candidate.to_string());
        let deadline = *self.commit_deadline.get_or_insert(earliest);
        tracing::trace!(target: "turnline.sync", id = candidate, "active change deferred");
        ActiveDecision::Deferred { deadline }
    }

    /// The commit timer fired. Returns the newly active id, if the pending
    /// candidate still differs from the active one.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        self.commit_deadline = None;
        let pending = self.pending_id.take()?;
        if self.active_id.as_deref() == Some(pending.as_str()) {
            return None;
        }
        self.commit(pending.clone(), now);
        Some(pending)
    }

    /// Commit `id` immediately, bypassing the rate limit. Returns `true` if
    /// the active id changed.
    pub fn commit_now(&mut self, id: &str, now: Instant) -> bool {
        self.pending_id = None;
        self.commit_deadline = None;
        if self.active_id.as_deref() == Some(id) {
            return false;
        }
        self.commit(id.to_string(), now);
        true
    }

    /// Forget the active marker and any pending change.
    pub fn reset(&mut self) {
        self.active_id = None;
        self.pending_id = None;
        self.last_change = None;
        self.commit_deadline = None;
    }

    /// Reset when the active id is no longer known. Returns `true` on reset.
    ///
    /// A pending id that disappeared is dropped on its own.
    pub fn retain_known(&mut self, known: impl Fn(&str) -> bool) -> bool {
        if self.pending_id.as_deref().is_some_and(|id| !known(id)) {
            self.pending_id = None;
            self.commit_deadline = None;
        }
        match self.active_id.as_deref() {
            Some(id) if !known(id) => {
                tracing::debug!(target: "turnline.sync", id, "active marker removed by rebuild");
                self.reset();
                true
            }
            _ => false,
        }
    }

    fn commit(&mut self, id: String, now: Instant) {
        tracing::debug!(
            target: "turnline.sync",
            from = self.active_id.as_deref().unwrap_or(""),
            to = id.as_str(),
            "active marker committed"
        );
        self.active_id = Some(id);
        self.pending_id = None;
        self.commit_deadline = None;
        self.last_change = Some(now);
    }
}
