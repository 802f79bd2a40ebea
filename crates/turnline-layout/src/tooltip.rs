#![forbid(unsafe_code)]

//! Tooltip placement and truncation.
//!
//! A tooltip floats beside a marker dot. [`TooltipLayoutEngine`] decides
//! which side it goes on and how wide it is, then truncates the marker
//! summary so it never exceeds a fixed number of lines.
//!
//! # Placement
//!
//! The side with more horizontal room wins (ties go left, because the track
//! usually hugs the right edge). Widths come from a descending tier list:
//! the widest tier that fits the chosen side is used; if none fits, the other
//! side is tried; failing that, the narrowest tier is used anyway.
//!
//! # Truncation
//!
//! Layout height is monotonic in prefix length, so the longest prefix that
//! still fits `prefix + ellipsis` into the line budget is found by binary
//! search over grapheme boundaries: `O(log n)` measurements instead of one
//! per character.

use turnline_core::geometry::{Rect, Size, clamp_soft};
use unicode_segmentation::UnicodeSegmentation;

use crate::text::TextMeasure;

/// Default tooltip width tiers, widest first.
pub const DEFAULT_WIDTH_TIERS: [f64; 4] = [280.0, 240.0, 200.0, 160.0];
/// Default distance between anchor and tooltip.
pub const DEFAULT_TOOLTIP_GAP: f64 = 12.0;
/// Default distance kept from the viewport edges.
pub const DEFAULT_VIEWPORT_PADDING: f64 = 8.0;
/// Default line budget.
pub const DEFAULT_MAX_LINES: usize = 3;

/// Which side of the anchor the tooltip sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Tunables for tooltip layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipConfig {
    /// Candidate widths, widest first.
    pub width_tiers: Vec<f64>,
    pub gap: f64,
    pub viewport_padding: f64,
    pub max_lines: usize,
    pub ellipsis: String,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            width_tiers: DEFAULT_WIDTH_TIERS.to_vec(),
            gap: DEFAULT_TOOLTIP_GAP,
            viewport_padding: DEFAULT_VIEWPORT_PADDING,
            max_lines: DEFAULT_MAX_LINES,
            ellipsis: "…".to_string(),
        }
    }
}

/// Side and width chosen for a tooltip, before its text is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementInfo {
    pub side: Side,
    pub width: f64,
    /// Horizontal room on the chosen side.
    pub available: f64,
}

/// Final side and box size of a tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPlacement {
    pub side: Side,
    pub width: f64,
    pub height: f64,
}

/// Text that fits the line budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Truncation {
    pub text: String,
    pub truncated: bool,
    /// Measured border-box height of `text`.
    pub height: f64,
}

/// Everything a host needs to draw a tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLayout {
    pub placement: TooltipPlacement,
    pub rect: Rect,
    pub text: String,
    pub truncated: bool,
}

/// Computes tooltip placement and truncation.
#[derive(Debug, Clone, Default)]
pub struct TooltipLayoutEngine {
    config: TooltipConfig,
}

impl TooltipLayoutEngine {
    /// Create an engine. Tiers are sorted widest first; an empty or
    /// non-positive tier list falls back to the defaults.
    #[must_use]
    pub fn new(mut config: TooltipConfig) -> Self {
        config.width_tiers.retain(|w| w.is_finite() && *w > 0.0);
        if config.width_tiers.is_empty() {
            config.width_tiers = DEFAULT_WIDTH_TIERS.to_vec();
        }
        config.width_tiers.sort_by(|a, b| b.total_cmp(a));
        config.width_tiers.dedup();
        config.max_lines = config.max_lines.max(1);
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TooltipConfig {
        &self.config
    }

    fn min_width(&self) -> f64 {
        self.config
            .width_tiers
            .last()
            .copied()
            .unwrap_or(DEFAULT_WIDTH_TIERS[DEFAULT_WIDTH_TIERS.len() - 1])
    }

    fn fitting_tier(&self, available: f64) -> Option<f64> {
        self.config
            .width_tiers
            .iter()
            .copied()
            .find(|tier| *tier <= available)
    }

    /// Horizontal room on `side` of `anchor`.
    fn available(&self, side: Side, anchor: Rect, viewport_width: f64) -> f64 {
        let chrome = self.config.gap + self.config.viewport_padding;
        let room = match side {
            Side::Left => anchor.left() - chrome,
            Side::Right => viewport_width - anchor.right() - chrome,
        };
        room.max(0.0)
    }

    /// Choose side and width for a tooltip anchored at `anchor`.
    #[must_use]
    pub fn compute_placement_info(&self, anchor: Rect, viewport_width: f64) -> PlacementInfo {
        let left = self.available(Side::Left, anchor, viewport_width);
        let right = self.available(Side::Right, anchor, viewport_width);
        let preferred = if left >= right { Side::Left } else { Side::Right };

        for side in [preferred, preferred.other()] {
            let available = self.available(side, anchor, viewport_width);
            if let Some(width) = self.fitting_tier(available) {
                return PlacementInfo {
                    side,
                    width,
                    available,
                };
            }
        }

        PlacementInfo {
            side: preferred,
            width: self.min_width(),
            available: self.available(preferred, anchor, viewport_width),
        }
    }

    /// Height budget for the configured number of lines.
    #[must_use]
    pub fn max_height<M: TextMeasure + ?Sized>(&self, measure: &M) -> f64 {
        measure.metrics().height_for_lines(self.config.max_lines)
    }

    /// Truncate `text` so its laid-out height at `width` fits the line
    /// budget, appending the ellipsis when anything was cut.
    pub fn truncate_to_lines<M: TextMeasure + ?Sized>(
        &self,
        text: &str,
        width: f64,
        measure: &M,
    ) -> Truncation {
        let max_height = self.max_height(measure);
        let full_height = measure.height(text, width);
        if full_height <= max_height {
            return Truncation {
                text: text.to_string(),
                truncated: false,
                height: full_height,
            };
        }

        let boundaries: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
        let candidate = |graphemes: usize| -> String {
            let end = boundaries.get(graphemes).copied().unwrap_or(text.len());
            let mut out = text[..end].trim_end().to_string();
            out.push_str(&self.config.ellipsis);
            out
        };
        let fits = |graphemes: usize| measure.height(&candidate(graphemes), width) <= max_height;

        if !fits(0) {
            tracing::debug!(
                target: "turnline.tooltip",
                width,
                max_height,
                "ellipsis alone exceeds line budget"
            );
            return Truncation {
                text: String::new(),
                truncated: true,
                height: measure.height("", width),
            };
        }

        // Invariant: `lo` fits, `hi` does not (the full text does not fit).
        let mut lo = 0;
        let mut hi = boundaries.len();
        let mut probes = 0u32;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            probes += 1;
            if fits(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let text = candidate(lo);
        let height = measure.height(&text, width);
        tracing::trace!(
            target: "turnline.tooltip",
            kept = lo,
            total = boundaries.len(),
            probes,
            "tooltip text truncated"
        );
        Truncation {
            text,
            truncated: true,
            height,
        }
    }

    /// Truncate to exactly three lines regardless of the configured budget.
    pub fn truncate_to_three_lines<M: TextMeasure + ?Sized>(
        &self,
        text: &str,
        width: f64,
        measure: &M,
    ) -> Truncation {
        let engine = Self {
            config: TooltipConfig {
                max_lines: 3,
                ..self.config.clone()
            },
        };
        engine.truncate_to_lines(text, width, measure)
    }

    /// Place, size, and truncate a tooltip for `text` beside `anchor`.
    ///
    /// Recomputed on every call; nothing is cached between shows.
    pub fn layout<M: TextMeasure + ?Sized>(
        &self,
        anchor: Rect,
        viewport: Size,
        text: &str,
        measure: &M,
    ) -> TooltipLayout {
        let info = self.compute_placement_info(anchor, viewport.width);
        let truncation = self.truncate_to_lines(text, info.width, measure);
        let width = info.width;
        let height = truncation.height;
        let pad = self.config.viewport_padding;

        let x = match info.side {
            Side::Left => anchor.left() - self.config.gap - width,
            Side::Right => anchor.right() + self.config.gap,
        };
        let x = clamp_soft(x, pad, viewport.width - pad - width);
        let y = clamp_soft(
            anchor.center_y() - height / 2.0,
            pad,
            viewport.height - pad - height,
        );

        TooltipLayout {
            placement: TooltipPlacement {
                side: info.side,
                width,
                height,
            },
            rect: Rect::new(x, y, width, height),
            text: truncation.text,
            truncated: truncation.truncated,
        }
    }
}
