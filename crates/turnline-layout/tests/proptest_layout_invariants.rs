//! Property-based invariant tests for the layout engines.
//!
//! ## Invariants
//!
//! 1. Track positions stay inside `[padding, bar - padding]` on a fixed track
//! 2. Track positions strictly increase and respect the effective gap
//! 3. `apply_min_gap` honours any feasible gap inside its bounds
//! 4. Truncated tooltip text fits the line budget and is a prefix of the input;
//!    narrowing the width never lengthens the kept prefix
//! 5. Rubber-band damping always moves less than the raw overshoot
//! 6. Stored positions restore inside the margin for any viewport

use proptest::prelude::*;
use turnline_core::geometry::{Point, Rect, Size};
use turnline_core::marker::{MarkerModel, SourceRef, SummaryRules, TurnRecord};
use turnline_layout::{
    CellMeasure, DragConfig, DragConstraintEngine, GeometryEngine, PositionSnapshot,
    TooltipConfig, TooltipLayoutEngine, TrackConfig, apply_min_gap, damp_axis,
};

const EPS: f64 = 1e-6;

// ── Strategies ────────────────────────────────────────────────────────────

fn model_with(count: usize) -> MarkerModel {
    let records: Vec<TurnRecord> = (0..count)
        .map(|i| TurnRecord::new(format!("t{i}"), SourceRef::new(i as u64), i as f64, "turn"))
        .collect();
    let mut model = MarkerModel::new(SummaryRules::default());
    model.rebuild(&records);
    model
}

fn arb_prose() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,12}", 0..80).prop_map(|words| words.join(" "))
}

// ── 1-2. Track distribution ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fixed_track_positions_stay_in_bounds(
        bar in 50u32..2000,
        padding in 0u32..20,
        count in 2usize..200,
    ) {
        let config = TrackConfig {
            padding: f64::from(padding),
            long_canvas: false,
            ..TrackConfig::default()
        };
        let mut engine = GeometryEngine::new(config);
        let mut model = model_with(count);
        let geometry = engine.recompute(model.markers_mut(), f64::from(bar));

        let low = f64::from(padding);
        let high = f64::from(bar) - f64::from(padding);
        for marker in model.markers() {
            let pixel = marker.pixel_position.expect("positioned");
            prop_assert!(pixel >= low - EPS && pixel <= high + EPS, "{pixel} not in [{low}, {high}]");
        }
        prop_assert!(geometry.min_gap <= geometry.usable_height() / (count - 1) as f64 + EPS);
    }

    #[test]
    fn positions_strictly_increase_with_gap(
        bar in 50u32..2000,
        padding in 0u32..20,
        count in 2usize..200,
        long_canvas in any::<bool>(),
    ) {
        let config = TrackConfig {
            padding: f64::from(padding),
            long_canvas,
            ..TrackConfig::default()
        };
        let mut engine = GeometryEngine::new(config);
        let mut model = model_with(count);
        let geometry = engine.recompute(model.markers_mut(), f64::from(bar));

        let pixels: Vec<f64> = model
            .markers()
            .iter()
            .map(|m| m.pixel_position.expect("positioned"))
            .collect();
        for pair in pixels.windows(2) {
            prop_assert!(pair[1] > pair[0]);
            prop_assert!(pair[1] - pair[0] >= geometry.min_gap - EPS);
        }
    }

    #[test]
    fn track_scroll_stays_in_range(
        bar in 50u32..600,
        count in 2usize..300,
        requested in -5000.0f64..5000.0,
    ) {
        let mut engine = GeometryEngine::new(TrackConfig::default());
        let mut model = model_with(count);
        engine.recompute(model.markers_mut(), f64::from(bar));
        let applied = engine.set_track_scroll(requested);
        prop_assert!(applied >= 0.0);
        prop_assert!(applied <= engine.geometry().max_track_scroll());
    }
}

// ── 3. Min-gap enforcement ────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn feasible_gap_is_honoured(
        fractions in prop::collection::vec(0.0f64..=1.0, 1..100),
        gap in 0.0f64..20.0,
    ) {
        let min_top = 10.0;
        let span = gap * (fractions.len() - 1) as f64 + 50.0;
        let max_top = min_top + span;
        let desired: Vec<f64> = fractions.iter().map(|f| min_top + f * span).collect();

        let out = apply_min_gap(&desired, min_top, max_top, gap);
        prop_assert_eq!(out.len(), desired.len());
        for value in &out {
            prop_assert!(*value >= min_top - EPS && *value <= max_top + EPS);
        }
        for pair in out.windows(2) {
            prop_assert!(pair[1] - pair[0] >= gap - EPS);
        }
    }
}

// ── 4. Tooltip truncation ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    #[test]
    fn truncation_fits_budget_and_keeps_prefix(
        text in arb_prose(),
        tier in 0usize..4,
    ) {
        let engine = TooltipLayoutEngine::new(TooltipConfig::default());
        let measure = CellMeasure::default();
        let width = engine.config().width_tiers[tier];
        let result = engine.truncate_to_lines(&text, width, &measure);

        prop_assert!(result.height <= engine.max_height(&measure) + EPS);
        if result.truncated {
            let kept = result.text.strip_suffix('…').expect("ellipsis appended");
            prop_assert!(text.starts_with(kept));
        } else {
            prop_assert_eq!(&result.text, &text);
        }
    }

    #[test]
    fn narrower_width_never_keeps_more_text(text in arb_prose()) {
        let engine = TooltipLayoutEngine::new(TooltipConfig::default());
        let measure = CellMeasure::default();
        let kept_len = |width: f64| {
            let result = engine.truncate_to_lines(&text, width, &measure);
            if result.truncated {
                result.text.strip_suffix('…').unwrap_or(&result.text).len()
            } else {
                result.text.len()
            }
        };

        let mut previous = usize::MAX;
        for width in (30..=400).rev().step_by(10) {
            let kept = kept_len(f64::from(width));
            prop_assert!(kept <= previous, "width {} kept {} after {}", width, kept, previous);
            previous = kept;
        }
    }
}

// ── 5-6. Drag ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn damping_shrinks_overshoot(
        overshoot in 0.001f64..5000.0,
        min in -100.0f64..100.0,
        extent in 0.0f64..1000.0,
        factor in 0.0f64..0.99,
    ) {
        let max = min + extent;
        let below = damp_axis(min - overshoot, min, max, factor);
        let above = damp_axis(max + overshoot, min, max, factor);
        prop_assert!(min - below < overshoot);
        prop_assert!(above - max < overshoot);
        prop_assert!(below <= min && above >= max);
    }

    #[test]
    fn drag_release_lands_inside_margin(
        dx in -3000.0f64..3000.0,
        dy in -3000.0f64..3000.0,
    ) {
        let viewport = Size::new(1000.0, 800.0);
        let mut engine = DragConstraintEngine::new(DragConfig::default());
        engine.begin(Point::new(500.0, 300.0), Rect::new(900.0, 200.0, 40.0, 300.0));
        engine.update(Point::new(500.0 + dx, 300.0 + dy), viewport);

        if let Some(release) = engine.end(viewport) {
            prop_assert!(release.rect.x >= 10.0 - EPS);
            prop_assert!(release.rect.y >= 10.0 - EPS);
            prop_assert!(release.rect.right() <= 990.0 + EPS);
            prop_assert!(release.rect.bottom() <= 790.0 + EPS);
        }
    }

    #[test]
    fn restore_is_clamped_for_any_viewport(
        left in 0.0f64..100.0,
        top in 0.0f64..100.0,
        width in 400u32..4000,
        height in 400u32..3000,
    ) {
        let snapshot = PositionSnapshot {
            left_percent: left,
            top_percent: top,
            width_percent: 2.0,
            height_percent: 20.0,
            ..PositionSnapshot::from_rect(Rect::new(0.0, 0.0, 40.0, 200.0), Size::new(2000.0, 1000.0))
        };
        let viewport = Size::new(f64::from(width), f64::from(height));
        let engine = DragConstraintEngine::new(DragConfig::default());
        let rect = engine.restore(&snapshot, viewport).expect("finite snapshot");

        prop_assert!(rect.x >= 10.0 - EPS);
        prop_assert!(rect.right() <= viewport.width - 10.0 + EPS);
        prop_assert!(rect.y >= 10.0 - EPS);
        prop_assert!(rect.bottom() <= viewport.height - 10.0 + EPS);
    }
}
