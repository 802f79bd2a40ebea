//! Property tests for scroll synchronisation and active-marker rate limiting.

use std::time::Duration;

use proptest::prelude::*;
use turnline_core::marker::{Marker, MarkerModel, SourceRef, SummaryRules, TurnRecord};
use turnline_layout::track::{GeometryEngine, TrackConfig};
use turnline_runtime::{
    ActiveDecision, ActiveState, ScrollMetrics, compute_active_by_scroll, compute_track_scroll,
};
use web_time::Instant;

fn markers_at(offsets: &[f64]) -> Vec<Marker> {
    let records: Vec<TurnRecord> = offsets
        .iter()
        .enumerate()
        .map(|(i, offset)| TurnRecord::new(format!("t{i}"), SourceRef::new(i as u64), *offset, "x"))
        .collect();
    let mut model = MarkerModel::new(SummaryRules::default());
    model.rebuild(&records);
    model.markers().to_vec()
}

/// Sorted, distinct document offsets.
fn offsets() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1u32..500, 1..40).prop_map(|steps| {
        steps
            .iter()
            .scan(0.0, |acc, step| {
                *acc += f64::from(*step);
                Some(*acc)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn active_index_never_moves_backwards(offsets in offsets(), a in 0.0f64..30_000.0, b in 0.0f64..30_000.0) {
        let markers = markers_at(&offsets);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let at_low = compute_active_by_scroll(&markers, low).unwrap();
        let at_high = compute_active_by_scroll(&markers, high).unwrap();
        prop_assert!(at_low <= at_high);
    }

    #[test]
    fn active_marker_starts_at_or_above_line(offsets in offsets(), line in 0.0f64..30_000.0) {
        let markers = markers_at(&offsets);
        let index = compute_active_by_scroll(&markers, line).unwrap();
        if markers[0].document_offset <= line {
            prop_assert!(markers[index].document_offset <= line);
            if let Some(next) = markers.get(index + 1) {
                prop_assert!(next.document_offset > line);
            }
        } else {
            prop_assert_eq!(index, 0);
        }
    }

    #[test]
    fn track_scroll_stays_in_range(
        offsets in offsets(),
        bar_height in 20.0f64..600.0,
        scroll_top in -1000.0f64..40_000.0,
    ) {
        let mut markers = markers_at(&offsets);
        let mut engine = GeometryEngine::new(TrackConfig::default());
        let geometry = engine.recompute(&mut markers, bar_height);
        let metrics = ScrollMetrics::new(scroll_top, 800.0, 50_000.0);

        let scroll = compute_track_scroll(&markers, &geometry, &metrics, 0.45, false).unwrap();
        prop_assert!(scroll >= 0.0);
        prop_assert!(scroll <= geometry.max_track_scroll() + 1e-9);
        prop_assert!(compute_track_scroll(&markers, &geometry, &metrics, 0.45, true).is_none());
    }

    #[test]
    fn rapid_changes_commit_last_candidate_once(
        candidates in prop::collection::vec(0usize..5, 1..20),
        spacing_ms in 0u64..6,
    ) {
        let t0 = Instant::now();
        let interval = Duration::from_millis(120);
        let mut state = ActiveState::new(interval);
        prop_assert_eq!(state.propose("m0", t0), ActiveDecision::Committed("m0".into()));

        let mut now = t0;
        let mut commits = 0;
        for candidate in &candidates {
            now += Duration::from_millis(spacing_ms);
            if let ActiveDecision::Committed(_) = state.propose(&format!("m{candidate}"), now) {
                commits += 1;
            }
        }
        // Every proposal lands inside the interval.
        prop_assert_eq!(commits, 0);

        let last = format!("m{}", candidates[candidates.len() - 1]);
        let fired = state.fire(t0 + interval);
        if last == "m0" {
            prop_assert_eq!(fired, None);
            prop_assert_eq!(state.active_id(), Some("m0"));
        } else {
            prop_assert_eq!(fired.as_deref(), Some(last.as_str()));
            prop_assert_eq!(state.active_id(), Some(last.as_str()));
        }
        prop_assert_eq!(state.pending_id(), None);
    }
}
