#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use turnline_layout::track::apply_min_gap;

#[derive(Debug, Arbitrary)]
struct Input {
    desired: Vec<f32>,
    min_top: f32,
    span: f32,
    gap: f32,
}

fuzz_target!(|input: Input| {
    if input.desired.len() > 512 {
        return;
    }
    let finite = |v: f32| v.is_finite() && v.abs() < 1e7;
    if !input.desired.iter().copied().all(finite)
        || !finite(input.min_top)
        || !finite(input.span)
        || !finite(input.gap)
    {
        return;
    }

    let desired: Vec<f64> = input.desired.iter().map(|v| f64::from(*v)).collect();
    let min_top = f64::from(input.min_top);
    let max_top = min_top + f64::from(input.span).abs();
    let out = apply_min_gap(&desired, min_top, max_top, f64::from(input.gap));

    assert_eq!(out.len(), desired.len());
    for value in &out {
        assert!(*value >= min_top && *value <= max_top, "{value} escaped [{min_top}, {max_top}]");
    }
});
