#![no_main]

use libfuzzer_sys::fuzz_target;
use turnline_layout::text::CellMeasure;
use turnline_layout::tooltip::{TooltipConfig, TooltipLayoutEngine};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    let engine = TooltipLayoutEngine::new(TooltipConfig::default());
    let measure = CellMeasure::default();
    let budget = engine.max_height(&measure);

    for width in [1.0, 40.0, 160.0, 280.0, 1e6] {
        let out = engine.truncate_to_lines(text, width, &measure);
        assert!(
            out.height <= budget || out.text.is_empty(),
            "height {} over budget {} at width {}",
            out.height,
            budget,
            width
        );
        if !out.truncated {
            assert_eq!(out.text, text);
        }
    }
});
