#![no_main]

use libfuzzer_sys::fuzz_target;
use turnline_core::marker::{SummaryRules, summarize};
use unicode_segmentation::UnicodeSegmentation;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 8192 {
        return;
    }

    for max_graphemes in [1, 8, 240] {
        let rules = SummaryRules {
            max_graphemes,
            ..SummaryRules::default()
        };
        let summary = summarize(text, &rules);

        // Capped at the limit plus one ellipsis, never padded.
        assert!(summary.graphemes(true).count() <= max_graphemes + 1);
        assert_eq!(summary.trim(), summary);
        assert!(!summary.contains("  "));
    }
});
