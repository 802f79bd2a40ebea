#![forbid(unsafe_code)]

//! Text measurement for tooltip layout.
//!
//! Tooltip truncation needs one question answered many times: how tall is
//! this text when laid out in a box this wide? Hosts with a real font engine
//! implement [`TextMeasure`]; [`CellMeasure`] is the bundled deterministic
//! measurer that assumes a fixed advance per display cell and wraps like a
//! browser does for plain prose (break after whitespace, fall back to
//! grapheme breaks for words longer than a line).

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Box metrics of the element text is laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub border: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            padding_x: 8.0,
            padding_y: 6.0,
            border: 0.0,
        }
    }
}

impl TextMetrics {
    /// Border-box height of exactly `lines` lines of text.
    #[inline]
    pub fn height_for_lines(&self, lines: usize) -> f64 {
        self.line_height * lines as f64 + 2.0 * (self.padding_y + self.border)
    }

    /// Width left for glyphs inside a border box `width` wide.
    #[inline]
    pub fn content_width(&self, width: f64) -> f64 {
        (width - 2.0 * (self.padding_x + self.border)).max(0.0)
    }
}

/// Measures laid-out text height.
pub trait TextMeasure {
    /// Metrics of the element the text is laid out in.
    fn metrics(&self) -> TextMetrics;

    /// Border-box height of `text` laid out in a box `width` pixels wide.
    fn height(&self, text: &str, width: f64) -> f64;
}

impl<M: TextMeasure + ?Sized> TextMeasure for &M {
    fn metrics(&self) -> TextMetrics {
        (**self).metrics()
    }

    fn height(&self, text: &str, width: f64) -> f64 {
        (**self).height(text, width)
    }
}

/// Fixed-advance measurer: every display cell is `advance` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMeasure {
    pub metrics: TextMetrics,
    pub advance: f64,
}

impl Default for CellMeasure {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            advance: 7.0,
        }
    }
}

impl CellMeasure {
    #[must_use]
    pub fn new(metrics: TextMetrics, advance: f64) -> Self {
        Self { metrics, advance }
    }

    /// Display columns available in a box `width` pixels wide (at least 1).
    #[must_use]
    pub fn columns(&self, width: f64) -> usize {
        if self.advance <= 0.0 {
            return usize::MAX;
        }
        let columns = (self.metrics.content_width(width) / self.advance).floor();
        if columns.is_finite() && columns >= 1.0 {
            columns as usize
        } else {
            1
        }
    }
}

impl TextMeasure for CellMeasure {
    fn metrics(&self) -> TextMetrics {
        self.metrics
    }

    fn height(&self, text: &str, width: f64) -> f64 {
        self.metrics
            .height_for_lines(wrapped_line_count(text, self.columns(width)))
    }
}

/// Display width of text in cells.
#[inline]
#[must_use]
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Number of lines `text` occupies when greedily wrapped at `columns`.
///
/// Empty text occupies no lines; every `\n` starts a new line.
#[must_use]
pub fn wrapped_line_count(text: &str, columns: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    let columns = columns.max(1);
    text.split('\n')
        .map(|paragraph| paragraph_line_count(paragraph, columns))
        .sum()
}

fn paragraph_line_count(paragraph: &str, columns: usize) -> usize {
    let mut lines = 1;
    let mut current = 0;
    let mut pending_space = 0;

    for segment in paragraph.split_word_bounds() {
        let width = display_width(segment);
        if segment.chars().all(char::is_whitespace) {
            // Whitespace only matters between words on the same line.
            if current > 0 {
                pending_space += width;
            }
            continue;
        }

        if current + pending_space + width <= columns {
            current += pending_space + width;
            pending_space = 0;
            continue;
        }

        pending_space = 0;
        if current > 0 {
            lines += 1;
            current = 0;
        }
        if width <= columns {
            current = width;
            continue;
        }

        // Word longer than a line: break between graphemes.
        for grapheme in segment.graphemes(true) {
            let grapheme_width = display_width(grapheme);
            if current > 0 && current + grapheme_width > columns {
                lines += 1;
                current = 0;
            }
            current += grapheme_width;
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_lines() {
        assert_eq!(wrapped_line_count("", 10), 0);
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrapped_line_count("hello world", 20), 1);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // "Hello" / "world foo" / "bar"
        assert_eq!(wrapped_line_count("Hello world foo bar", 10), 3);
    }

    #[test]
    fn trailing_space_does_not_wrap() {
        assert_eq!(wrapped_line_count("hello ", 5), 1);
    }

    #[test]
    fn long_word_breaks_by_grapheme() {
        assert_eq!(wrapped_line_count("Supercalifragilistic", 10), 2);
        assert_eq!(wrapped_line_count("ab Supercalifragilistic", 10), 3);
    }

    #[test]
    fn newlines_start_lines() {
        assert_eq!(wrapped_line_count("a\nb\n\nc", 10), 4);
    }

    #[test]
    fn wide_chars_take_two_cells() {
        // Five CJK characters are ten cells wide.
        assert_eq!(wrapped_line_count("你好你好你", 4), 3);
    }

    #[test]
    fn columns_floor_to_at_least_one() {
        let measure = CellMeasure::default();
        assert_eq!(measure.columns(160.0), 20);
        assert_eq!(measure.columns(0.0), 1);
    }

    #[test]
    fn height_includes_chrome() {
        let measure = CellMeasure::default();
        assert_eq!(measure.height("hi", 160.0), 20.0 + 12.0);
        assert_eq!(measure.metrics().height_for_lines(3), 72.0);
    }

    #[test]
    fn height_is_monotonic_in_width() {
        let measure = CellMeasure::default();
        let text = "the quick brown fox jumps over the lazy dog again and again";
        let mut previous = f64::INFINITY;
        for width in (60..400).step_by(10) {
            let height = measure.height(text, f64::from(width));
            assert!(height <= previous);
            previous = height;
        }
    }
}
