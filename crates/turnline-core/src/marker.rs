#![forbid(unsafe_code)]

//! Turn records and the marker model.
//!
//! The discovery collaborator hands the engine an ordered list of
//! [`TurnRecord`]s. [`MarkerModel::rebuild`] turns that list into
//! [`Marker`]s: one per turn, with a display summary and geometry left unset
//! until the track engine runs.
//!
//! # Invariants
//!
//! 1. Markers are replaced wholesale on every rebuild; only `id` carries over
//!    (together with the starred flag keyed by it).
//! 2. [`MarkerModel::version`] strictly increases on every rebuild or clear,
//!    so deferred work can compare versions and abort when stale.
//! 3. An empty input never clears existing markers. It is reported as
//!    [`RebuildOutcome::TransientlyEmpty`]; callers decide when the empty
//!    state is real and call [`MarkerModel::clear`].

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque, non-owning handle to a turn element in the host document.
///
/// The engine never dereferences it; it is handed back to the host in
/// navigation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SourceRef(u64);

impl SourceRef {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// One conversational turn as reported by discovery.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurnRecord {
    pub id: String,
    pub source_ref: SourceRef,
    /// Offset of the turn's top edge in main-document coordinates.
    pub document_offset: f64,
    pub raw_text: String,
}

impl TurnRecord {
    pub fn new(
        id: impl Into<String>,
        source_ref: SourceRef,
        document_offset: f64,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_ref,
            document_offset,
            raw_text: raw_text.into(),
        }
    }
}

/// The track-side representative of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub source_ref: SourceRef,
    pub summary: String,
    pub document_offset: f64,
    /// Normalized track position in `[0, 1]`. Zero until geometry runs.
    pub n: f64,
    /// Position produced by the even distribution, before any correction.
    pub base_n: f64,
    /// Resolved pixel position of the dot's top edge on the track, `None`
    /// until geometry runs.
    pub pixel_position: Option<f64>,
    pub starred: bool,
}

/// Rules used to derive a marker summary from raw turn text.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRules {
    /// Leading labels stripped case-insensitively (e.g. `"You said:"`).
    pub label_prefixes: Vec<String>,
    /// Maximum summary length in grapheme clusters.
    pub max_graphemes: usize,
}

/// Default label prefixes stripped from summaries.
pub const DEFAULT_LABEL_PREFIXES: [&str; 5] =
    ["you said:", "chatgpt said:", "user:", "assistant:", "you:"];

/// Default summary cap in grapheme clusters.
pub const DEFAULT_SUMMARY_GRAPHEMES: usize = 240;

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            label_prefixes: DEFAULT_LABEL_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            max_graphemes: DEFAULT_SUMMARY_GRAPHEMES,
        }
    }
}

/// Derive a display summary from raw turn text.
///
/// Collapses all whitespace runs to single spaces, strips at most one known
/// label prefix, and caps the result at `rules.max_graphemes` graphemes
/// (appending `…` when capped).
#[must_use]
pub fn summarize(raw: &str, rules: &SummaryRules) -> String {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let stripped = rules
        .label_prefixes
        .iter()
        .find_map(|prefix| strip_label_prefix(&normalized, prefix))
        .unwrap_or(&normalized);

    cap_graphemes(stripped, rules.max_graphemes)
}

/// Case-insensitive prefix strip. Returns `None` when `text` does not start
/// with `prefix` or when nothing would remain after stripping.
fn strip_label_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let (rest_start, _) = chars.next()?;
    let rest = text[rest_start..].trim_start();
    if rest.is_empty() { None } else { Some(rest) }
}

fn cap_graphemes(text: &str, max: usize) -> String {
    let mut end = 0;
    for (count, (idx, grapheme)) in text.grapheme_indices(true).enumerate() {
        if count == max {
            let mut capped = text[..idx].trim_end().to_string();
            capped.push('…');
            return capped;
        }
        end = idx + grapheme.len();
    }
    text[..end].to_string()
}

/// Result of a [`MarkerModel::rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Markers were replaced.
    Rebuilt { count: usize, version: u64 },
    /// The input was empty; existing markers were left in place.
    TransientlyEmpty { version: u64 },
}

/// Ordered marker list built from turn records.
#[derive(Debug, Clone, Default)]
pub struct MarkerModel {
    markers: Vec<Marker>,
    version: u64,
    rules: SummaryRules,
}

impl MarkerModel {
    #[must_use]
    pub fn new(rules: SummaryRules) -> Self {
        Self {
            markers: Vec::new(),
            version: 0,
            rules,
        }
    }

    /// Replace the markers with ones derived from `records`.
    ///
    /// Starred flags of ids present before the rebuild are carried over.
    pub fn rebuild(&mut self, records: &[TurnRecord]) -> RebuildOutcome {
        if records.is_empty() {
            tracing::debug!(
                target: "turnline.model",
                version = self.version,
                shown = self.markers.len(),
                "turn list transiently empty"
            );
            return RebuildOutcome::TransientlyEmpty {
                version: self.version,
            };
        }

        let starred: HashSet<&str> = self
            .markers
            .iter()
            .filter(|m| m.starred)
            .map(|m| m.id.as_str())
            .collect();

        let markers: Vec<Marker> = records
            .iter()
            .map(|record| Marker {
                id: record.id.clone(),
                source_ref: record.source_ref,
                summary: summarize(&record.raw_text, &self.rules),
                document_offset: record.document_offset,
                n: 0.0,
                base_n: 0.0,
                pixel_position: None,
                starred: starred.contains(record.id.as_str()),
            })
            .collect();

        self.markers = markers;
        self.version += 1;

        tracing::debug!(
            target: "turnline.model",
            version = self.version,
            count = self.markers.len(),
            "markers rebuilt"
        );

        RebuildOutcome::Rebuilt {
            count: self.markers.len(),
            version: self.version,
        }
    }

    /// Drop every marker. Used once an empty turn list is confirmed.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.version += 1;
        tracing::debug!(target: "turnline.model", version = self.version, "markers cleared");
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Mutable access for the geometry pass. The list itself cannot be
    /// resized through this.
    pub fn markers_mut(&mut self) -> &mut [Marker] {
        &mut self.markers
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True when `version` still names the current marker set.
    #[must_use]
    pub fn is_current(&self, version: u64) -> bool {
        self.version == version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.markers.iter().position(|m| m.id == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Flip the starred flag of `id`. Returns the new value, or `None` when
    /// the id is unknown.
    pub fn toggle_star(&mut self, id: &str) -> Option<bool> {
        let marker = self.markers.iter_mut().find(|m| m.id == id)?;
        marker.starred = !marker.starred;
        Some(marker.starred)
    }

    /// Mark exactly the markers whose ids are in `ids` as starred.
    pub fn set_starred<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let ids: HashSet<&str> = ids.into_iter().collect();
        for marker in &mut self.markers {
            marker.starred = ids.contains(marker.id.as_str());
        }
    }

    /// Ids of starred markers in track order.
    #[must_use]
    pub fn starred_ids(&self) -> Vec<String> {
        self.markers
            .iter()
            .filter(|m| m.starred)
            .map(|m| m.id.clone())
            .collect()
    }

    #[must_use]
    pub fn rules(&self) -> &SummaryRules {
        &self.rules
    }
}
