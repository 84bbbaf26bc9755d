//! Table-region filtering driven by institution markers.

use serde::{Deserialize, Serialize};

use super::PositionedFragment;

/// Substrings locating the start and end of a statement's transaction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegionMarkers {
    /// Any of these opens the region.
    pub start_markers: Vec<String>,
    /// Whether the opening fragment belongs to the region.
    pub start_inclusive: bool,
    /// Any of these closes the region.
    pub end_markers: Vec<String>,
    /// Whether the closing fragment belongs to the region.
    pub end_inclusive: bool,
}

impl TableRegionMarkers {
    pub fn new(start_markers: &[&str], end_markers: &[&str]) -> Self {
        Self {
            start_markers: start_markers.iter().map(|s| s.to_string()).collect(),
            start_inclusive: true,
            end_markers: end_markers.iter().map(|s| s.to_string()).collect(),
            end_inclusive: false,
        }
    }

    pub fn with_start_inclusive(mut self, inclusive: bool) -> Self {
        self.start_inclusive = inclusive;
        self
    }

    pub fn with_end_inclusive(mut self, inclusive: bool) -> Self {
        self.end_inclusive = inclusive;
        self
    }

    fn is_start(&self, text: &str) -> bool {
        self.start_markers.iter().any(|m| text.contains(m.as_str()))
    }

    fn is_end(&self, text: &str) -> bool {
        self.end_markers.iter().any(|m| text.contains(m.as_str()))
    }
}

/// Keep only the fragments inside the table region.
///
/// Fragments are scanned in the order given. The region opens at the first
/// fragment containing a start marker and closes at the first later fragment
/// containing an end marker. When no start marker is present the input is
/// returned unchanged; when no end marker follows, the region runs to the
/// last fragment.
pub fn filter_table_region(
    fragments: &[PositionedFragment],
    markers: &TableRegionMarkers,
) -> Vec<PositionedFragment> {
    let Some(start) = fragments.iter().position(|f| markers.is_start(&f.text)) else {
        return fragments.to_vec();
    };

    let end = fragments[start + 1..]
        .iter()
        .position(|f| markers.is_end(&f.text))
        .map(|offset| start + 1 + offset);

    let first = if markers.start_inclusive { start } else { start + 1 };
    let last = match end {
        Some(end) if markers.end_inclusive => end + 1,
        Some(end) => end,
        None => fragments.len(),
    };

    if first >= last {
        return Vec::new();
    }
    fragments[first..last].to_vec()
}
