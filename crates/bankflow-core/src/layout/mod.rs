//! Layout reconstruction: positioned fragments to rows, columns and table regions.
//!
//! Coordinates are in document space with y increasing upward, so the top
//! of a page has the largest y.

mod grouping;
mod region;

pub use grouping::{group_into_columns, group_into_rows, reading_order};
pub use region::{filter_table_region, TableRegionMarkers};

use serde::{Deserialize, Serialize};

/// One positioned run of text as handed over by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    /// Text content.
    pub text: String,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position (larger is higher on the page).
    pub y: f64,
}

impl PositionedFragment {
    /// Create a fragment.
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn has_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Fragments sharing one printed line, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub fragments: Vec<PositionedFragment>,
}

impl Row {
    /// y of the leftmost fragment.
    pub fn y(&self) -> f64 {
        self.fragments.first().map(|f| f.y).unwrap_or_default()
    }

    /// Row text, fragments joined with a single space.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Fragments sharing one printed field, ordered top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub fragments: Vec<PositionedFragment>,
}

impl Column {
    /// x of the topmost fragment.
    pub fn x(&self) -> f64 {
        self.fragments.first().map(|f| f.x).unwrap_or_default()
    }

    /// Cell texts from top to bottom.
    pub fn texts(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Assemble rows into page text, one row per line.
pub fn assemble_rows(rows: &[Row]) -> String {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row.text());
        text.push('\n');
    }
    text
}
