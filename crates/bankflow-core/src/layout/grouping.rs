//! Geometric clustering of fragments into rows and columns.

use std::cmp::Ordering;

use tracing::debug;

use super::{Column, PositionedFragment, Row};

/// Cluster fragments into rows.
///
/// A fragment joins the first existing row whose opening member's y lies
/// strictly within `y_tolerance`; otherwise it opens a new row. Blank
/// fragments and fragments without a finite position are dropped. Rows are
/// returned top to bottom (descending y), fragments left to right.
pub fn group_into_rows(fragments: &[PositionedFragment], y_tolerance: f64) -> Vec<Row> {
    let mut clusters = cluster(fragments, y_tolerance, |f| f.y);

    // Ordered by the opening member; stable for rows at identical heights.
    clusters.sort_by(|a, b| b[0].y.partial_cmp(&a[0].y).unwrap_or(Ordering::Equal));

    let rows: Vec<Row> = clusters
        .into_iter()
        .map(|mut fragments| {
            fragments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            Row { fragments }
        })
        .collect();

    debug!("Grouped {} fragments into {} rows", fragments.len(), rows.len());
    rows
}

/// Cluster fragments into columns.
///
/// Symmetric to [`group_into_rows`] on x: columns left to right, fragments
/// top to bottom.
pub fn group_into_columns(fragments: &[PositionedFragment], x_tolerance: f64) -> Vec<Column> {
    let mut clusters = cluster(fragments, x_tolerance, |f| f.x);

    clusters.sort_by(|a, b| a[0].x.partial_cmp(&b[0].x).unwrap_or(Ordering::Equal));

    let columns: Vec<Column> = clusters
        .into_iter()
        .map(|mut fragments| {
            fragments.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));
            Column { fragments }
        })
        .collect();

    debug!(
        "Grouped {} fragments into {} columns",
        fragments.len(),
        columns.len()
    );
    columns
}

/// Fragments in reading order: rows top to bottom, left to right within a row.
pub fn reading_order(fragments: &[PositionedFragment], y_tolerance: f64) -> Vec<PositionedFragment> {
    group_into_rows(fragments, y_tolerance)
        .into_iter()
        .flat_map(|row| row.fragments)
        .collect()
}

fn cluster(
    fragments: &[PositionedFragment],
    tolerance: f64,
    axis: impl Fn(&PositionedFragment) -> f64,
) -> Vec<Vec<PositionedFragment>> {
    let mut clusters: Vec<Vec<PositionedFragment>> = Vec::new();

    for fragment in fragments {
        if fragment.is_blank() || !fragment.has_position() {
            continue;
        }

        let position = axis(fragment);
        let existing = clusters
            .iter_mut()
            .find(|members| (position - axis(&members[0])).abs() < tolerance);

        match existing {
            Some(members) => members.push(fragment.clone()),
            None => clusters.push(vec![fragment.clone()]),
        }
    }

    clusters
}
