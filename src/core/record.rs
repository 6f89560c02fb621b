//! # Output Records
//!
//! One `ViewshedRecord` per observer point, written in input iteration
//! order into the output layer's attribute table.

/// Attribute columns of the output point layer, `(name, SQL type)`
///
/// The `cat` key column is managed by the toolbox when the table is
/// created; it is listed here because every appended row carries it.
pub const OUTPUT_COLUMNS: [(&str, &str); 4] = [
    ("cat", "INTEGER"),
    ("area", "DOUBLE PRECISION"),
    ("n_points_visible", "INTEGER"),
    ("distance_to_closest", "DOUBLE PRECISION"),
];

/// Per-observer analysis result
///
/// Every observer point produces exactly one record, even with zero
/// visible neighbors (`distance_to_closest` is then exactly 0, never null).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewshedRecord {
    /// Category id of the observer point
    pub category: i64,

    /// Visible area in squared map units:
    /// non-null cell count × region resolution²
    pub area: f64,

    /// Number of *other* observer points inside the viewshed
    pub n_points_visible: u64,

    /// Distance to the nearest visible observer, 0 if none is visible
    pub distance_to_closest: f64,
}

impl ViewshedRecord {
    /// Record for an observer with no visible neighbors
    pub fn isolated(category: i64, area: f64) -> Self {
        Self {
            category,
            area,
            n_points_visible: 0,
            distance_to_closest: 0.0,
        }
    }
}
