//! # Observer Points
//!
//! An observer point is a location in the input point layer from which a
//! viewshed is computed. Points are read once at the start of a run and
//! stay immutable for its duration.

use std::fmt;

/// A 2-D map coordinate in the location's coordinate system
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    /// Create a new coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate
    pub fn distance(&self, other: &Coord) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// An observer location read from the input point layer
///
/// Identified by its integer category id, which also tags the per-point
/// viewshed raster so overlapping viewsheds stay distinguishable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverPoint {
    /// Category id of the point in the input layer
    pub category: i64,
    /// Location of the observer
    pub coord: Coord,
}

impl ObserverPoint {
    /// Create a new observer point
    pub fn new(category: i64, x: f64, y: f64) -> Self {
        Self {
            category,
            coord: Coord::new(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_coord_display_is_comma_separated() {
        let c = Coord::new(634_123.5, 223_047.0);
        assert_eq!(c.to_string(), "634123.5,223047");
    }

    #[test]
    fn test_observer_point() {
        let p = ObserverPoint::new(7, 100.0, 200.0);
        assert_eq!(p.category, 7);
        assert_eq!(p.coord, Coord::new(100.0, 200.0));
    }
}
