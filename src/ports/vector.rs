//! # Vector Port
//!
//! Trait for the vector-side operations: reading the observer layer,
//! spatial overlap selection, distance queries, and the output layer with
//! its attribute table.

use crate::core::{Coord, ObserverPoint, ViewshedRecord};
use crate::ports::ToolboxResult;

/// Trait for vector map operations
pub trait VectorOps {
    /// Read all points of a layer, in storage order
    fn read_points(&self, layer: &str) -> ToolboxResult<Vec<ObserverPoint>>;

    /// Check whether a vector layer of this name already exists
    fn layer_exists(&self, name: &str) -> ToolboxResult<bool>;

    /// Select the points of `points` overlapping the areas of `areas`
    ///
    /// Writes the overlapping subset to `output`. A point always overlaps
    /// its own viewshed footprint, so the selection includes the observer
    /// itself.
    fn select_overlapping(&self, points: &str, areas: &str, output: &str) -> ToolboxResult<()>;

    /// Topology point count of a layer
    fn point_count(&self, layer: &str) -> ToolboxResult<u64>;

    /// Write a single-point layer at `coord`
    fn write_point(&self, output: &str, coord: Coord) -> ToolboxResult<()>;

    /// Minimum distance from the (single) point of `from` to any point of
    /// `to`, considering only distances >= `min_distance`
    fn min_distance(&self, from: &str, to: &str, min_distance: f64) -> ToolboxResult<f64>;

    /// Create an empty output point layer with the fixed attribute schema
    fn create_output(&self, name: &str) -> ToolboxResult<()>;

    /// Append one observer with its record to the output layer
    ///
    /// Writes the point geometry and inserts the attribute row in one
    /// committed step; rows already appended survive a later abort.
    fn append_record(
        &self,
        output: &str,
        point: &ObserverPoint,
        record: &ViewshedRecord,
    ) -> ToolboxResult<()>;
}
