//! # Raster Port
//!
//! Trait for the raster-side operations of the run: tagging a visibility
//! raster with its observer's identity, summarizing it, vectorizing it,
//! and removing maps.

use crate::ports::{MapKind, ToolboxResult};

/// Trait for raster map operations
pub trait RasterOps {
    /// Re-tag a visibility raster with an observer's category
    ///
    /// Every visible cell of `source` becomes `category` in `output`;
    /// non-visible cells become no-data. The result is a mergeable,
    /// uniquely identified viewshed surface.
    fn tag_visible(&self, source: &str, output: &str, category: i64) -> ToolboxResult<()>;

    /// Count the non-no-data cells of a raster via a univariate summary
    fn cell_count(&self, map: &str) -> ToolboxResult<u64>;

    /// North-south resolution of the active computational region
    ///
    /// Cells are assumed square; the squared resolution converts cell
    /// counts to area.
    fn region_resolution(&self) -> ToolboxResult<f64>;

    /// Convert a raster to vector area geometry
    fn to_areas(&self, raster: &str, vector: &str) -> ToolboxResult<()>;

    /// Force-remove maps of one kind
    ///
    /// Removing a name that does not exist is not an error.
    fn remove(&self, kind: MapKind, names: &[String]) -> ToolboxResult<()>;
}
