//! # Viewshed Port
//!
//! Trait for the single-point visibility computation.
//!
//! `viewshed: fn(elevation, observer, params) -> raster` — which terrain
//! cells can this observer see?
//!
//! Implemented by the GRASS adapter via the external viewshed command.

use crate::core::{Coord, ViewshedParams};
use crate::ports::ToolboxResult;

/// Trait for computing a single-point visibility raster
pub trait Viewshed {
    /// Compute the viewshed of one observer
    ///
    /// Writes a visibility raster named `output` from the `elevation`
    /// surface, as seen from `observer` with the given eye height, maximum
    /// radius (-1 for unbounded) and curvature setting. Overwrites any
    /// previous map of that name.
    fn viewshed(
        &self,
        elevation: &str,
        output: &str,
        observer: Coord,
        params: &ViewshedParams,
    ) -> ToolboxResult<()>;
}
