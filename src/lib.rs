//! # Viewshed Tools
//!
//! Cumulative viewshed analysis on top of an external GRASS GIS toolbox.
//!
//! For every observer point in an input point layer, compute the area
//! visible from that point, how many of the other observer points it can
//! see, and the distance to the nearest visible observer — then write one
//! committed row per point into an output point layer.
//!
//! All actual geoprocessing (visibility rasters, raster statistics,
//! raster→vector conversion, spatial selection, distance queries, table
//! persistence) is delegated to external toolbox commands. This crate only
//! orchestrates: it iterates points, builds command invocations and
//! temporary map names, parses tabular text output, accumulates per-point
//! statistics, and guarantees temp-map cleanup on every exit path.
//!
//! ## Architecture
//!
//! - `core` — pure domain logic: point and record types, parameter
//!   defaults, typed parsers for tool output, and the accumulation loop.
//!   No subprocess I/O.
//! - `ports` — trait contracts for the external command boundary.
//! - `adapters` — the GRASS subprocess adapter implementing those ports.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use viewshed_tools::adapters::grass::GrassToolbox;
//! use viewshed_tools::core::{accumulate, Job, ViewshedParams};
//!
//! let toolbox = GrassToolbox::new();
//! let job = Job::new("elevation", "observers", "observers_out", "viewshed")
//!     .with_params(ViewshedParams::default().with_curvature(true));
//! let records = accumulate(&toolbox, &job)?;
//! ```

pub mod adapters;
pub mod core;
pub mod ports;

// Re-exports for convenience
pub use crate::core::{accumulate, Coord, Job, ObserverPoint, ViewshedParams, ViewshedRecord};
pub use adapters::grass::GrassToolbox;
pub use ports::{MapKind, RasterOps, ToolboxError, ToolboxResult, VectorOps, Viewshed};
