//! # Run Parameters
//!
//! Viewshed parameters and the fixed set of temporary map names used by
//! one invocation.
//!
//! Temporary names are deterministic per process and reused across
//! iterations: every observer overwrites the same four maps, which bounds
//! disk usage and intentionally serializes the loop.

/// Distance floor passed to the nearest-distance query.
///
/// Neighbors closer than one map unit are never reported as "nearest";
/// inherited, unexplained behavior of the original tool, kept as is.
pub const MIN_NEIGHBOR_DISTANCE: f64 = 1.0;

/// Parameters forwarded to the external viewshed command
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewshedParams {
    /// Viewing elevation above the ground, in map length units
    pub observer_elevation: f64,

    /// Maximum visibility radius; -1 means unbounded
    pub max_distance: f64,

    /// Consider the curvature of the earth (current ellipsoid)
    pub curvature: bool,
}

impl ViewshedParams {
    /// Set the observer eye height
    pub fn with_observer_elevation(mut self, elevation: f64) -> Self {
        self.observer_elevation = elevation;
        self
    }

    /// Set the maximum visibility radius (-1 for unbounded)
    pub fn with_max_distance(mut self, distance: f64) -> Self {
        self.max_distance = distance;
        self
    }

    /// Enable or disable earth-curvature correction
    pub fn with_curvature(mut self, curvature: bool) -> Self {
        self.curvature = curvature;
        self
    }
}

impl Default for ViewshedParams {
    /// Defaults of the original tool: eye height 1.75, unbounded radius,
    /// no curvature correction
    fn default() -> Self {
        Self {
            observer_elevation: 1.75,
            max_distance: -1.0,
            curvature: false,
        }
    }
}

/// The fixed, deterministic set of temporary map names for one invocation
///
/// Derived from the process id so concurrent runs in the same mapset do
/// not collide. All four names are registered for removal when the run
/// ends, on any exit path.
#[derive(Clone, Debug, PartialEq)]
pub struct TempMaps {
    /// Raw single-point visibility raster written by the viewshed command
    pub viewshed: String,
    /// Vectorized footprint of the tagged viewshed
    pub viewshed_vector: String,
    /// Subset of the input points overlapping the footprint
    pub visible_points: String,
    /// Ephemeral single-point layer holding the current observer
    pub current_point: String,
}

impl TempMaps {
    /// Build the temp names for a given process id
    pub fn for_pid(pid: u32) -> Self {
        let prefix = format!("tmp_viewshed_points_{pid}");
        Self {
            viewshed: format!("{prefix}_viewshed"),
            viewshed_vector: format!("{prefix}_viewshed_vector"),
            visible_points: format!("{prefix}_points"),
            current_point: format!("{prefix}_current_point"),
        }
    }

    /// Build the temp names for the current process
    pub fn for_current_process() -> Self {
        Self::for_pid(std::process::id())
    }
}
