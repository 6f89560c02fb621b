//! # Ports
//!
//! Trait definitions for the external command boundary. Contracts only,
//! no implementations.
//!
//! This is the hexagonal architecture boundary:
//! - Ports define WHAT geoprocessing operations are needed
//! - Adapters define HOW they're invoked
//!
//! The core loop doesn't know about subprocesses; it only sees these
//! traits. The GRASS adapter implements them by spawning toolbox modules;
//! the test suite implements them with an in-memory mock.

mod raster;
mod vector;
mod viewshed;

use crate::core::parse::ParseError;

// Re-export traits
pub use raster::RasterOps;
pub use vector::VectorOps;
pub use viewshed::Viewshed;

/// Result type for toolbox operations
pub type ToolboxResult<T> = Result<T, ToolboxError>;

/// Kind of map a name refers to, for typed removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapKind {
    Raster,
    Vector,
}

impl MapKind {
    /// The type keyword external removal commands expect
    pub fn as_str(&self) -> &'static str {
        match self {
            MapKind::Raster => "raster",
            MapKind::Vector => "vector",
        }
    }
}

/// Errors crossing the external command boundary
///
/// Any of these is fatal to the run: there is no retry and no
/// partial-result recovery beyond rows already committed.
#[derive(Debug, thiserror::Error)]
pub enum ToolboxError {
    /// The tool could not be launched at all
    #[error("failed to launch '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited nonzero
    #[error("'{tool}' failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// The tool succeeded but its output was not parsable
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_kind_keywords() {
        assert_eq!(MapKind::Raster.as_str(), "raster");
        assert_eq!(MapKind::Vector.as_str(), "vector");
    }

    #[test]
    fn test_failed_error_names_the_tool() {
        let err = ToolboxError::Failed {
            tool: "r.viewshed".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "ERROR: Raster map not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("r.viewshed"));
        assert!(msg.contains("Raster map not found"));
    }
}
