//! Navmesh construction and path query errors.

use crate::error::{EngineError, ErrorKind};

/// Why no route exists between two points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoPathReason {
    StartOutside,
    EndOutside,
    /// Start and end lie on separate islands of the mesh.
    Disconnected { start_group: usize, end_group: usize },
    /// Same island but the search exhausted the corridor graph.
    Unreachable,
}

impl std::fmt::Display for NoPathReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartOutside => f.write_str("start point is outside the navmesh"),
            Self::EndOutside => f.write_str("end point is outside the navmesh"),
            Self::Disconnected {
                start_group,
                end_group,
            } => write!(f, "disconnected islands (start group {start_group}, end group {end_group})"),
            Self::Unreachable => f.write_str("no corridor between start and end"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no navmesh registered")]
    NoNavMesh,

    #[error("no path found: {0}")]
    NoPathFound(NoPathReason),
}

impl EngineError for PathError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NotFound
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoNavMesh => "PATH_NO_NAVMESH",
            Self::NoPathFound(NoPathReason::StartOutside) => "PATH_START_OUTSIDE",
            Self::NoPathFound(NoPathReason::EndOutside) => "PATH_END_OUTSIDE",
            Self::NoPathFound(NoPathReason::Disconnected { .. }) => "PATH_DISCONNECTED",
            Self::NoPathFound(NoPathReason::Unreachable) => "PATH_UNREACHABLE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavMeshError {
    #[error("walkable geometry contains no triangles")]
    Empty,

    #[error("index buffer length {len} is not a multiple of three")]
    MalformedIndices { len: usize },

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

impl EngineError for NavMeshError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::LoadFailure
    }
}
