// Error types for the two places the sim can refuse input: player edits to
// the grid, and configuration.
//
// Nothing on the per-tick path returns these. Ticks never fail; out-of-bounds
// lookups are `None` and capacity limits are skips.

use crate::types::{AgentKind, Coordinates};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a barrier or structure could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    #[error("{0} is outside the map")]
    OutOfBounds(Coordinates),
    #[error("{0} is part of the map border")]
    Border(Coordinates),
    #[error("{0} is under water")]
    Water(Coordinates),
    #[error("{0} is not passable ground")]
    Impassable(Coordinates),
    #[error("{0} is occupied")]
    Occupied(Coordinates),
    #[error("{0} is not empty ground")]
    NotEmpty(Coordinates),
}

/// A configuration that cannot drive a simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map must be at least 3x3, got {x}x{z}")]
    MapTooSmall { x: i32, z: i32 },
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    #[error("{field} must be within [0, 1]")]
    NotAProbability { field: &'static str },
    #[error("camp at ({x}, {z}) does not fit inside the border")]
    CampOutsideInterior { x: i32, z: i32 },
    #[error("no behavior data for {0:?}")]
    MissingAgentData(AgentKind),
}
