// Core types shared across the simulation.
//
// Defines grid coordinates (`Coordinates`) with the compass constants used by
// every neighbor scan, compact object identifiers, the terrain enum with its
// passability predicates, and the shared object state enum. All types derive
// `Serialize`/`Deserialize` so events and commands can cross a process
// boundary unchanged.
//
// See also: `block.rs` for the cell that carries a `TerrainType`,
// `map.rs` for the grid indexed by `Coordinates`, `agent.rs` for the state
// machines driven by `ObjectState`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A cell position or a heading on the grid.
///
/// The grid is flat: `y` is always 0 for cells but is kept so headings and
/// positions share one type.
/// - X: east  (positive) / west  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinates {
    pub const ZERO: Self = Self::new(0, 0, 0);
    pub const UNIT: Self = Self::new(1, 1, 1);
    pub const NORTH: Self = Self::new(0, 0, -1);
    pub const EAST: Self = Self::new(1, 0, 0);
    pub const SOUTH: Self = Self::new(0, 0, 1);
    pub const WEST: Self = Self::new(-1, 0, 0);

    /// The four cardinal headings, clockwise from north.
    pub const DIRECTIONS: [Self; 4] = [Self::NORTH, Self::EAST, Self::SOUTH, Self::WEST];

    /// The eight compass headings, clockwise from north. Diagonals are sums
    /// of adjacent cardinals.
    pub const COMPASS: [Self; 8] = [
        Self::NORTH,
        Self::NORTH.offset(Self::EAST),
        Self::EAST,
        Self::EAST.offset(Self::SOUTH),
        Self::SOUTH,
        Self::SOUTH.offset(Self::WEST),
        Self::WEST,
        Self::WEST.offset(Self::NORTH),
    ];

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// A cell on the flat grid.
    pub const fn cell(x: i32, z: i32) -> Self {
        Self::new(x, 0, z)
    }

    /// Componentwise sum, usable in constant expressions.
    pub const fn offset(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// The four cardinal neighbors of this cell, in `DIRECTIONS` order.
    pub fn neighbors(self) -> [Self; 4] {
        Self::DIRECTIONS.map(|d| self + d)
    }
}

impl Add for Coordinates {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.offset(other)
    }
}

impl AddAssign for Coordinates {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Coordinates {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Object IDs: compact integers handed out in creation order.
// ---------------------------------------------------------------------------

/// Identifier of a miner or monster in the map's agent arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Identifier of a placed trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrapId(pub u32);

/// Identifier of a camp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampId(pub u32);

/// Any object with a visual representation, as seen by the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectId {
    Agent(AgentId),
    Trap(TrapId),
    Camp(CampId),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Agent(id) => write!(f, "Agent #{}", id.0),
            ObjectId::Trap(id) => write!(f, "Trap #{}", id.0),
            ObjectId::Camp(id) => write!(f, "Camp #{}", id.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// Behavioral kind of a grid-dwelling agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// Digs Rock and Gold, earns gold for its camp.
    Miner,
    /// Wanders open ground and kills adjacent miners.
    Monster,
}

/// Kind of visual the scene should create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Miner,
    Monster,
    Camp,
    Trap,
}

impl From<AgentKind> for ObjectKind {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Miner => ObjectKind::Miner,
            AgentKind::Monster => ObjectKind::Monster,
        }
    }
}

/// State shared by blocks and agents. Blocks only use `Idle` and `Flooding`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectState {
    #[default]
    Idle,
    Flooding,
    Moving,
    Digging,
    Waiting,
    /// Terminal. Nothing leaves this state.
    Killed,
}

/// The material of a single grid cell. Exactly one per block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Rock,
    Empty,
    Water,
    Gold,
    Grass,
    Solid,
    /// Hidden pocket, revealed only by digging an adjacent Rock or Gold block.
    Cave,
}

impl TerrainType {
    pub const ALL: [TerrainType; 7] = [
        TerrainType::Rock,
        TerrainType::Empty,
        TerrainType::Water,
        TerrainType::Gold,
        TerrainType::Grass,
        TerrainType::Solid,
        TerrainType::Cave,
    ];

    /// No ceiling: the cell is walkable open ground.
    pub fn is_open(self) -> bool {
        matches!(self, TerrainType::Empty | TerrainType::Grass)
    }

    pub fn is_diggable(self) -> bool {
        matches!(self, TerrainType::Rock | TerrainType::Gold)
    }

    pub fn is_floodable(self) -> bool {
        matches!(self, TerrainType::Empty | TerrainType::Grass)
    }

    pub fn is_passable(self) -> bool {
        matches!(
            self,
            TerrainType::Empty | TerrainType::Grass | TerrainType::Water
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_diagonals_are_sums_of_cardinals() {
        assert_eq!(Coordinates::COMPASS[1], Coordinates::new(1, 0, -1));
        assert_eq!(Coordinates::COMPASS[3], Coordinates::new(1, 0, 1));
        assert_eq!(Coordinates::COMPASS[5], Coordinates::new(-1, 0, 1));
        assert_eq!(Coordinates::COMPASS[7], Coordinates::new(-1, 0, -1));
        for (i, d) in Coordinates::DIRECTIONS.iter().enumerate() {
            assert_eq!(Coordinates::COMPASS[i * 2], *d);
        }
    }

    #[test]
    fn cardinals_are_flat_unit_steps() {
        for d in Coordinates::DIRECTIONS {
            assert_eq!(d.y, 0);
            assert_eq!(d.x.abs() + d.z.abs(), 1);
        }
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Coordinates::new(3, 0, 4);
        let b = Coordinates::new(-1, 2, 5);
        assert_eq!(a + b, Coordinates::new(2, 2, 9));
        assert_eq!(a - b, Coordinates::new(4, -2, -1));
        let mut c = a;
        c += Coordinates::EAST;
        assert_eq!(c, Coordinates::cell(4, 4));
        assert_eq!(Coordinates::ZERO + Coordinates::UNIT, Coordinates::UNIT);
    }

    #[test]
    fn neighbors_follow_direction_order() {
        let n = Coordinates::cell(5, 5).neighbors();
        assert_eq!(n[0], Coordinates::cell(5, 4));
        assert_eq!(n[1], Coordinates::cell(6, 5));
        assert_eq!(n[2], Coordinates::cell(5, 6));
        assert_eq!(n[3], Coordinates::cell(4, 5));
    }

    #[test]
    fn open_is_exactly_empty_or_grass() {
        for t in TerrainType::ALL {
            let expected = t == TerrainType::Empty || t == TerrainType::Grass;
            assert_eq!(t.is_open(), expected, "{t:?}");
        }
    }

    #[test]
    fn only_rock_and_gold_are_diggable() {
        let diggable: Vec<_> = TerrainType::ALL
            .into_iter()
            .filter(|t| t.is_diggable())
            .collect();
        assert_eq!(diggable, vec![TerrainType::Rock, TerrainType::Gold]);
    }

    #[test]
    fn water_is_passable_but_not_floodable() {
        assert!(TerrainType::Water.is_passable());
        assert!(!TerrainType::Water.is_floodable());
        assert!(!TerrainType::Solid.is_passable());
        assert!(!TerrainType::Cave.is_passable());
    }
}
