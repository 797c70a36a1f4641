// A single grid cell: terrain, occupancy, and the flood timer.
//
// Blocks are created once when the map is built and never destroyed, only
// re-typed. Each block holds the ids of the agents currently standing on it
// or moving into it. Occupancy is a set of `AgentId`s (weak references into
// the map's agent arena), so assigning and removing are idempotent set
// operations and a block never owns an agent.
//
// Flooding is two-phase. `start_flooding()` turns the block into Water at
// once and puts it in the `Flooding` state; the one-shot flood timer then
// fills over the configured duration, and only once it is complete does the
// map spread water to the neighbors (see `Map::update_terrain`). The
// `set_flooded()` path skips the fill entirely and is used when generation
// or a cave reveal produces water that is already full.
//
// Everything that needs neighbors (dig reveals, flood spread, killing
// occupants) lives on `Map`, which can see the whole grid and the arena.
//
// See also: `map.rs` for the grid and per-tick terrain logic, `timer.rs` for
// the accumulator semantics, `types.rs` for `TerrainType` predicates.

use crate::timer::Timer;
use crate::types::{AgentId, Coordinates, ObjectState, TerrainType};
use smallvec::SmallVec;

/// Occupant ids of a block. Rarely more than two at once (one agent standing,
/// one moving in).
pub type Occupants = SmallVec<[AgentId; 2]>;

/// One cell of the map grid.
#[derive(Clone, Debug)]
pub struct Block {
    position: Coordinates,
    terrain: TerrainType,
    occupants: Occupants,
    flood_timer: Timer,
    state: ObjectState,
}

impl Block {
    pub fn new(position: Coordinates, terrain: TerrainType, flood_duration: f32) -> Self {
        Self {
            position,
            terrain,
            occupants: Occupants::new(),
            flood_timer: Timer::one_shot(flood_duration),
            state: ObjectState::Idle,
        }
    }

    pub fn position(&self) -> Coordinates {
        self.position
    }

    pub fn terrain(&self) -> TerrainType {
        self.terrain
    }

    pub fn set_terrain(&mut self, terrain: TerrainType) {
        self.terrain = terrain;
    }

    /// `Idle` or `Flooding`.
    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }

    pub fn is_open(&self) -> bool {
        self.terrain.is_open()
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn is_cave(&self) -> bool {
        self.terrain == TerrainType::Cave
    }

    pub fn is_diggable(&self) -> bool {
        self.terrain.is_diggable()
    }

    pub fn is_floodable(&self) -> bool {
        self.terrain.is_floodable()
    }

    pub fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }

    /// Whether some agent other than `excluding` holds this block.
    ///
    /// False for no occupants, or for a single occupant equal to
    /// `excluding`. Two or more occupants always count as occupied.
    pub fn is_occupied(&self, excluding: Option<AgentId>) -> bool {
        match self.occupants.as_slice() {
            [] => false,
            [only] => excluding != Some(*only),
            _ => true,
        }
    }

    /// Add an agent to the occupant set. No-op if already present.
    pub fn assign(&mut self, agent: AgentId) {
        if !self.occupants.contains(&agent) {
            self.occupants.push(agent);
        }
    }

    /// Remove an agent from the occupant set. No-op if absent.
    pub fn remove(&mut self, agent: AgentId) {
        self.occupants.retain(|id| *id != agent);
    }

    /// Empty the occupant set, returning what was in it. Callers destroy the
    /// returned agents after the set is already detached from the block.
    pub fn take_occupants(&mut self) -> Occupants {
        std::mem::take(&mut self.occupants)
    }

    /// Fill height in [0, 1]. Non-water blocks report 1.0.
    pub fn water_level(&self) -> f32 {
        if self.terrain == TerrainType::Water {
            let filled = self.flood_timer.current() / self.flood_timer.max();
            filled.min(1.0)
        } else {
            1.0
        }
    }

    /// Whether the flood timer has filled. A filled block spreads water to
    /// its floodable neighbors on every update.
    pub fn is_flooded(&self) -> bool {
        self.flood_timer.is_complete()
    }

    /// Become fully flooded water instantly, skipping the fill.
    pub fn set_flooded(&mut self) {
        self.terrain = TerrainType::Water;
        self.state = ObjectState::Idle;
        self.flood_timer.complete();
    }

    /// Become Water and start filling. The timer continues from its current
    /// value rather than restarting.
    pub fn start_flooding(&mut self) {
        self.state = ObjectState::Flooding;
        self.terrain = TerrainType::Water;
    }

    /// Advance the fill by `dt`. Returns `true` on the step the fill
    /// finishes, at which point the block returns to `Idle`.
    pub fn advance_flood(&mut self, dt: f32) -> bool {
        if self.flood_timer.advance(dt) {
            self.state = ObjectState::Idle;
            return true;
        }
        false
    }

    /// Turn this block into open ground. Cave reveals around it are handled
    /// by `Map::dig`.
    pub fn dig(&mut self) {
        self.terrain = TerrainType::Empty;
    }

    /// A trap can only be placed on free open ground.
    pub fn can_place_structure(&self) -> bool {
        self.terrain == TerrainType::Empty && !self.is_occupied(None)
    }
}
