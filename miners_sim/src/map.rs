// The cave map: block grid, agent arena, traps, and world generation.
//
// `Map` owns everything that lives on the grid:
// - the `Grid` of blocks,
// - every agent ever spawned, in a `BTreeMap<AgentId, Agent>` arena (blocks
//   only hold ids),
// - the list of map-owned ("free") agents, which are the monsters revealed
//   by digging. Camp miners live in the same arena but are driven by their
//   camp (see `structure.rs`),
// - placed traps.
//
// Per-tick order inside `update()`:
//   1. terrain: every block, row by row (flood kills and flood spread),
//   2. free agents, in spawn order,
//   3. traps, in placement order.
// The camp's miners run after all of this (`SimState::step`). Because kills
// happen before a victim's own turn, a drowned agent never acts in the tick
// it dies.
//
// Killed agents are never removed from the arena or the free list; they are
// skipped. Their ids stay valid for stats and event consumers.
//
// Generation (`generate_random`) places deposit blotches by a self-avoiding
// random walk. Every committed cell must have only Rock or the deposit's own
// terrain in its 8-neighborhood, so deposits never touch each other, the
// camp, or the border.
//
// Terrain changes are recorded in a dirty set that `SimState` drains into a
// `TerrainChanged` event once per step.
//
// See also: `grid.rs` for storage, `block.rs` for per-cell state,
// `agent.rs` for the state machine, `structure.rs` for camps and traps.
//
// **Critical constraint: determinism.** All randomness comes from the
// `GameRng` passed in. Arena and dirty set are ordered collections.

use crate::agent::{Agent, AgentAction};
use crate::block::Block;
use crate::config::{AgentData, DigRewards, SimConfig};
use crate::error::PlacementError;
use crate::event::{KillCause, SimEventKind};
use crate::grid::Grid;
use crate::prng::GameRng;
use crate::structure::{TerrainPatch, Trap};
use crate::types::*;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// Random start-cell picks per deposit before giving up on it.
pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 10_000;

/// The grid plus everything standing on it.
#[derive(Clone, Debug)]
pub struct Map {
    grid: Grid,
    block_size: f32,
    agents: BTreeMap<AgentId, Agent>,
    /// Agents the map drives itself. Camp miners are not in here.
    free_agents: Vec<AgentId>,
    traps: Vec<Trap>,
    next_agent_id: u32,
    next_trap_id: u32,
    agent_data: BTreeMap<AgentKind, AgentData>,
    rewards: DigRewards,
    max_placement_attempts: u32,
    dirty: BTreeSet<Coordinates>,
}

impl Map {
    /// An all-Rock map with a Solid border, default agent behavior and
    /// rewards. Every cell starts dirty.
    pub fn new(size_x: i32, size_z: i32, block_size: f32, flood_duration: f32) -> Self {
        let mut agent_data = BTreeMap::new();
        agent_data.insert(AgentKind::Miner, AgentData::miner());
        agent_data.insert(AgentKind::Monster, AgentData::monster());

        let mut map = Self {
            grid: Grid::new(size_x, size_z, flood_duration),
            block_size,
            agents: BTreeMap::new(),
            free_agents: Vec::new(),
            traps: Vec::new(),
            next_agent_id: 0,
            next_trap_id: 0,
            agent_data,
            rewards: DigRewards::default(),
            max_placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            dirty: BTreeSet::new(),
        };

        for cell in map.grid.cells() {
            let border = map.grid.is_border(cell);
            if let Some(block) = map.grid.get_mut(cell).filter(|_| border) {
                block.set_terrain(TerrainType::Solid);
            }
            map.dirty.insert(cell);
        }
        map
    }

    /// A bare map (no camp, no deposits) sized and tuned from `config`.
    pub fn from_config(config: &SimConfig) -> Self {
        let (size_x, size_z) = config.map_size;
        let mut map = Self::new(size_x, size_z, config.block_size, config.flood_duration);
        map.agent_data = config.agents.clone();
        map.rewards = config.rewards.clone();
        map.max_placement_attempts = config.max_placement_attempts;
        map
    }

    // -----------------------------------------------------------------------
    // Lookup and geometry
    // -----------------------------------------------------------------------

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Bounds-checked block lookup.
    pub fn get_block(&self, position: Coordinates) -> Option<&Block> {
        self.grid.get(position)
    }

    pub fn is_position_inside(&self, position: Coordinates) -> bool {
        self.grid.in_bounds(position)
    }

    /// Grid dimensions as a vector (y is 0).
    pub fn size(&self) -> Coordinates {
        Coordinates::cell(self.grid.size_x(), self.grid.size_z())
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::cell(self.grid.size_x() / 2, self.grid.size_z() / 2)
    }

    /// World units per cell.
    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    /// The cell under a world-space point, or `None` off the map.
    pub fn cell_at_world(&self, world_x: f32, world_z: f32) -> Option<Coordinates> {
        let cell = Coordinates::cell(
            (world_x / self.block_size).floor() as i32,
            (world_z / self.block_size).floor() as i32,
        );
        self.grid.in_bounds(cell).then_some(cell)
    }

    /// World-space center of a cell, at ground height.
    pub fn cell_center(&self, position: Coordinates) -> [f32; 3] {
        let half = self.block_size * 0.5;
        [
            position.x as f32 * self.block_size + half,
            0.0,
            position.z as f32 * self.block_size + half,
        ]
    }

    /// Number of cells of each terrain type. Types with no cells are absent.
    pub fn terrain_histogram(&self) -> BTreeMap<TerrainType, usize> {
        let mut histogram = BTreeMap::new();
        for block in self.grid.blocks() {
            *histogram.entry(block.terrain()).or_insert(0) += 1;
        }
        histogram
    }

    /// Drain the set of cells whose terrain or water level changed.
    pub fn take_dirty_cells(&mut self) -> Vec<Coordinates> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Agents and traps
    // -----------------------------------------------------------------------

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every agent ever spawned, killed ones included, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Agents of `kind` that are not killed.
    pub fn live_agents(&self, kind: AgentKind) -> usize {
        self.agents
            .values()
            .filter(|a| a.kind() == kind && !a.is_killed())
            .count()
    }

    pub fn free_agents(&self) -> &[AgentId] {
        &self.free_agents
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    /// Create an agent at `position`, turn it once and put it on the grid.
    ///
    /// Agents without a camp are owned and updated by the map. Returns
    /// `None` (and logs) if the kind has no behavior data or the position is
    /// off the map.
    pub fn spawn_agent(
        &mut self,
        kind: AgentKind,
        position: Coordinates,
        camp: Option<CampId>,
        rng: &mut GameRng,
        events: &mut Vec<SimEventKind>,
    ) -> Option<AgentId> {
        let Some(data) = self.agent_data.get(&kind).cloned() else {
            log::warn!("no behavior data for {kind:?}, not spawning");
            return None;
        };
        let Some(block) = self.grid.get_mut(position) else {
            log::warn!("cannot spawn {kind:?} outside the map at {position}");
            return None;
        };

        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        block.assign(id);

        let mut agent = Agent::new(id, kind, position, camp, data);
        agent.turn(rng);
        self.agents.insert(id, agent);
        if camp.is_none() {
            self.free_agents.push(id);
        }

        events.push(SimEventKind::ObjectCreated {
            id: ObjectId::Agent(id),
            kind: kind.into(),
            footprint: None,
        });
        events.push(match kind {
            AgentKind::Miner => SimEventKind::MinerSpawned {
                agent: id,
                camp,
                position,
            },
            AgentKind::Monster => SimEventKind::MonsterSpawned {
                agent: id,
                position,
            },
        });
        log::debug!("{kind:?} #{} spawned at {position}", id.0);
        Some(id)
    }

    /// Kill an agent and detach it from the grid. Returns `false` if it was
    /// already dead or does not exist.
    pub fn kill_agent(
        &mut self,
        id: AgentId,
        cause: KillCause,
        events: &mut Vec<SimEventKind>,
    ) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        if !agent.mark_killed() {
            return false;
        }
        let kind = agent.kind();
        let position = agent.position();
        for cell in [position, agent.ahead()] {
            if let Some(block) = self.grid.get_mut(cell) {
                block.remove(id);
            }
        }

        events.push(match kind {
            AgentKind::Miner => SimEventKind::MinerKilled { agent: id, cause },
            AgentKind::Monster => SimEventKind::MonsterKilled { agent: id, cause },
        });
        events.push(SimEventKind::ObjectDestroyed {
            id: ObjectId::Agent(id),
        });
        log::debug!("{kind:?} #{} killed at {position}: {cause:?}", id.0);
        true
    }

    /// Live agents of `kind` listed in the block at `position`.
    fn agents_of_kind_at(&self, position: Coordinates, kind: AgentKind) -> SmallVec<[AgentId; 2]> {
        let Some(block) = self.grid.get(position) else {
            return SmallVec::new();
        };
        block
            .occupants()
            .iter()
            .copied()
            .filter(|id| self.is_live(*id, kind))
            .collect()
    }

    fn is_live(&self, id: AgentId, kind: AgentKind) -> bool {
        match self.agents.get(&id) {
            Some(agent) => agent.kind() == kind && !agent.is_killed(),
            None => false,
        }
    }

    /// Place a trap on free Empty ground.
    pub fn place_trap(
        &mut self,
        position: Coordinates,
        events: &mut Vec<SimEventKind>,
    ) -> Result<TrapId, PlacementError> {
        let block = self
            .grid
            .get(position)
            .ok_or(PlacementError::OutOfBounds(position))?;
        if block.is_occupied(None) {
            return Err(PlacementError::Occupied(position));
        }
        if !block.can_place_structure() {
            return Err(PlacementError::NotEmpty(position));
        }

        let id = TrapId(self.next_trap_id);
        self.next_trap_id += 1;
        let patch = Trap::patch();
        self.merge(&patch, position);
        self.traps.push(Trap::new(id, position));

        events.push(SimEventKind::ObjectCreated {
            id: ObjectId::Trap(id),
            kind: ObjectKind::Trap,
            footprint: Some(patch.footprint(position)),
        });
        events.push(SimEventKind::TrapPlaced { trap: id, position });
        log::info!("trap #{} placed at {position}", id.0);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Terrain edits
    // -----------------------------------------------------------------------

    /// Retype a cell. Returns `false` off the map.
    pub fn set_terrain(&mut self, position: Coordinates, terrain: TerrainType) -> bool {
        let Some(block) = self.grid.get_mut(position) else {
            return false;
        };
        block.set_terrain(terrain);
        self.dirty.insert(position);
        true
    }

    /// Turn a cell into fully flooded water with no fill phase. It starts
    /// spreading on the next terrain update.
    pub fn set_flooded(&mut self, position: Coordinates) -> bool {
        let Some(block) = self.grid.get_mut(position) else {
            return false;
        };
        block.set_flooded();
        self.dirty.insert(position);
        true
    }

    /// Turn a cell into water that fills over the flood duration.
    pub fn start_flooding(&mut self, position: Coordinates) -> bool {
        let Some(block) = self.grid.get_mut(position) else {
            return false;
        };
        block.start_flooding();
        self.dirty.insert(position);
        true
    }

    /// Stamp a structure's terrain onto the grid with its (0, 0) cell at
    /// `origin`. Cells off the map or on the border are left alone.
    pub fn merge(&mut self, patch: &TerrainPatch, origin: Coordinates) {
        for (offset, terrain) in patch.iter() {
            let cell = origin + offset;
            if self.grid.in_bounds(cell) && !self.grid.is_border(cell) {
                self.set_terrain(cell, terrain);
            }
        }
    }

    /// Player terrain edit. A Solid barrier only goes on passable, non-water,
    /// unoccupied ground; other types are written unconditionally. The
    /// border cannot be edited.
    pub fn update_block(
        &mut self,
        terrain: TerrainType,
        position: Coordinates,
    ) -> Result<(), PlacementError> {
        let block = self
            .grid
            .get(position)
            .ok_or(PlacementError::OutOfBounds(position))?;
        if self.grid.is_border(position) {
            return Err(PlacementError::Border(position));
        }
        if terrain == TerrainType::Solid {
            if block.terrain() == TerrainType::Water {
                return Err(PlacementError::Water(position));
            }
            if !block.is_passable() {
                return Err(PlacementError::Impassable(position));
            }
            if block.is_occupied(None) {
                return Err(PlacementError::Occupied(position));
            }
        }
        self.set_terrain(position, terrain);
        Ok(())
    }

    /// Dig out a block and reveal any cave pocket next to it.
    ///
    /// If at least one 4-neighbor is Cave, one draw picks what every
    /// connected cave cell becomes: Empty, Gold, Water (already flooded), or
    /// Empty with a monster spawned on the dug cell. Returns the terrain the
    /// block had before digging, or `None` off the map.
    pub fn dig(
        &mut self,
        position: Coordinates,
        rng: &mut GameRng,
        events: &mut Vec<SimEventKind>,
    ) -> Option<TerrainType> {
        let block = self.grid.get_mut(position)?;
        let previous = block.terrain();
        block.dig();
        self.dirty.insert(position);

        let caves: SmallVec<[Coordinates; 4]> = position
            .neighbors()
            .into_iter()
            .filter(|n| self.grid.get(*n).is_some_and(Block::is_cave))
            .collect();
        if caves.is_empty() {
            return Some(previous);
        }

        let (revealed_as, monster) = match rng.range_u64(0, 4) {
            0 => (TerrainType::Empty, false),
            1 => (TerrainType::Gold, false),
            2 => (TerrainType::Water, false),
            _ => (TerrainType::Empty, true),
        };
        if monster {
            self.spawn_agent(AgentKind::Monster, position, None, rng, events);
        }

        let cells: usize = caves
            .into_iter()
            .map(|start| self.fill_cave(start, revealed_as))
            .sum();
        events.push(SimEventKind::CaveRevealed {
            dug: position,
            revealed_as,
            cells,
            monster,
        });
        log::debug!("cave of {cells} cells revealed next to {position} as {revealed_as:?}");
        Some(previous)
    }

    /// Retype every Cave cell 4-connected to `start`. Returns how many.
    fn fill_cave(&mut self, start: Coordinates, terrain: TerrainType) -> usize {
        let mut stack = vec![start];
        let mut filled = 0;
        while let Some(cell) = stack.pop() {
            let Some(block) = self.grid.get_mut(cell).filter(|b| b.is_cave()) else {
                continue;
            };
            if terrain == TerrainType::Water {
                block.set_flooded();
            } else {
                block.set_terrain(terrain);
            }
            self.dirty.insert(cell);
            filled += 1;

            for neighbor in cell.neighbors() {
                if self.grid.get(neighbor).is_some_and(Block::is_cave) {
                    stack.push(neighbor);
                }
            }
        }
        filled
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Whether `position` and its 8 compass neighbors all exist and are Rock
    /// or `terrain`.
    pub fn is_valid_deposit_site(&self, position: Coordinates, terrain: TerrainType) -> bool {
        let fits = |cell: Coordinates| match self.grid.terrain(cell) {
            Some(t) => t == TerrainType::Rock || t == terrain,
            None => false,
        };
        fits(position) && Coordinates::COMPASS.iter().all(|d| fits(position + *d))
    }

    /// Place `max_count` blotches of `terrain`, each a random walk of up to
    /// `max_size` steps. Rejected steps are skipped, not retried.
    pub fn generate_random(
        &mut self,
        max_count: u32,
        max_size: u32,
        terrain: TerrainType,
        rng: &mut GameRng,
    ) {
        let size_x = self.grid.size_x();
        let size_z = self.grid.size_z();
        if size_x < 3 || size_z < 3 {
            log::warn!("map {size_x}x{size_z} has no interior, skipping {terrain:?} deposits");
            return;
        }

        let mut committed = 0u32;
        for _ in 0..max_count {
            let Some(start) = self.pick_deposit_site(terrain, rng) else {
                log::warn!(
                    "no site for a {terrain:?} deposit after {} attempts",
                    self.max_placement_attempts
                );
                continue;
            };

            let (mut x, mut z) = (start.x, start.z);
            for _ in 0..max_size {
                let (mut next_x, mut next_z) = (x, z);
                if rng.range_u64(0, 2) == 0 {
                    next_x += rng.range_i32(-1, 2);
                } else {
                    next_z += rng.range_i32(-1, 2);
                }
                let clamped_x = next_x.clamp(1, size_x - 2);
                let clamped_z = next_z.clamp(1, size_z - 2);
                let cell = Coordinates::cell(clamped_x, clamped_z);
                if !self.is_valid_deposit_site(cell, terrain) {
                    continue;
                }

                if terrain == TerrainType::Water {
                    self.set_flooded(cell);
                } else {
                    self.set_terrain(cell, terrain);
                }
                committed += 1;
                x = cell.x;
                z = cell.z;
            }
        }
        log::info!("{terrain:?} deposits: {max_count} blotches, {committed} steps committed");
    }

    fn pick_deposit_site(&self, terrain: TerrainType, rng: &mut GameRng) -> Option<Coordinates> {
        let size_x = self.grid.size_x();
        let size_z = self.grid.size_z();
        for _ in 0..self.max_placement_attempts {
            let x = rng.range_i32(0, size_x);
            let z = rng.range_i32(0, size_z);
            let cell = Coordinates::cell(x, z);
            if self.is_valid_deposit_site(cell, terrain) {
                return Some(cell);
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Per-tick update
    // -----------------------------------------------------------------------

    /// Advance terrain, map-owned agents and traps by `dt` seconds.
    pub fn update(&mut self, rng: &mut GameRng, dt: f32, events: &mut Vec<SimEventKind>) {
        self.update_terrain(dt, events);

        for i in 0..self.free_agents.len() {
            let id = self.free_agents[i];
            self.update_agent(id, rng, dt, events);
        }

        self.update_traps(events);
    }

    fn update_terrain(&mut self, dt: f32, events: &mut Vec<SimEventKind>) {
        for cell in self.grid.cells() {
            self.update_cell(cell, dt, events);
        }
    }

    fn update_cell(&mut self, cell: Coordinates, dt: f32, events: &mut Vec<SimEventKind>) {
        let Some(block) = self.grid.get_mut(cell) else {
            return;
        };

        // A filled block drowns its occupants and spreads one ring outward.
        if block.is_flooded() {
            let drowned = block.take_occupants();
            for id in drowned {
                self.kill_agent(id, KillCause::Drowned, events);
            }
            for neighbor in cell.neighbors() {
                if let Some(next) = self.grid.get_mut(neighbor).filter(|b| b.is_floodable()) {
                    next.start_flooding();
                    self.dirty.insert(neighbor);
                }
            }
        }

        let Some(block) = self.grid.get_mut(cell) else {
            return;
        };
        if block.state() == ObjectState::Flooding {
            let drowned = block.take_occupants();
            block.advance_flood(dt);
            self.dirty.insert(cell);
            for id in drowned {
                self.kill_agent(id, KillCause::Drowned, events);
            }
        }
    }

    /// Run one agent for one tick. Returns the gold it earned by digging.
    ///
    /// Killed agents are skipped. A hunter first kills every live prey on its
    /// four cardinal neighbors, then runs its state machine.
    pub fn update_agent(
        &mut self,
        id: AgentId,
        rng: &mut GameRng,
        dt: f32,
        events: &mut Vec<SimEventKind>,
    ) -> u32 {
        let Some(agent) = self.agents.get(&id) else {
            return 0;
        };
        if agent.is_killed() {
            return 0;
        }
        if let Some(prey) = agent.data().hunts {
            self.hunt(id, prey, events);
        }

        let Some(agent) = self.agents.get_mut(&id) else {
            return 0;
        };
        match agent.advance(&mut self.grid, rng, dt, self.block_size) {
            None => 0,
            Some(AgentAction::Moved(to)) => {
                events.push(SimEventKind::ObjectMoved {
                    id: ObjectId::Agent(id),
                    world_position: self.cell_center(to),
                });
                0
            }
            Some(AgentAction::Dig(target)) => {
                let Some(terrain) = self.grid.terrain(target) else {
                    return 0;
                };
                events.push(SimEventKind::BlockDug {
                    agent: id,
                    position: target,
                    terrain,
                });
                self.dig(target, rng, events);
                self.rewards.for_terrain(terrain)
            }
        }
    }

    fn hunt(&mut self, hunter: AgentId, prey: AgentKind, events: &mut Vec<SimEventKind>) {
        let Some(position) = self.agents.get(&hunter).map(Agent::position) else {
            return;
        };
        for neighbor in position.neighbors() {
            for victim in self.agents_of_kind_at(neighbor, prey) {
                if victim != hunter && self.kill_agent(victim, KillCause::Monster(hunter), events) {
                    if let Some(agent) = self.agents.get_mut(&hunter) {
                        agent.record_kill();
                    }
                }
            }
        }
    }

    fn update_traps(&mut self, events: &mut Vec<SimEventKind>) {
        for i in 0..self.traps.len() {
            let trap_id = self.traps[i].id();
            let position = self.traps[i].position();
            for victim in self.agents_of_kind_at(position, AgentKind::Monster) {
                if self.kill_agent(victim, KillCause::Trap(trap_id), events) {
                    self.traps[i].record_kill();
                }
            }
        }
    }
}
