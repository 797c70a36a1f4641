// Placed structures: the miner camp and kill-traps.
//
// A structure stamps a fixed `TerrainPatch` onto the grid when it is placed
// (3x3 Grass for a camp, a single Empty cell for a trap) and then runs its
// own per-tick logic.
//
// The camp owns its miners' ids and drives them: every tick it maybe spawns
// one miner on its spawn cell, then updates every miner it ever spawned, in
// spawn order, crediting whatever gold they dig. Killed miners stay in the
// list forever; only the live count is capped. Traps are owned by the map and
// updated there (see `Map::update_traps`).
//
// See also: `map.rs` for `merge()` and the agent arena, `agent.rs` for the
// miner state machine the camp forwards ticks to.

use crate::config::CampData;
use crate::event::{Footprint, SimEventKind};
use crate::map::Map;
use crate::prng::GameRng;
use crate::timer::Timer;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// A rectangle of terrain types that a structure merges into the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPatch {
    size_x: i32,
    size_z: i32,
    /// Row-major, index = x + z * size_x.
    cells: Vec<TerrainType>,
}

impl TerrainPatch {
    /// A patch of one terrain type.
    pub fn filled(size_x: i32, size_z: i32, terrain: TerrainType) -> Self {
        let size_x = size_x.max(0);
        let size_z = size_z.max(0);
        Self {
            size_x,
            size_z,
            cells: vec![terrain; (size_x * size_z) as usize],
        }
    }

    pub fn size_x(&self) -> i32 {
        self.size_x
    }

    pub fn size_z(&self) -> i32 {
        self.size_z
    }

    /// Terrain at a patch-local offset.
    pub fn get(&self, x: i32, z: i32) -> Option<TerrainType> {
        if x < 0 || z < 0 || x >= self.size_x || z >= self.size_z {
            return None;
        }
        self.cells.get((x + z * self.size_x) as usize).copied()
    }

    pub fn set(&mut self, x: i32, z: i32, terrain: TerrainType) {
        if x < 0 || z < 0 || x >= self.size_x || z >= self.size_z {
            return;
        }
        if let Some(cell) = self.cells.get_mut((x + z * self.size_x) as usize) {
            *cell = terrain;
        }
    }

    /// (offset, terrain) for every cell, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinates, TerrainType)> + '_ {
        let size_x = self.size_x;
        self.cells.iter().enumerate().map(move |(i, &terrain)| {
            let i = i as i32;
            (Coordinates::cell(i % size_x, i / size_x), terrain)
        })
    }

    pub fn footprint(&self, origin: Coordinates) -> Footprint {
        Footprint {
            origin,
            size_x: self.size_x,
            size_z: self.size_z,
        }
    }
}

// ---------------------------------------------------------------------------
// Camp
// ---------------------------------------------------------------------------

/// Side length of the camp footprint.
pub const CAMP_SIZE: i32 = 3;

/// The miners' home base. Spawns miners and banks their gold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Camp {
    id: CampId,
    origin: Coordinates,
    spawn_timer: Timer,
    max_alive_miners: usize,
    /// Every miner ever spawned, in spawn order. Killed ones are never pruned.
    miners: Vec<AgentId>,
    gold: u32,
    points: u32,
}

impl Camp {
    /// Place a camp with its footprint's minimum corner at `origin`, stamping
    /// the grass footprint onto the map.
    pub fn place(
        id: CampId,
        origin: Coordinates,
        data: &CampData,
        map: &mut Map,
        events: &mut Vec<SimEventKind>,
    ) -> Self {
        let patch = TerrainPatch::filled(CAMP_SIZE, CAMP_SIZE, TerrainType::Grass);
        map.merge(&patch, origin);
        events.push(SimEventKind::ObjectCreated {
            id: ObjectId::Camp(id),
            kind: ObjectKind::Camp,
            footprint: Some(patch.footprint(origin)),
        });
        log::info!("camp {} placed at {origin}", id.0);

        Self {
            id,
            origin,
            spawn_timer: Timer::new(data.spawn_interval),
            max_alive_miners: data.max_alive_miners,
            miners: Vec::new(),
            gold: 0,
            points: 0,
        }
    }

    pub fn id(&self) -> CampId {
        self.id
    }

    pub fn origin(&self) -> Coordinates {
        self.origin
    }

    /// The fixed interior cell new miners appear on.
    pub fn spawn_cell(&self) -> Coordinates {
        self.origin + Coordinates::cell(1, 1)
    }

    pub fn miners(&self) -> &[AgentId] {
        &self.miners
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    /// One per spawned miner plus all gold ever credited.
    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn max_alive_miners(&self) -> usize {
        self.max_alive_miners
    }

    /// Miners from this camp that are not killed.
    pub fn alive_miners(&self, map: &Map) -> usize {
        self.miners
            .iter()
            .filter(|id| map.agent(**id).is_some_and(|a| !a.is_killed()))
            .count()
    }

    pub fn increase_gold(&mut self, amount: u32) {
        self.gold += amount;
        self.points += amount;
    }

    /// Spawn a miner if the cap and timer allow, then update every miner.
    pub fn update(
        &mut self,
        map: &mut Map,
        rng: &mut GameRng,
        dt: f32,
        events: &mut Vec<SimEventKind>,
    ) {
        // The timer only runs while under the cap.
        if self.alive_miners(map) < self.max_alive_miners && self.spawn_timer.advance(dt) {
            self.try_spawn(map, rng, events);
        }

        for i in 0..self.miners.len() {
            let id = self.miners[i];
            let gold = map.update_agent(id, rng, dt, events);
            if gold > 0 {
                self.increase_gold(gold);
                events.push(SimEventKind::GoldMined {
                    camp: self.id,
                    amount: gold,
                });
            }
        }
    }

    fn try_spawn(&mut self, map: &mut Map, rng: &mut GameRng, events: &mut Vec<SimEventKind>) {
        let cell = self.spawn_cell();
        let free = map.get_block(cell).is_some_and(|b| !b.is_occupied(None));
        if !free {
            log::debug!("camp {} spawn cell {cell} is occupied", self.id.0);
            return;
        }
        if let Some(id) = map.spawn_agent(AgentKind::Miner, cell, Some(self.id), rng, events) {
            self.miners.push(id);
            self.points += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Trap
// ---------------------------------------------------------------------------

/// A single-cell structure that kills monsters standing on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trap {
    id: TrapId,
    position: Coordinates,
    monsters_killed: u32,
}

impl Trap {
    pub fn new(id: TrapId, position: Coordinates) -> Self {
        Self {
            id,
            position,
            monsters_killed: 0,
        }
    }

    /// The terrain a trap stamps onto its cell.
    pub fn patch() -> TerrainPatch {
        TerrainPatch::filled(1, 1, TerrainType::Empty)
    }

    pub fn id(&self) -> TrapId {
        self.id
    }

    pub fn position(&self) -> Coordinates {
        self.position
    }

    pub fn monsters_killed(&self) -> u32 {
        self.monsters_killed
    }

    pub(crate) fn record_kill(&mut self) {
        self.monsters_killed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn open_map() -> Map {
        // 10x10 all rock with a solid border.
        let config = SimConfig {
            map_size: (10, 10),
            deposits: Vec::new(),
            ..SimConfig::default()
        };
        Map::from_config(&config)
    }

    #[test]
    fn patch_lookup() {
        let mut patch = TerrainPatch::filled(2, 3, TerrainType::Grass);
        patch.set(1, 2, TerrainType::Empty);
        assert_eq!(patch.get(1, 2), Some(TerrainType::Empty));
        assert_eq!(patch.get(0, 0), Some(TerrainType::Grass));
        assert_eq!(patch.get(2, 0), None);
        assert_eq!(patch.iter().count(), 6);
    }

    #[test]
    fn camp_stamps_grass_footprint() {
        let mut map = open_map();
        let mut events = Vec::new();
        let camp = Camp::place(
            CampId(0),
            Coordinates::cell(3, 3),
            &CampData::default(),
            &mut map,
            &mut events,
        );
        for z in 3..6 {
            for x in 3..6 {
                assert_eq!(
                    map.get_block(Coordinates::cell(x, z)).map(|b| b.terrain()),
                    Some(TerrainType::Grass)
                );
            }
        }
        assert_eq!(camp.spawn_cell(), Coordinates::cell(4, 4));
        let created = SimEventKind::ObjectCreated {
            id: ObjectId::Camp(CampId(0)),
            kind: ObjectKind::Camp,
            footprint: Some(Footprint {
                origin: Coordinates::cell(3, 3),
                size_x: 3,
                size_z: 3,
            }),
        };
        assert_eq!(events, vec![created]);
    }

    #[test]
    fn camp_spawns_after_interval() {
        let mut map = open_map();
        let mut rng = GameRng::new(1);
        let mut events = Vec::new();
        let mut camp = Camp::place(
            CampId(0),
            Coordinates::cell(3, 3),
            &CampData::default(),
            &mut map,
            &mut events,
        );

        // 2.0 s interval, fires strictly past it.
        for _ in 0..4 {
            camp.update(&mut map, &mut rng, 0.5, &mut events);
        }
        assert!(camp.miners().is_empty());
        camp.update(&mut map, &mut rng, 0.5, &mut events);
        assert_eq!(camp.miners().len(), 1);
        assert_eq!(camp.points(), 1);
        assert_eq!(camp.gold(), 0);
        let spawned = events
            .iter()
            .any(|e| matches!(e, SimEventKind::MinerSpawned { .. }));
        assert!(spawned);
    }

    #[test]
    fn camp_skips_spawn_on_occupied_cell() {
        let mut map = open_map();
        let mut rng = GameRng::new(1);
        let mut events = Vec::new();
        let data = CampData {
            spawn_interval: 0.05,
            max_alive_miners: 20,
        };
        let mut camp = Camp::place(
            CampId(0),
            Coordinates::cell(3, 3),
            &data,
            &mut map,
            &mut events,
        );
        let spawn = camp.spawn_cell();
        let blocker = map
            .spawn_agent(AgentKind::Monster, spawn, None, &mut rng, &mut events)
            .unwrap();
        assert!(map.agent(blocker).is_some());

        // Camp updates do not move the monster (it is not a camp miner).
        camp.update(&mut map, &mut rng, 0.1, &mut events);
        assert!(camp.miners().is_empty());
        assert_eq!(camp.points(), 0);
    }

    #[test]
    fn camp_respects_alive_cap() {
        let mut map = open_map();
        let mut rng = GameRng::new(9);
        let mut events = Vec::new();
        let data = CampData {
            spawn_interval: 0.05,
            max_alive_miners: 2,
        };
        let mut camp = Camp::place(
            CampId(0),
            Coordinates::cell(3, 3),
            &data,
            &mut map,
            &mut events,
        );
        for _ in 0..200 {
            camp.update(&mut map, &mut rng, 0.1, &mut events);
            assert!(camp.alive_miners(&map) <= 2);
        }
        assert!(camp.miners().len() <= 2);
    }

    #[test]
    fn increase_gold_adds_to_points() {
        let mut map = open_map();
        let mut events = Vec::new();
        let mut camp = Camp::place(
            CampId(0),
            Coordinates::cell(3, 3),
            &CampData::default(),
            &mut map,
            &mut events,
        );
        camp.increase_gold(10);
        camp.increase_gold(1);
        assert_eq!(camp.gold(), 11);
        assert_eq!(camp.points(), 11);
    }
}
