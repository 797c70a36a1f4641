// Top-level simulation state and tick loop.
//
// `SimState` owns the whole world: the map (grid, agents, traps), the camp,
// the config, and the single `GameRng`. The sim is a pure function
// `(state, commands, dt) -> (new_state, events)`.
//
// Startup (`new()` / `with_config()`):
//   1. build an all-Rock map with a Solid border,
//   2. place the camp, stamping its 3x3 Grass footprint,
//   3. run the configured deposit passes in order (by default Empty, Gold,
//      Water, Cave).
// The camp goes down before deposits so that deposits, which only grow on
// Rock, never overlap it.
//
// Each `step()`:
//   1. apply player commands,
//   2. `Map::update`: terrain, then map-owned agents, then traps,
//   3. `Camp::update`: maybe spawn a miner, then update every camp miner,
//   4. drain the map's dirty cells into one `TerrainChanged` event.
// Events from startup (the camp's `ObjectCreated`) are returned by the first
// step.
//
// See also: `map.rs` for the per-tick world logic, `structure.rs` for the
// camp, `command.rs` for player input, `event.rs` for output.
//
// **Critical constraint: determinism.** Same seed, same config and same
// command/dt sequence give the same events and the same final state. No
// system time, no OS entropy, no unordered collections.

use crate::command::SimCommand;
use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::event::{Scene, SimEvent, SimEventKind};
use crate::map::Map;
use crate::prng::GameRng;
use crate::structure::Camp;
use crate::types::*;
use std::collections::BTreeMap;

/// The entire simulated cave.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Number of completed steps.
    pub tick: u64,

    /// The simulation's deterministic PRNG.
    pub rng: GameRng,

    /// Configuration the world was built from.
    pub config: SimConfig,

    pub map: Map,

    pub camp: Camp,

    /// Events produced during construction, returned by the first step.
    pending: Vec<SimEvent>,
}

/// The result of advancing the simulation one step.
#[derive(Clone, Debug)]
pub struct StepResult {
    /// Events emitted during this step, in processing order.
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Create a new simulation with default config and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::build(seed, SimConfig::default())
    }

    /// Create a new simulation with the given seed and config.
    pub fn with_config(seed: u64, config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(seed, config))
    }

    fn build(seed: u64, config: SimConfig) -> Self {
        let mut rng = GameRng::new(seed);
        let mut map = Map::from_config(&config);
        let mut startup = Vec::new();

        let (camp_x, camp_z) = config.camp_origin;
        let camp = Camp::place(
            CampId(0),
            Coordinates::cell(camp_x, camp_z),
            &config.camp,
            &mut map,
            &mut startup,
        );

        for deposit in &config.deposits {
            map.generate_random(
                deposit.max_count,
                deposit.max_size,
                deposit.terrain,
                &mut rng,
            );
        }

        let (size_x, size_z) = config.map_size;
        log::info!("cave {size_x}x{size_z} generated from seed {seed}");

        Self {
            tick: 0,
            rng,
            config,
            map,
            camp,
            pending: startup
                .into_iter()
                .map(|kind| SimEvent { tick: 0, kind })
                .collect(),
        }
    }

    /// Apply `commands`, then advance the world by `dt` seconds.
    pub fn step(&mut self, commands: &[SimCommand], dt: f32) -> StepResult {
        self.tick += 1;
        let mut kinds = Vec::new();

        for command in commands {
            self.apply_command(command, &mut kinds);
        }

        self.map.update(&mut self.rng, dt, &mut kinds);
        self.camp.update(&mut self.map, &mut self.rng, dt, &mut kinds);

        let cells = self.map.take_dirty_cells();
        if !cells.is_empty() {
            kinds.push(SimEventKind::TerrainChanged { cells });
        }

        let tick = self.tick;
        let mut events = std::mem::take(&mut self.pending);
        events.extend(kinds.into_iter().map(|kind| SimEvent { tick, kind }));
        StepResult { events }
    }

    /// `step()`, then forward the scene notifications to `scene`.
    pub fn step_with_scene(
        &mut self,
        commands: &[SimCommand],
        dt: f32,
        scene: &mut dyn Scene,
    ) -> StepResult {
        let result = self.step(commands, dt);
        for event in &result.events {
            event.dispatch(scene);
        }
        result
    }

    /// Run `ticks` steps without commands and collect every event.
    pub fn run(&mut self, ticks: u32, dt: f32) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.step(&[], dt).events);
        }
        events
    }

    fn apply_command(&mut self, command: &SimCommand, events: &mut Vec<SimEventKind>) {
        let position = command.position();
        let outcome = match command {
            SimCommand::PlaceBarrier { .. } => {
                let placed = self.map.update_block(TerrainType::Solid, position);
                if placed.is_ok() {
                    events.push(SimEventKind::BarrierPlaced { position });
                }
                placed
            }
            // `place_trap` reports its own success events.
            SimCommand::PlaceTrap { .. } => self.map.place_trap(position, events).map(|_| ()),
        };
        if let Err(reason) = outcome {
            log::debug!("{command:?} rejected: {reason}");
            events.push(SimEventKind::PlacementRejected { position, reason });
        }
    }

    /// Camp miners that are still alive.
    pub fn alive_miners(&self) -> usize {
        self.camp.alive_miners(&self.map)
    }

    /// Monsters that are still alive.
    pub fn live_monsters(&self) -> usize {
        self.map.live_agents(AgentKind::Monster)
    }

    pub fn terrain_histogram(&self) -> BTreeMap<TerrainType, usize> {
        self.map.terrain_histogram()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampData;
    use crate::error::PlacementError;
    use crate::event::Footprint;

    /// 10x10, no deposits, camp footprint at (3..6, 3..6).
    fn small_config() -> SimConfig {
        SimConfig {
            map_size: (10, 10),
            camp_origin: (3, 3),
            deposits: Vec::new(),
            ..SimConfig::default()
        }
    }

    #[test]
    fn default_startup_keeps_camp_intact() {
        let sim = SimState::new(42);
        for z in 30..33 {
            for x in 20..23 {
                assert_eq!(
                    sim.map.grid().terrain(Coordinates::cell(x, z)),
                    Some(TerrainType::Grass)
                );
            }
        }
        let histogram = sim.terrain_histogram();
        assert_eq!(histogram.values().sum::<usize>(), 2500);
        assert_eq!(histogram[&TerrainType::Grass], 9);
        assert!(histogram.contains_key(&TerrainType::Gold));
        assert_eq!(sim.camp.spawn_cell(), Coordinates::cell(21, 31));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig {
            block_size: 0.0,
            ..small_config()
        };
        assert!(matches!(
            SimState::with_config(1, config),
            Err(ConfigError::NonPositive {
                field: "block_size"
            })
        ));
    }

    #[test]
    fn first_step_reports_startup() {
        let mut sim = SimState::with_config(1, small_config()).unwrap();
        let events = sim.step(&[], 0.1).events;
        let footprint = Footprint {
            origin: Coordinates::cell(3, 3),
            size_x: 3,
            size_z: 3,
        };
        let camp_created = SimEvent {
            tick: 0,
            kind: SimEventKind::ObjectCreated {
                id: ObjectId::Camp(CampId(0)),
                kind: ObjectKind::Camp,
                footprint: Some(footprint),
            },
        };
        assert_eq!(events[0], camp_created);
        let terrain = events.iter().find_map(|e| match &e.kind {
            SimEventKind::TerrainChanged { cells } => Some(cells.len()),
            _ => None,
        });
        assert_eq!(terrain, Some(100));
        assert!(events[1..].iter().all(|e| e.tick == 1));

        // Nothing changes on the second step.
        let events = sim.step(&[], 0.1).events;
        assert!(events.is_empty());
    }

    #[test]
    fn commands_report_outcomes() {
        let mut sim = SimState::with_config(1, small_config()).unwrap();
        let rock = Coordinates::cell(7, 7);
        let grass = Coordinates::cell(3, 5);
        let commands = [
            SimCommand::PlaceBarrier { position: rock },
            SimCommand::PlaceBarrier { position: grass },
            SimCommand::PlaceTrap { position: rock },
        ];
        let events = sim.step(&commands, 0.1).events;
        let kinds: Vec<_> = events.into_iter().map(|e| e.kind).collect();

        let barrier_on_rock = SimEventKind::PlacementRejected {
            position: rock,
            reason: PlacementError::Impassable(rock),
        };
        let trap_on_rock = SimEventKind::PlacementRejected {
            position: rock,
            reason: PlacementError::NotEmpty(rock),
        };
        assert!(kinds.contains(&barrier_on_rock));
        assert!(kinds.contains(&SimEventKind::BarrierPlaced { position: grass }));
        assert!(kinds.contains(&trap_on_rock));
        assert_eq!(sim.map.grid().terrain(grass), Some(TerrainType::Solid));
    }

    #[test]
    fn camp_populates_and_digs() {
        let config = SimConfig {
            camp: CampData {
                spawn_interval: 0.5,
                max_alive_miners: 4,
            },
            ..small_config()
        };
        let mut sim = SimState::with_config(3, config).unwrap();
        let events = sim.run(300, 0.1);

        assert!(!sim.camp.miners().is_empty());
        assert!(sim.alive_miners() <= 4);
        let dug = events
            .iter()
            .filter(|e| matches!(e.kind, SimEventKind::BlockDug { .. }))
            .count();
        assert!(dug > 0);
        let mined: u32 = events
            .iter()
            .filter_map(|e| match e.kind {
                SimEventKind::GoldMined { amount, .. } => Some(amount),
                _ => None,
            })
            .sum();
        assert_eq!(mined, sim.camp.gold());
        assert_eq!(
            sim.camp.points(),
            sim.camp.gold() + sim.camp.miners().len() as u32
        );
    }

    #[test]
    fn scene_sees_every_notification() {
        #[derive(Default)]
        struct Counter {
            created: usize,
            terrain: usize,
        }
        impl Scene for Counter {
            fn on_object_created(
                &mut self,
                _id: ObjectId,
                _kind: ObjectKind,
                _footprint: Option<Footprint>,
            ) {
                self.created += 1;
            }
            fn on_terrain_changed(&mut self, cells: &[Coordinates]) {
                self.terrain += cells.len();
            }
        }

        let mut sim = SimState::with_config(5, small_config()).unwrap();
        let mut scene = Counter::default();
        let mut created = 0;
        for _ in 0..50 {
            let events = sim.step_with_scene(&[], 0.1, &mut scene).events;
            created += events
                .iter()
                .filter(|e| matches!(e.kind, SimEventKind::ObjectCreated { .. }))
                .count();
        }
        assert_eq!(scene.created, created);
        // Camp plus at least the first miner.
        assert!(scene.created >= 2);
        assert!(scene.terrain >= 100);
    }
}
