// miners_sim: headless simulation of a living cave.
//
// This crate contains all simulation logic for the cave: the terrain grid
// with flooding and hidden caves, miners and monsters with their state
// machines, the miner camp and traps, world generation, player commands, and
// the event stream a renderer consumes. It has no rendering dependencies and
// can be tested, benchmarked and run headless.
//
// Module overview:
// - `sim.rs`:       Top-level SimState, startup sequence, tick loop, commands.
// - `map.rs`:       Grid + agent arena + traps; flooding, digging, generation.
// - `grid.rs`:      Flat 2D block storage with bounds-checked lookup.
// - `block.rs`:     One cell: terrain, occupant ids, flood timer.
// - `agent.rs`:     Miner/monster state machine (Idle, Digging, Moving, Waiting, Killed).
// - `structure.rs`: Camp (spawns miners, banks gold) and Trap; terrain patches.
// - `timer.rs`:     Generic bounded accumulator behind every timed behavior.
// - `command.rs`:   SimCommand, the player edits (barriers, traps).
// - `event.rs`:     SimEvent output and the `Scene` collaborator trait.
// - `config.rs`:    SimConfig, all tunable values, JSON-loadable.
// - `error.rs`:     PlacementError and ConfigError.
// - `types.rs`:     Coordinates, ids, terrain and state enums.
// - `prng`:         Re-exported from `miners_prng`, xoshiro256++ with SplitMix64 seeding.
//
// **Critical constraint: determinism.** The simulation is a pure function:
// `(state, commands, dt) -> (new_state, events)`. All randomness comes from
// the one seeded `GameRng` owned by `SimState`. No `HashMap`, no system time,
// no OS entropy. Use `BTreeMap` for ordered collections.

pub mod agent;
pub mod block;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod map;
pub use miners_prng as prng;
pub mod sim;
pub mod structure;
pub mod timer;
pub mod types;
