// Miner and monster behavior: one state machine driven by per-kind data.
//
// An `Agent` is a grid-dwelling entity with a position, a heading, a state,
// and three timers. Miners and monsters share the same code path; what
// differs (speed, wait length, whether it digs, what it hunts) comes from the
// `AgentData` copied in at spawn.
//
// State machine, evaluated once per tick:
//
//   Digging  forward block still diggable: run dig timer; when it fires the
//            block is dug (by the map), stats updated, state -> Moving.
//            Otherwise -> Idle.
//   Idle     maybe turn (chance roll), then:
//            can dig and forward diggable      -> Digging
//            forward passable and free of others -> Moving
//            otherwise                          -> Waiting
//   Moving   forward passable and free of others: claim the forward block
//            and run the move timer (max = block_size / speed); when it
//            fires, leave the old block and step forward. Otherwise release
//            the claim and -> Idle.
//   Waiting  wait timer fires -> Idle.
//   Killed   terminal.
//
// Turning always picks a perpendicular axis, so an agent never reverses into
// the cell it came from.
//
// Occupancy invariant: a live agent is listed in the block at `position` and,
// while moving, the block at `position + direction`, and nowhere else. That
// is what lets `Map::kill_agent` detach it with two removals.
//
// Hunting (monsters killing adjacent miners) and the terrain side of digging
// need the whole map, so they live in `Map::update_agent`. This file only
// touches the grid.
//
// See also: `map.rs` for `update_agent()`/`kill_agent()`, `config.rs` for
// `AgentData`, `timer.rs` for timer semantics.
//
// **Critical constraint: determinism.** The RNG is drawn in a fixed order:
// the idle turn roll, then the turn's sign if it turns.

use crate::block::Block;
use crate::config::AgentData;
use crate::grid::Grid;
use crate::prng::GameRng;
use crate::timer::Timer;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Running totals for one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub blocks_dug: u32,
    pub blocks_traveled: u32,
    /// Agents this one has killed (monsters only).
    pub kills: u32,
}

/// Something the state machine did that the map has to finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AgentAction {
    /// The dig timer fired on this block. The map must dig it out.
    Dig(Coordinates),
    /// The agent arrived at this cell.
    Moved(Coordinates),
}

/// A miner or monster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    /// Camp that spawned this agent, if any. Non-owning.
    camp: Option<CampId>,
    position: Coordinates,
    direction: Coordinates,
    state: ObjectState,
    data: AgentData,
    move_timer: Timer,
    dig_timer: Option<Timer>,
    wait_timer: Timer,
    stats: AgentStats,
}

impl Agent {
    /// A freshly constructed agent, heading in its initial direction. It is
    /// not on the grid yet; `Map::spawn_agent` turns it and assigns it.
    pub fn new(
        id: AgentId,
        kind: AgentKind,
        position: Coordinates,
        camp: Option<CampId>,
        data: AgentData,
    ) -> Self {
        Self {
            id,
            kind,
            camp,
            position,
            direction: data.initial_direction,
            state: ObjectState::Idle,
            move_timer: Timer::new(1.0),
            dig_timer: data.dig_duration.map(Timer::new),
            wait_timer: Timer::new(data.wait_duration),
            data,
            stats: AgentStats::default(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn camp(&self) -> Option<CampId> {
        self.camp
    }

    pub fn position(&self) -> Coordinates {
        self.position
    }

    pub fn direction(&self) -> Coordinates {
        self.direction
    }

    /// The cell the agent is facing.
    pub fn ahead(&self) -> Coordinates {
        self.position + self.direction
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn is_killed(&self) -> bool {
        self.state == ObjectState::Killed
    }

    pub fn data(&self) -> &AgentData {
        &self.data
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn can_dig(&self) -> bool {
        self.dig_timer.is_some()
    }

    pub(crate) fn record_kill(&mut self) {
        self.stats.kills += 1;
    }

    /// Mark as killed. Returns `false` if it already was. Occupancy cleanup
    /// is the map's job.
    pub(crate) fn mark_killed(&mut self) -> bool {
        if self.is_killed() {
            return false;
        }
        self.state = ObjectState::Killed;
        true
    }

    /// Face a random direction on the axis perpendicular to the current one.
    pub(crate) fn turn(&mut self, rng: &mut GameRng) {
        let sign = if rng.coin_flip() { 1 } else { -1 };
        self.direction = if self.direction.x != 0 {
            Coordinates::cell(0, sign)
        } else {
            Coordinates::cell(sign, 0)
        };
    }

    /// Whether the agent may step onto `block`: passable, and nobody but
    /// this agent holds it.
    fn can_enter(&self, block: Option<&Block>) -> bool {
        match block {
            Some(b) => b.is_passable() && !b.is_occupied(Some(self.id)),
            None => false,
        }
    }

    /// Run one tick of the state machine. Assumes the agent is alive.
    pub(crate) fn advance(
        &mut self,
        grid: &mut Grid,
        rng: &mut GameRng,
        dt: f32,
        block_size: f32,
    ) -> Option<AgentAction> {
        match self.state {
            ObjectState::Digging => return self.dig(grid, dt),
            ObjectState::Idle => self.decide(grid, rng),
            ObjectState::Moving => return self.advance_move(grid, dt, block_size),
            ObjectState::Waiting => {
                if self.wait_timer.advance(dt) {
                    self.state = ObjectState::Idle;
                }
            }
            ObjectState::Flooding | ObjectState::Killed => {}
        }
        None
    }

    fn decide(&mut self, grid: &Grid, rng: &mut GameRng) {
        if rng.random_bool(self.data.chance_to_change_direction) {
            self.turn(rng);
        }

        let ahead = grid.get(self.ahead());
        self.state = if self.can_dig() && ahead.is_some_and(Block::is_diggable) {
            ObjectState::Digging
        } else if self.can_enter(ahead) {
            ObjectState::Moving
        } else {
            ObjectState::Waiting
        };
    }

    fn dig(&mut self, grid: &Grid, dt: f32) -> Option<AgentAction> {
        let target = self.ahead();
        if !grid.get(target).is_some_and(Block::is_diggable) {
            self.state = ObjectState::Idle;
            return None;
        }
        let Some(timer) = self.dig_timer.as_mut() else {
            self.state = ObjectState::Idle;
            return None;
        };
        if timer.advance(dt) {
            self.stats.blocks_dug += 1;
            self.state = ObjectState::Moving;
            return Some(AgentAction::Dig(target));
        }
        None
    }

    fn advance_move(&mut self, grid: &mut Grid, dt: f32, block_size: f32) -> Option<AgentAction> {
        let target = self.ahead();
        if !self.can_enter(grid.get(target)) {
            if let Some(block) = grid.get_mut(target) {
                block.remove(self.id);
            }
            self.state = ObjectState::Idle;
            return None;
        }

        if let Some(block) = grid.get_mut(target) {
            block.assign(self.id);
        }
        self.move_timer.set_max(block_size / self.data.speed);

        if self.move_timer.advance(dt) {
            if let Some(block) = grid.get_mut(self.position) {
                block.remove(self.id);
            }
            self.position = target;
            self.stats.blocks_traveled += 1;
            return Some(AgentAction::Moved(target));
        }
        None
    }
}
