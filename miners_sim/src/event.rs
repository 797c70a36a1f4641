// Simulation output: narrative events and scene notifications.
//
// Every `SimState::step()` returns the events it produced, stamped with the
// tick. There are two families in one enum:
// - Narrative events (spawns, kills, digs, cave reveals, gold, placements)
//   for an event log or UI.
// - Scene notifications (`ObjectCreated`, `ObjectDestroyed`, `ObjectMoved`,
//   `TerrainChanged`) telling a renderer which visuals to create, hide, move,
//   or rebuild. The sim never calls a renderer directly; a `Scene`
//   implementation receives them through `SimEvent::dispatch()`.
//
// Nothing in the sim reads these back, so a headless run can ignore them or
// pass `NullScene`.
//
// See also: `sim.rs` for the step loop that stamps and returns events,
// `map.rs` and `structure.rs` which emit most of them.
//
// **Critical constraint: determinism.** Events are emitted in processing
// order, which is itself deterministic; consumers may rely on it.

use crate::error::PlacementError;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// A rectangular patch of cells covered by a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub origin: Coordinates,
    pub size_x: i32,
    pub size_z: i32,
}

/// Why an agent died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillCause {
    /// Its cell was flooding or had already flooded.
    Drowned,
    /// An adjacent monster got it.
    Monster(AgentId),
    /// It stepped on a trap.
    Trap(TrapId),
}

/// An event emitted during a simulation step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

/// Types of events the sim emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// A camp produced a miner on its spawn cell.
    MinerSpawned {
        agent: AgentId,
        camp: Option<CampId>,
        position: Coordinates,
    },
    /// A monster crawled out of a freshly revealed cave.
    MonsterSpawned {
        agent: AgentId,
        position: Coordinates,
    },
    /// An agent dug out the block at `position`, which was `terrain`.
    BlockDug {
        agent: AgentId,
        position: Coordinates,
        terrain: TerrainType,
    },
    /// Digging next to a cave pocket revealed `cells` cells as `revealed_as`.
    CaveRevealed {
        dug: Coordinates,
        revealed_as: TerrainType,
        cells: usize,
        monster: bool,
    },
    MinerKilled { agent: AgentId, cause: KillCause },
    MonsterKilled { agent: AgentId, cause: KillCause },
    /// A camp was credited for a dug block.
    GoldMined { camp: CampId, amount: u32 },
    BarrierPlaced { position: Coordinates },
    TrapPlaced { trap: TrapId, position: Coordinates },
    /// A player command was refused.
    PlacementRejected {
        position: Coordinates,
        reason: PlacementError,
    },

    // Scene notifications.
    ObjectCreated {
        id: ObjectId,
        kind: ObjectKind,
        footprint: Option<Footprint>,
    },
    ObjectDestroyed { id: ObjectId },
    /// An object arrived at a new cell. `world_position` is the cell center.
    ObjectMoved {
        id: ObjectId,
        world_position: [f32; 3],
    },
    /// Cells whose terrain or water level changed this step.
    TerrainChanged { cells: Vec<Coordinates> },
}

/// Collaborator that mirrors the sim into a visual representation.
///
/// All methods default to no-ops so an implementation only overrides what it
/// draws.
pub trait Scene {
    fn on_object_created(
        &mut self,
        _id: ObjectId,
        _kind: ObjectKind,
        _footprint: Option<Footprint>,
    ) {
    }

    fn on_object_destroyed(&mut self, _id: ObjectId) {}

    fn on_object_moved(&mut self, _id: ObjectId, _world_position: [f32; 3]) {}

    fn on_terrain_changed(&mut self, _cells: &[Coordinates]) {}
}

/// A scene that draws nothing, for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScene;

impl Scene for NullScene {}

impl SimEvent {
    /// Forward a scene notification. Narrative events are ignored.
    pub fn dispatch(&self, scene: &mut dyn Scene) {
        match &self.kind {
            SimEventKind::ObjectCreated {
                id,
                kind,
                footprint,
            } => scene.on_object_created(*id, *kind, *footprint),
            SimEventKind::ObjectDestroyed { id } => scene.on_object_destroyed(*id),
            SimEventKind::ObjectMoved { id, world_position } => {
                scene.on_object_moved(*id, *world_position)
            }
            SimEventKind::TerrainChanged { cells } => scene.on_terrain_changed(cells),
            _ => {}
        }
    }

    /// Whether this event is one of the scene notifications.
    pub fn is_scene_notification(&self) -> bool {
        matches!(
            self.kind,
            SimEventKind::ObjectCreated { .. }
                | SimEventKind::ObjectDestroyed { .. }
                | SimEventKind::ObjectMoved { .. }
                | SimEventKind::TerrainChanged { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        created: Vec<(ObjectId, ObjectKind)>,
        destroyed: Vec<ObjectId>,
        moved: Vec<ObjectId>,
        terrain_cells: usize,
    }

    impl Scene for Recorder {
        fn on_object_created(
            &mut self,
            id: ObjectId,
            kind: ObjectKind,
            _footprint: Option<Footprint>,
        ) {
            self.created.push((id, kind));
        }

        fn on_object_destroyed(&mut self, id: ObjectId) {
            self.destroyed.push(id);
        }

        fn on_object_moved(&mut self, id: ObjectId, _world_position: [f32; 3]) {
            self.moved.push(id);
        }

        fn on_terrain_changed(&mut self, cells: &[Coordinates]) {
            self.terrain_cells += cells.len();
        }
    }

    fn at(kind: SimEventKind) -> SimEvent {
        SimEvent { tick: 1, kind }
    }

    #[test]
    fn dispatch_routes_scene_notifications() {
        let miner = ObjectId::Agent(AgentId(0));
        let events = [
            at(SimEventKind::ObjectCreated {
                id: miner,
                kind: ObjectKind::Miner,
                footprint: None,
            }),
            at(SimEventKind::ObjectMoved {
                id: miner,
                world_position: [1.0, 0.0, 1.0],
            }),
            at(SimEventKind::TerrainChanged {
                cells: vec![Coordinates::cell(1, 1), Coordinates::cell(2, 1)],
            }),
            at(SimEventKind::ObjectDestroyed { id: miner }),
        ];

        let mut scene = Recorder::default();
        for event in &events {
            assert!(event.is_scene_notification());
            event.dispatch(&mut scene);
        }
        assert_eq!(scene.created, vec![(miner, ObjectKind::Miner)]);
        assert_eq!(scene.moved, vec![miner]);
        assert_eq!(scene.destroyed, vec![miner]);
        assert_eq!(scene.terrain_cells, 2);
    }

    #[test]
    fn narrative_events_are_not_dispatched() {
        let event = at(SimEventKind::GoldMined {
            camp: CampId(0),
            amount: 10,
        });
        assert!(!event.is_scene_notification());
        let mut scene = Recorder::default();
        event.dispatch(&mut scene);
        assert!(scene.created.is_empty());
        assert_eq!(scene.terrain_cells, 0);
    }

    #[test]
    fn null_scene_accepts_everything() {
        let mut scene = NullScene;
        let event = at(SimEventKind::ObjectDestroyed {
            id: ObjectId::Trap(TrapId(3)),
        });
        event.dispatch(&mut scene);
    }
}
