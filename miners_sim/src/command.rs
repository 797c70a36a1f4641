// Player commands that edit the cave.
//
// All external mutations go through `SimCommand`. `SimState::step()` applies
// the commands it is given before advancing the world, so an edit made in a
// tick is visible to every block and agent update of that same tick.
//
// Current commands:
// - `PlaceBarrier`: turn a cell into a Solid barrier (`Map::update_block`).
// - `PlaceTrap`: place a monster trap (`Map::place_trap`).
//
// A refused command is not an error for the caller; it shows up as a
// `PlacementRejected` event with the reason.
//
// See also: `sim.rs` for `apply_command()`, `error.rs` for
// `PlacementError`.
//
// **Critical constraint: determinism.** Commands are the sole external input
// to the sim besides the seed and config.

use crate::types::Coordinates;
use serde::{Deserialize, Serialize};

/// A player-issued edit, applied at the start of the next step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimCommand {
    /// Place a Solid barrier on passable, dry, unoccupied ground.
    PlaceBarrier { position: Coordinates },
    /// Place a trap on free Empty ground.
    PlaceTrap { position: Coordinates },
}

impl SimCommand {
    /// The cell the command targets.
    pub fn position(&self) -> Coordinates {
        match self {
            SimCommand::PlaceBarrier { position } | SimCommand::PlaceTrap { position } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_roundtrip_through_json() {
        let commands = vec![
            SimCommand::PlaceBarrier {
                position: Coordinates::cell(3, 4),
            },
            SimCommand::PlaceTrap {
                position: Coordinates::cell(7, 1),
            },
        ];
        let json = serde_json::to_string(&commands).unwrap();
        let restored: Vec<SimCommand> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, commands);
        assert_eq!(restored[1].position(), Coordinates::cell(7, 1));
    }
}
