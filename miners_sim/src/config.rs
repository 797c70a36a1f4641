// Data-driven simulation configuration.
//
// Every tunable value lives in `SimConfig`, loadable from JSON. The sim reads
// durations, speeds, rewards and generation parameters from here rather than
// from constants in the logic, so balance changes need no recompilation.
//
// Agent behavior differences (speed, wait length, whether the agent digs,
// what it hunts) are data in `AgentData`, keyed by `AgentKind` in the
// `agents` map. The state machine in `agent.rs` has one code path for every
// kind and branches only on that data.
//
// `Default` is the stock cave: a 50x50 map of 2.0-unit blocks,
// a camp at (20, 30), and four deposit passes (Empty, Gold, Water, Cave).
//
// See also: `sim.rs` which owns the config and builds the world from it,
// `map.rs` which copies the values it needs at construction.
//
// **Critical constraint: determinism.** Identical seed plus identical config
// gives an identical run.

use crate::error::ConfigError;
use crate::types::{AgentKind, Coordinates, TerrainType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Behavioral parameters for one kind of agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    /// World units per second. Crossing one block takes `block_size / speed`.
    pub speed: f32,
    /// Probability of turning while idle, rolled once per idle tick.
    pub chance_to_change_direction: f64,
    /// Seconds to dig through one block. `None` means the agent cannot dig.
    pub dig_duration: Option<f32>,
    /// Seconds to wait when the way ahead is blocked.
    pub wait_duration: f32,
    /// Heading before the spawn-time turn.
    pub initial_direction: Coordinates,
    /// Kind of agent this one kills on its four cardinal neighbors.
    pub hunts: Option<AgentKind>,
}

impl AgentData {
    pub fn miner() -> Self {
        Self {
            speed: 8.0,
            chance_to_change_direction: 0.2,
            dig_duration: Some(0.1),
            wait_duration: 1.0,
            initial_direction: Coordinates::EAST,
            hunts: None,
        }
    }

    pub fn monster() -> Self {
        Self {
            speed: 6.0,
            chance_to_change_direction: 0.2,
            dig_duration: None,
            wait_duration: 0.1,
            initial_direction: Coordinates::SOUTH,
            hunts: Some(AgentKind::Miner),
        }
    }
}

/// Miner camp economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampData {
    /// Seconds between miner spawns.
    pub spawn_interval: f32,
    /// Live miners allowed at once. Spawning pauses at the cap.
    pub max_alive_miners: usize,
}

impl Default for CampData {
    fn default() -> Self {
        Self {
            spawn_interval: 2.0,
            max_alive_miners: 20,
        }
    }
}

/// Gold credited to a camp per block dug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigRewards {
    pub rock: u32,
    pub gold: u32,
}

impl DigRewards {
    /// Reward for digging a block of the given terrain. Zero for anything
    /// that is not diggable.
    pub fn for_terrain(&self, terrain: TerrainType) -> u32 {
        match terrain {
            TerrainType::Rock => self.rock,
            TerrainType::Gold => self.gold,
            _ => 0,
        }
    }
}

impl Default for DigRewards {
    fn default() -> Self {
        Self { rock: 1, gold: 10 }
    }
}

/// One pass of `Map::generate_random`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositParams {
    pub terrain: TerrainType,
    /// Number of blotches.
    pub max_count: u32,
    /// Random-walk steps per blotch. Rejected steps still count.
    pub max_size: u32,
}

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid dimensions (x, z) in blocks, including the solid border.
    pub map_size: (i32, i32),
    /// World units per block. Only used for movement duration and visuals.
    pub block_size: f32,
    /// Seconds for a block to fill after it starts flooding.
    pub flood_duration: f32,
    /// Minimum corner of the 3x3 camp footprint.
    pub camp_origin: (i32, i32),
    pub camp: CampData,
    pub agents: BTreeMap<AgentKind, AgentData>,
    pub rewards: DigRewards,
    /// Deposit passes, applied in order after the camp is placed.
    pub deposits: Vec<DepositParams>,
    /// Random picks tried for a deposit's first cell before giving up on it.
    pub max_placement_attempts: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut agents = BTreeMap::new();
        agents.insert(AgentKind::Miner, AgentData::miner());
        agents.insert(AgentKind::Monster, AgentData::monster());

        Self {
            map_size: (50, 50),
            block_size: 2.0,
            flood_duration: 2.0,
            camp_origin: (20, 30),
            camp: CampData::default(),
            agents,
            rewards: DigRewards::default(),
            deposits: vec![
                DepositParams {
                    terrain: TerrainType::Empty,
                    max_count: 5,
                    max_size: 30,
                },
                DepositParams {
                    terrain: TerrainType::Gold,
                    max_count: 5,
                    max_size: 30,
                },
                DepositParams {
                    terrain: TerrainType::Water,
                    max_count: 5,
                    max_size: 20,
                },
                DepositParams {
                    terrain: TerrainType::Cave,
                    max_count: 5,
                    max_size: 20,
                },
            ],
            max_placement_attempts: 10_000,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config can drive a simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (x, z) = self.map_size;
        if x < 3 || z < 3 {
            return Err(ConfigError::MapTooSmall { x, z });
        }
        positive(self.block_size, "block_size")?;
        positive(self.flood_duration, "flood_duration")?;
        positive(self.camp.spawn_interval, "camp.spawn_interval")?;

        // The 3x3 footprint must sit strictly inside the solid border.
        let (cx, cz) = self.camp_origin;
        if cx < 1 || cz < 1 || cx + 3 > x - 1 || cz + 3 > z - 1 {
            return Err(ConfigError::CampOutsideInterior { x: cx, z: cz });
        }

        for kind in [AgentKind::Miner, AgentKind::Monster] {
            let data = self
                .agents
                .get(&kind)
                .ok_or(ConfigError::MissingAgentData(kind))?;
            positive(data.speed, "agents.speed")?;
            positive(data.wait_duration, "agents.wait_duration")?;
            if let Some(dig) = data.dig_duration {
                positive(dig, "agents.dig_duration")?;
            }
            if !(0.0..=1.0).contains(&data.chance_to_change_direction) {
                return Err(ConfigError::NotAProbability {
                    field: "agents.chance_to_change_direction",
                });
            }
        }
        Ok(())
    }
}

/// Rejects zero, negatives and NaN.
fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn default_config_roundtrips_through_json() {
        let config = SimConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = SimConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
        assert_eq!(restored.deposits.len(), 4);
        assert_eq!(restored.agents[&AgentKind::Monster].wait_duration, 0.1);
    }

    #[test]
    fn deposit_order_matches_startup() {
        let order: Vec<_> = SimConfig::default()
            .deposits
            .iter()
            .map(|d| (d.terrain, d.max_count, d.max_size))
            .collect();
        assert_eq!(
            order,
            vec![
                (TerrainType::Empty, 5, 30),
                (TerrainType::Gold, 5, 30),
                (TerrainType::Water, 5, 20),
                (TerrainType::Cave, 5, 20),
            ]
        );
    }

    #[test]
    fn rejects_tiny_map() {
        let config = SimConfig {
            map_size: (2, 10),
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MapTooSmall { x: 2, z: 10 })
        ));
    }

    #[test]
    fn rejects_camp_touching_border() {
        let config = SimConfig {
            map_size: (10, 10),
            camp_origin: (7, 1),
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CampOutsideInterior { x: 7, z: 1 })
        ));

        let fits = SimConfig {
            map_size: (10, 10),
            camp_origin: (6, 6),
            ..SimConfig::default()
        };
        assert!(fits.validate().is_ok());
    }

    #[test]
    fn rejects_missing_agent_data() {
        let mut config = SimConfig::default();
        config.agents.remove(&AgentKind::Monster);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingAgentData(AgentKind::Monster))
        ));
    }

    #[test]
    fn rejects_nan_durations_and_speeds() {
        let config = SimConfig {
            block_size: f32::NAN,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "block_size"
            })
        ));

        let mut config = SimConfig::default();
        if let Some(miner) = config.agents.get_mut(&AgentKind::Miner) {
            miner.speed = f32::NAN;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "agents.speed"
            })
        ));

        let mut config = SimConfig::default();
        if let Some(monster) = config.agents.get_mut(&AgentKind::Monster) {
            monster.wait_duration = 0.0;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "agents.wait_duration"
            })
        ));
    }

    #[test]
    fn turn_chance_must_be_a_probability() {
        for chance in [-0.1, 1.5, f64::NAN] {
            let mut config = SimConfig::default();
            if let Some(miner) = config.agents.get_mut(&AgentKind::Miner) {
                miner.chance_to_change_direction = chance;
            }
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NotAProbability {
                    field: "agents.chance_to_change_direction"
                })
            ));
        }

        let mut config = SimConfig::default();
        if let Some(miner) = config.agents.get_mut(&AgentKind::Miner) {
            miner.chance_to_change_direction = 1.0;
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            SimConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn rewards_by_terrain() {
        let rewards = DigRewards::default();
        assert_eq!(rewards.for_terrain(TerrainType::Rock), 1);
        assert_eq!(rewards.for_terrain(TerrainType::Gold), 10);
        assert_eq!(rewards.for_terrain(TerrainType::Cave), 0);
    }
}
