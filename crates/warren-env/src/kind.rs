//! Environment variant names, default levels and construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warren_core::{Cell, ConfigError, LevelConfig, MovingObstacle, Position};

use crate::variants::{
    BunnyGarden, GridWorld, ReefGuardians, SnowplowFleet, SwarmDrones, WarehouseBots,
};
use crate::world::World;
use crate::Environment;

/// The six environment variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvKind {
    /// Configurable single-policy grid world.
    GridWorld,
    /// One bunny collecting a goal while its energy lasts.
    BunnyGarden,
    /// A drone swarm converging on a shared goal.
    SwarmDrones,
    /// Warehouse robots delivering to docks.
    WarehouseBots,
    /// A snowplow fleet clearing roads.
    SnowplowFleet,
    /// Reef guardians patrolling on limited oxygen.
    ReefGuardians,
}

impl EnvKind {
    /// All variants, in declaration order.
    pub const ALL: [EnvKind; 6] = [
        Self::GridWorld,
        Self::BunnyGarden,
        Self::SwarmDrones,
        Self::WarehouseBots,
        Self::SnowplowFleet,
        Self::ReefGuardians,
    ];

    /// Stable kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::GridWorld => "grid-world",
            Self::BunnyGarden => "bunny-garden",
            Self::SwarmDrones => "swarm-drones",
            Self::WarehouseBots => "warehouse-bots",
            Self::SnowplowFleet => "snowplow-fleet",
            Self::ReefGuardians => "reef-guardians",
        }
    }

    /// The built-in level used when none is configured.
    pub fn default_level(self) -> LevelConfig {
        let cells = |v: &[(i32, i32)]| -> Vec<Cell> {
            v.iter().map(|&(x, y)| Cell::new(x, y)).collect()
        };
        let mut level = LevelConfig::new(25);
        match self {
            Self::GridWorld => {
                level.static_obstacles = cells(&[(10, 10)]);
                level.goals = cells(&[(20, 20)]);
                level.starts = cells(&[(5, 5)]);
            }
            Self::BunnyGarden => {
                level.static_obstacles =
                    cells(&[(5, 5), (5, 6), (5, 7), (10, 10), (10, 11), (15, 15)]);
                level.goals = cells(&[(23, 23)]);
                level.starts = cells(&[(1, 1)]);
            }
            Self::SwarmDrones => {
                level.static_obstacles = cells(&[(10, 10), (10, 11), (15, 15)]);
                level.goals = cells(&[(24, 24)]);
                level.starts = cells(&[(1, 1), (1, 23), (23, 1), (23, 23)]);
            }
            Self::WarehouseBots => {
                level.static_obstacles = cells(&[(10, 10), (10, 11), (12, 10)]);
                level.goals = cells(&[(24, 24), (1, 24)]);
                level.starts = cells(&[(12, 12), (5, 5), (20, 20)]);
            }
            Self::SnowplowFleet => {
                level.static_obstacles = cells(&[(10, 10), (15, 15)]);
                level.goals = cells(&[(24, 0), (0, 24)]);
                level.starts = cells(&[(0, 0), (24, 24)]);
                level.moving_obstacles.push(MovingObstacle {
                    id: "car_1".into(),
                    path: vec![Position::new(5.0, 5.0), Position::new(20.0, 20.0)],
                    speed: 0.1,
                    phase: 0.0,
                });
            }
            Self::ReefGuardians => {
                level.static_obstacles = cells(&[(12, 12), (13, 13)]);
                level.goals = cells(&[(24, 24)]);
                level.starts = (1..=6).map(|i| Cell::new(i, i)).collect();
            }
        }
        level
    }

    /// Build an environment of this kind on `level`.
    ///
    /// `seed` drives every stochastic element of the variant.
    pub fn build(
        self,
        level: LevelConfig,
        seed: u64,
    ) -> Result<Box<dyn Environment>, ConfigError> {
        Ok(match self {
            Self::GridWorld => Box::new(World::new(GridWorld, level, seed)?),
            Self::BunnyGarden => Box::new(World::new(BunnyGarden, level, seed)?),
            Self::SwarmDrones => Box::new(World::new(SwarmDrones::default(), level, seed)?),
            Self::WarehouseBots => Box::new(World::new(WarehouseBots::default(), level, seed)?),
            Self::SnowplowFleet => Box::new(World::new(SnowplowFleet::default(), level, seed)?),
            Self::ReefGuardians => Box::new(World::new(ReefGuardians::new(seed), level, seed)?),
        })
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised environment name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown environment '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for EnvKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
