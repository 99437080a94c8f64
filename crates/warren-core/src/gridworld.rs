//! Procedurally generated grid-world levels.
//!
//! A [`GridWorldConfig`] names a size, agent and pickup counts, an
//! episode length and a [`Difficulty`] preset. [`to_level`](GridWorldConfig::to_level)
//! turns it into a reproducible [`LevelConfig`] using a seeded ChaCha8
//! generator.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geom::Cell;
use crate::level::{LevelConfig, MovingObstacle};

/// Named difficulty preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    /// Sparse obstacles, nothing moves.
    #[default]
    Easy,
    /// Denser obstacles and two constant-speed patrols.
    Medium,
    /// Densest obstacles and three patrols that speed up over the episode.
    Hard,
}

impl Difficulty {
    /// Fraction of interior cells turned into static obstacles.
    pub fn obstacle_density(self) -> f32 {
        match self {
            Self::Easy => 0.04,
            Self::Medium => 0.08,
            Self::Hard => 0.12,
        }
    }

    /// Number of horizontal patrols.
    pub fn patrol_count(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    /// The level difficulty scalar this preset maps to.
    pub fn scalar(self) -> f32 {
        match self {
            Self::Easy => 0.0,
            Self::Medium => 0.5,
            Self::Hard => 1.0,
        }
    }
}

/// Parameters for a generated grid world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridWorldConfig {
    /// Side length. Default: 25.
    pub grid_size: u32,
    /// Number of agents. Default: 1.
    pub agent_count: u32,
    /// Number of reward pickups. Default: 1.
    pub pickup_count: u32,
    /// Episode length in ticks. Default: 100.
    pub max_steps: u32,
    /// Difficulty preset. Default: [`Difficulty::Easy`].
    pub difficulty: Difficulty,
    /// Seed for placement. Default: 0.
    pub seed: u64,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 25,
            agent_count: 1,
            pickup_count: 1,
            max_steps: 100,
            difficulty: Difficulty::Easy,
            seed: 0,
        }
    }
}

impl GridWorldConfig {
    /// Check the parameters without generating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 {
            return Err(ConfigError::ZeroGrid);
        }
        if self.agent_count == 0 {
            return Err(ConfigError::NoStarts);
        }
        if self.pickup_count == 0 {
            return Err(ConfigError::NoGoals);
        }
        if self.max_steps == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        let needed =
            self.agent_count as usize + self.pickup_count as usize + self.obstacle_count();
        let available = (self.grid_size as usize).pow(2);
        if needed > available {
            return Err(ConfigError::Overcrowded { needed, available });
        }
        Ok(())
    }

    fn obstacle_count(&self) -> usize {
        let interior = (self.grid_size.saturating_sub(2) as f32).powi(2);
        (interior * self.difficulty.obstacle_density()).round() as usize
    }

    /// Generate the level.
    ///
    /// Cells are shuffled once; starts, pickups and interior obstacles
    /// are drawn from the shuffled order without overlap, so the same
    /// config always yields the same level.
    pub fn to_level(&self) -> Result<LevelConfig, ConfigError> {
        self.validate()?;
        let size = self.grid_size as i32;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let patrol_rows = self.patrol_rows();
        let mut cells: Vec<Cell> = (0..size)
            .flat_map(|y| (0..size).map(move |x| Cell::new(x, y)))
            .filter(|c| !patrol_rows.contains(&c.y))
            .collect();
        cells.shuffle(&mut rng);

        let mut level = LevelConfig::new(self.grid_size).with_time_limit(self.max_steps);
        level.difficulty = self.difficulty.scalar();

        let mut iter = cells.into_iter();
        level.starts = iter.by_ref().take(self.agent_count as usize).collect();
        level.goals = iter.by_ref().take(self.pickup_count as usize).collect();
        level.static_obstacles = iter
            .filter(|c| c.x > 0 && c.y > 0 && c.x < size - 1 && c.y < size - 1)
            .take(self.obstacle_count())
            .collect();
        if level.starts.len() < self.agent_count as usize
            || level.goals.len() < self.pickup_count as usize
        {
            return Err(ConfigError::Overcrowded {
                needed: self.agent_count as usize + self.pickup_count as usize,
                available: level.starts.len() + level.goals.len(),
            });
        }

        for (i, &row) in patrol_rows.iter().enumerate() {
            level.moving_obstacles.push(MovingObstacle::patrol(
                format!("patrol_{i}"),
                Cell::new(1, row),
                Cell::new(size - 2, row),
                2.0,
                i as f32,
            ));
        }

        level.validate()?;
        Ok(level)
    }

    /// Rows reserved for patrols, evenly spaced and kept free of
    /// starts, pickups and obstacles.
    fn patrol_rows(&self) -> Vec<i32> {
        let n = self.difficulty.patrol_count() as i32;
        let size = self.grid_size as i32;
        (1..=n).map(|k| k * size / (n + 1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_level() {
        let cfg = GridWorldConfig {
            difficulty: Difficulty::Hard,
            seed: 42,
            ..Default::default()
        };
        assert_eq!(cfg.to_level().unwrap(), cfg.to_level().unwrap());
    }

    #[test]
    fn different_seed_different_level() {
        let a = GridWorldConfig {
            seed: 1,
            ..Default::default()
        };
        let b = GridWorldConfig {
            seed: 2,
            ..Default::default()
        };
        assert_ne!(a.to_level().unwrap(), b.to_level().unwrap());
    }

    #[test]
    fn preset_controls_density_and_patrols() {
        for (difficulty, patrols) in [
            (Difficulty::Easy, 0),
            (Difficulty::Medium, 2),
            (Difficulty::Hard, 3),
        ] {
            let level = GridWorldConfig {
                difficulty,
                ..Default::default()
            }
            .to_level()
            .unwrap();
            let expected = (23.0f32 * 23.0 * difficulty.obstacle_density()).round() as usize;
            assert_eq!(level.static_obstacles.len(), expected);
            assert_eq!(level.moving_obstacles.len(), patrols);
        }
    }

    #[test]
    fn entities_do_not_overlap() {
        let level = GridWorldConfig {
            agent_count: 4,
            pickup_count: 3,
            difficulty: Difficulty::Hard,
            seed: 9,
            ..Default::default()
        }
        .to_level()
        .unwrap();
        for s in &level.starts {
            assert!(!level.goals.contains(s));
            assert!(!level.static_obstacles.contains(s));
        }
        for g in &level.goals {
            assert!(!level.static_obstacles.contains(g));
        }
        assert_eq!(level.time_limit, Some(100));
    }

    #[test]
    fn overcrowded_config_is_rejected() {
        let cfg = GridWorldConfig {
            grid_size: 3,
            agent_count: 9,
            pickup_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Overcrowded { .. })
        ));
    }

    #[test]
    fn huge_counts_are_rejected_not_overflowed() {
        let cfg = GridWorldConfig {
            agent_count: u32::MAX,
            pickup_count: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Overcrowded { .. })
        ));
    }
}
