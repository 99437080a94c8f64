//! Level configuration: grid, obstacles, goals, starts and rewards.
//!
//! [`LevelConfig`] is immutable once an episode starts. It deserializes
//! from the camelCase JSON layout used by the level editor and the
//! training environments. [`validate()`](LevelConfig::validate) checks
//! structural invariants before any environment is built.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geom::{Cell, Position};
use crate::schedule::Schedule;

// ── RewardWeights ──────────────────────────────────────────────────

/// Per-event reward weights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Reward for reaching an assigned goal. Default: `1.0`.
    pub goal: f32,
    /// Reward for every non-terminal tick. Default: `-0.01`.
    pub step: f32,
    /// Reward for moving onto an obstacle. Default: `-1.0`.
    pub collision: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            goal: 1.0,
            step: -0.01,
            collision: -1.0,
        }
    }
}

impl RewardWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("goal", self.goal),
            ("step", self.step),
            ("collision", self.collision),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidReward { name, value });
            }
        }
        Ok(())
    }
}

// ── MovingObstacle ─────────────────────────────────────────────────

/// An obstacle that oscillates along a waypoint path.
///
/// Progress along the path at obstacle time `t` is
/// `(sin((t + phase) * speed) + 1) / 2`, so the obstacle ping-pongs
/// between the first and last waypoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MovingObstacleRepr")]
pub struct MovingObstacle {
    /// Stable identifier, used in frames.
    pub id: String,
    /// Waypoints, first to last.
    pub path: Vec<Position>,
    /// Angular speed of the oscillation.
    pub speed: f32,
    /// Phase offset added to obstacle time.
    pub phase: f32,
}

impl MovingObstacle {
    /// A two-waypoint patrol between `from` and `to`.
    pub fn patrol(id: impl Into<String>, from: Cell, to: Cell, speed: f32, phase: f32) -> Self {
        Self {
            id: id.into(),
            path: vec![from.to_position(), to.to_position()],
            speed,
            phase,
        }
    }

    /// Position at oscillation progress `p` in `[0, 1]`, measured over
    /// equal-length segments of the path.
    pub fn position_at(&self, p: f32) -> Position {
        match self.path.as_slice() {
            [] => Position::default(),
            [only] => *only,
            path => {
                let segments = path.len() - 1;
                let s = p.clamp(0.0, 1.0) * segments as f32;
                let i = (s.floor() as usize).min(segments - 1);
                path[i].lerp(path[i + 1], s - i as f32)
            }
        }
    }
}

/// Accepts either an explicit `path` or the editor's `pathX`/`pathY`
/// endpoint ranges.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovingObstacleRepr {
    #[serde(default)]
    id: String,
    #[serde(default)]
    path: Option<Vec<Position>>,
    #[serde(default)]
    path_x: Option<[f32; 2]>,
    #[serde(default)]
    path_y: Option<[f32; 2]>,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default)]
    phase: f32,
}

fn default_speed() -> f32 {
    1.0
}

impl TryFrom<MovingObstacleRepr> for MovingObstacle {
    type Error = String;

    fn try_from(r: MovingObstacleRepr) -> Result<Self, Self::Error> {
        let path = match (r.path, r.path_x, r.path_y) {
            (Some(path), _, _) => path,
            (None, Some(px), Some(py)) => vec![
                Position::new(px[0], py[0]),
                Position::new(px[1], py[1]),
            ],
            (None, None, None) => match (r.x, r.y) {
                (Some(x), Some(y)) => vec![Position::new(x, y)],
                _ => Vec::new(),
            },
            _ => {
                return Err(format!(
                    "moving obstacle '{}' needs both pathX and pathY",
                    r.id
                ))
            }
        };
        Ok(Self {
            id: r.id,
            path,
            speed: r.speed,
            phase: r.phase,
        })
    }
}

// ── LevelConfig ────────────────────────────────────────────────────

/// A complete level description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    /// Side length of the square grid.
    pub grid_size: u32,
    /// Impassable cells.
    #[serde(default)]
    pub static_obstacles: Vec<Cell>,
    /// Obstacles that move along paths.
    #[serde(default)]
    pub moving_obstacles: Vec<MovingObstacle>,
    /// Goal cells, assigned to agents per variant.
    #[serde(default, rename = "goalPositions")]
    pub goals: Vec<Cell>,
    /// One start cell per agent.
    #[serde(default, rename = "startPositions")]
    pub starts: Vec<Cell>,
    /// Difficulty scalar in `[0, 1]`. Above `0.5` moving obstacles speed
    /// up linearly over the episode.
    #[serde(default)]
    pub difficulty: f32,
    /// Overrides the variant's default episode length.
    #[serde(default)]
    pub time_limit: Option<u32>,
    /// Overrides the default reward weights.
    #[serde(default)]
    pub rewards: Option<RewardWeights>,
}

impl LevelConfig {
    /// An empty level of the given size.
    pub fn new(grid_size: u32) -> Self {
        Self {
            grid_size,
            static_obstacles: Vec::new(),
            moving_obstacles: Vec::new(),
            goals: Vec::new(),
            starts: Vec::new(),
            difficulty: 0.0,
            time_limit: None,
            rewards: None,
        }
    }

    /// Add a static obstacle.
    pub fn with_obstacle(mut self, cell: Cell) -> Self {
        self.static_obstacles.push(cell);
        self
    }

    /// Add a moving obstacle.
    pub fn with_moving(mut self, obstacle: MovingObstacle) -> Self {
        self.moving_obstacles.push(obstacle);
        self
    }

    /// Add a goal cell.
    pub fn with_goal(mut self, cell: Cell) -> Self {
        self.goals.push(cell);
        self
    }

    /// Add an agent start cell.
    pub fn with_start(mut self, cell: Cell) -> Self {
        self.starts.push(cell);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, ticks: u32) -> Self {
        self.time_limit = Some(ticks);
        self
    }

    /// Set the reward weights.
    pub fn with_rewards(mut self, rewards: RewardWeights) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// Parse and validate a level from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json {
            reason: e.to_string(),
        })?;
        level.validate()?;
        Ok(level)
    }

    /// Effective reward weights.
    pub fn reward_weights(&self) -> RewardWeights {
        self.rewards.unwrap_or_default()
    }

    /// Number of agents the level supports.
    pub fn agent_count(&self) -> usize {
        self.starts.len()
    }

    /// Speed multiplier applied to moving obstacles over an episode of
    /// `max_steps` ticks.
    ///
    /// Constant 1.0 up to difficulty 0.5; above that the multiplier
    /// ramps from 1.0 to `1.0 + (difficulty - 0.5)` across the episode.
    pub fn obstacle_speed_schedule(&self, max_steps: u32) -> Schedule {
        let ramp = (self.difficulty - 0.5).max(0.0);
        if ramp == 0.0 {
            Schedule::Constant { value: 1.0 }
        } else {
            Schedule::Linear {
                start: 1.0,
                end: 1.0 + ramp,
                total: u64::from(max_steps),
            }
        }
    }

    /// Check structural invariants.
    ///
    /// Goals are not required here; variants that need them check at
    /// construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGrid);
        }
        if self.starts.is_empty() {
            return Err(ConfigError::NoStarts);
        }
        let size = self.grid_size;
        for (what, cells) in [
            ("start", &self.starts),
            ("goal", &self.goals),
            ("obstacle", &self.static_obstacles),
        ] {
            if let Some(&cell) = cells.iter().find(|c| !c.in_bounds(size)) {
                return Err(ConfigError::OutOfBounds {
                    what,
                    cell,
                    grid_size: size,
                });
            }
        }
        if let Some(&cell) = self
            .starts
            .iter()
            .find(|s| self.static_obstacles.contains(s))
        {
            return Err(ConfigError::StartOnObstacle { cell });
        }
        for m in &self.moving_obstacles {
            if m.path.is_empty() {
                return Err(ConfigError::EmptyPath { id: m.id.clone() });
            }
            let finite_path = m.path.iter().all(|p| p.x.is_finite() && p.y.is_finite());
            if !m.speed.is_finite() || !m.phase.is_finite() || !finite_path {
                return Err(ConfigError::InvalidObstacleMotion { id: m.id.clone() });
            }
        }
        if !(0.0..=1.0).contains(&self.difficulty) {
            return Err(ConfigError::InvalidDifficulty {
                value: self.difficulty,
            });
        }
        if self.time_limit == Some(0) {
            return Err(ConfigError::ZeroTimeLimit);
        }
        self.reward_weights().validate()
    }
}
