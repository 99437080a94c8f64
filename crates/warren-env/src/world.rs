//! The shared stepping loop.
//!
//! [`World`] implements [`Environment`] once for every variant. A
//! variant supplies a [`Rules`] type that decodes actions, drains
//! resources, assigns goals, shapes rewards and builds observations;
//! obstacle motion, collision, goal and truncation handling live here.

use std::collections::VecDeque;

use tracing::debug;
use warren_core::{
    ActionId, AgentId, Cell, ConfigError, LevelConfig, Position, RewardWeights, Schedule, TickId,
};

use crate::agent::{Agent, Resource};
use crate::episode::EpisodeState;
use crate::frame::{Frame, MovingTile, Pickup, TileState, TRAIL_LEN};
use crate::kind::EnvKind;
use crate::obstacles::ObstacleField;
use crate::{Environment, StepOutcome};

// ── Rules ──────────────────────────────────────────────────────────

/// Variant-specific behaviour plugged into [`World`].
///
/// Hooks are called in this order for every active agent on a tick:
/// [`drain`](Rules::drain), [`propose`](Rules::propose), collision
/// check, [`goal_index`](Rules::goal_index), depletion check, then
/// [`shaping`](Rules::shaping) for agents that are still active.
pub trait Rules: Send + 'static {
    /// The variant this rule set implements.
    const KIND: EnvKind;
    /// Number of discrete actions.
    const ACTION_COUNT: usize;
    /// Observation vector length.
    const OBSERVATION_LEN: usize;
    /// Episode length when the level sets no time limit.
    const DEFAULT_MAX_STEPS: u32;
    /// Action substituted for missing or unknown actions.
    const IDLE: ActionId;

    /// Resource every agent starts an episode with.
    fn initial_resource(&self) -> Resource;

    /// Extra level checks beyond [`LevelConfig::validate`].
    fn check_level(&self, level: &LevelConfig) -> Result<(), ConfigError> {
        if level.goals.is_empty() {
            return Err(ConfigError::NoGoals);
        }
        Ok(())
    }

    /// Reset variant-private state at the start of an episode.
    fn reset(&mut self, _state: &WorldState) {}

    /// Whether reaching a goal marks it collected for everyone.
    fn consumes_pickups(&self) -> bool {
        false
    }

    /// Pickup the agent at `position` is working towards.
    fn goal_index(&self, index: usize, _position: Position, state: &WorldState) -> Option<usize> {
        match state.pickups.len() {
            0 => None,
            n => Some(index % n),
        }
    }

    /// Spend or restore resources for `action`.
    fn drain(&mut self, index: usize, agent: &mut Agent, action: ActionId);

    /// Apply heading changes and return the proposed position before
    /// clamping.
    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position;

    /// Bonus added to the step reward on a non-terminal tick.
    ///
    /// `agent` already holds its new position; `state.agents[index]`
    /// still holds the previous one.
    fn shaping(&mut self, _index: usize, _agent: &mut Agent, _state: &WorldState) -> f32 {
        0.0
    }

    /// Append the observation for agent `index` to `out`.
    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>);

    /// Deterministic fallback action for an active agent.
    fn heuristic(&self, index: usize, state: &WorldState) -> ActionId;
}

// ── WorldState ─────────────────────────────────────────────────────

/// Everything a [`Rules`] implementation may read.
#[derive(Clone, Debug)]
pub struct WorldState {
    /// The level being played.
    pub level: LevelConfig,
    /// Effective reward weights.
    pub rewards: RewardWeights,
    /// Effective episode length.
    pub max_steps: u32,
    /// Seed for stochastic variants.
    pub seed: u64,
    /// Obstacles at their current positions.
    pub obstacles: ObstacleField,
    /// Agents in id order.
    pub agents: Vec<Agent>,
    /// Goal cells.
    pub pickups: Vec<Pickup>,
    /// Episode bookkeeping.
    pub episode: EpisodeState,
    trails: Vec<VecDeque<Position>>,
}

impl WorldState {
    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.episode.tick.0
    }

    /// Whether agent `index` is done.
    pub fn is_done(&self, index: usize) -> bool {
        self.episode.dones[index]
    }

    /// Agents other than `index`, with their indices.
    pub fn others(&self, index: usize) -> impl Iterator<Item = (usize, &Agent)> + '_ {
        self.agents
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != index)
    }

    /// Cell of the pickup at `goal`, if any.
    pub fn goal_cell(&self, goal: Option<usize>) -> Option<Cell> {
        goal.and_then(|g| self.pickups.get(g)).map(|p| p.cell)
    }

    fn push_trail(&mut self, index: usize, p: Position) {
        let trail = &mut self.trails[index];
        if trail.len() == TRAIL_LEN {
            trail.pop_front();
        }
        trail.push_back(p);
    }
}

// ── World ──────────────────────────────────────────────────────────

/// One environment instance: shared state plus a variant's rules.
pub struct World<R: Rules> {
    rules: R,
    state: WorldState,
    speed: Schedule,
}

impl<R: Rules> World<R> {
    /// Validate `level` and build a world ready to play.
    pub fn new(rules: R, level: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        level.validate()?;
        rules.check_level(&level)?;
        let max_steps = level.time_limit.unwrap_or(R::DEFAULT_MAX_STEPS);
        let n = level.agent_count();
        let state = WorldState {
            rewards: level.reward_weights(),
            max_steps,
            seed,
            obstacles: ObstacleField::new(&level),
            agents: Vec::with_capacity(n),
            pickups: Vec::new(),
            episode: EpisodeState::new(n),
            trails: vec![VecDeque::with_capacity(TRAIL_LEN); n],
            level,
        };
        let speed = state.level.obstacle_speed_schedule(max_steps);
        let mut world = Self {
            rules,
            state,
            speed,
        };
        world.reset();
        Ok(world)
    }

    /// The variant's rules.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Read-only world state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }
}

impl<R: Rules> Environment for World<R> {
    fn kind(&self) -> EnvKind {
        R::KIND
    }

    fn reset(&mut self) -> Vec<Agent> {
        let s = &mut self.state;
        s.agents = s
            .level
            .starts
            .iter()
            .enumerate()
            .map(|(i, &start)| Agent::new(AgentId(i as u32), start, self.rules.initial_resource()))
            .collect();
        s.pickups = s
            .level
            .goals
            .iter()
            .map(|&cell| Pickup {
                cell,
                collected: false,
            })
            .collect();
        s.obstacles.reset();
        s.episode = EpisodeState::new(s.agents.len());
        for (trail, agent) in s.trails.iter_mut().zip(&s.agents) {
            trail.clear();
            trail.push_back(agent.position);
        }
        self.rules.reset(&self.state);
        debug!(kind = R::KIND.name(), agents = self.state.agents.len(), "episode reset");
        self.state.agents.clone()
    }

    fn step(&mut self, actions: &[ActionId]) -> StepOutcome {
        let n = self.state.agents.len();
        if self.state.episode.all_done() {
            return StepOutcome {
                agents: self.state.agents.clone(),
                rewards: vec![0.0; n],
                dones: self.state.episode.dones.clone(),
            };
        }

        let scale = self.speed.value_at(self.state.tick());
        self.state.obstacles.advance(scale);
        let weights = self.state.rewards;
        let size = self.state.level.grid_size;
        let mut rewards = vec![0.0f32; n];

        for (i, reward) in rewards.iter_mut().enumerate() {
            if self.state.is_done(i) {
                continue;
            }
            let action = actions
                .get(i)
                .copied()
                .filter(|a| a.index() < R::ACTION_COUNT)
                .unwrap_or(R::IDLE);
            let mut agent = self.state.agents[i].clone();
            let previous = agent.position;

            self.rules.drain(i, &mut agent, action);
            let proposed = self.rules.propose(&mut agent, action).clamp_to_grid(size);
            let cell = proposed.cell();

            if self.state.obstacles.is_blocked(cell) {
                agent.velocity = [0.0, 0.0];
                self.state.agents[i] = agent;
                self.state.episode.mark_done(i);
                *reward = weights.collision;
                continue;
            }

            agent.velocity = [proposed.x - previous.x, proposed.y - previous.y];
            agent.position = proposed;

            let goal = self
                .rules
                .goal_index(i, proposed, &self.state)
                .filter(|&g| self.state.pickups[g].cell == cell);
            if let Some(g) = goal {
                if self.rules.consumes_pickups() {
                    self.state.pickups[g].collected = true;
                }
                self.state.episode.mark_done(i);
                *reward = weights.goal;
            } else if agent.resource.is_depleted() {
                self.state.episode.mark_done(i);
                *reward = weights.step;
            } else {
                *reward = weights.step + self.rules.shaping(i, &mut agent, &self.state);
            }
            self.state.agents[i] = agent;
            self.state.push_trail(i, proposed);
        }

        self.state.episode.record(&rewards);
        if self.state.tick() >= u64::from(self.state.max_steps) {
            self.state.episode.truncate();
        }
        if self.state.episode.all_done() {
            debug!(
                kind = R::KIND.name(),
                tick = self.state.tick(),
                returns = ?self.state.episode.returns,
                "episode finished"
            );
        }

        StepOutcome {
            agents: self.state.agents.clone(),
            rewards,
            dones: self.state.episode.dones.clone(),
        }
    }

    fn agents(&self) -> &[Agent] {
        &self.state.agents
    }

    fn episode(&self) -> &EpisodeState {
        &self.state.episode
    }

    fn level(&self) -> &LevelConfig {
        &self.state.level
    }

    fn max_steps(&self) -> u32 {
        self.state.max_steps
    }

    fn observation_len(&self) -> usize {
        R::OBSERVATION_LEN
    }

    fn action_count(&self) -> usize {
        R::ACTION_COUNT
    }

    fn observe(&self, index: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(R::OBSERVATION_LEN);
        self.rules.observe(index, &self.state, &mut out);
        debug_assert_eq!(out.len(), R::OBSERVATION_LEN, "{} observation", R::KIND);
        out
    }

    fn heuristic_actions(&self) -> Vec<ActionId> {
        (0..self.state.agents.len())
            .map(|i| {
                if self.state.is_done(i) {
                    R::IDLE
                } else {
                    self.rules.heuristic(i, &self.state)
                }
            })
            .collect()
    }

    fn frame(&self) -> Frame {
        let s = &self.state;
        Frame {
            tick: TickId(s.tick()),
            kind: R::KIND,
            agents: s.agents.clone(),
            rewards: s.episode.last_rewards.clone(),
            returns: s.episode.returns.clone(),
            dones: s.episode.dones.clone(),
            pickups: s.pickups.clone(),
            tiles: TileState {
                grid_size: s.level.grid_size,
                static_obstacles: s.obstacles.statics().collect(),
                moving_obstacles: s
                    .obstacles
                    .movers()
                    .map(|(id, position)| MovingTile {
                        id: id.to_string(),
                        position,
                        cell: position.cell(),
                    })
                    .collect(),
            },
            trails: s.trails.iter().map(|t| t.iter().copied().collect()).collect(),
        }
    }
}
