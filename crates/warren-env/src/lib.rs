//! Grid-based multi-agent environments for Warren.
//!
//! Six variants share one contract, [`Environment`], and one stepping
//! loop, [`World`]. Each variant is a [`Rules`] implementation in
//! [`variants`]; [`EnvKind::build`] constructs any of them behind a
//! trait object.
//!
//! # Quick start
//!
//! ```
//! use warren_core::ActionId;
//! use warren_env::{EnvKind, Environment};
//!
//! let mut env = EnvKind::GridWorld
//!     .build(EnvKind::GridWorld.default_level(), 0)
//!     .unwrap();
//! let out = env.step(&[ActionId::RIGHT]);
//! assert_eq!(out.rewards.len(), 1);
//! assert_eq!(env.observe(0).len(), env.observation_len());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod episode;
pub mod frame;
pub mod heuristic;
pub mod kind;
pub mod obs;
pub mod obstacles;
pub mod variants;
pub mod world;

pub use agent::{Agent, Resource};
pub use episode::EpisodeState;
pub use frame::{Frame, MovingTile, Pickup, TileState};
pub use kind::{EnvKind, UnknownKind};
pub use obs::observe_all;
pub use world::{Rules, World, WorldState};

use warren_core::{ActionId, LevelConfig};

/// Result of one [`Environment::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Agents after the tick.
    pub agents: Vec<Agent>,
    /// Reward per agent for this tick. Zero for agents that were
    /// already done.
    pub rewards: Vec<f32>,
    /// Done flag per agent after the tick.
    pub dones: Vec<bool>,
}

/// The contract every environment variant fulfils.
///
/// Object safe so the scheduler can swap variants at runtime.
pub trait Environment: Send {
    /// Which variant this is.
    fn kind(&self) -> EnvKind;

    /// Start a new episode: agents at their starts with full
    /// resources, tick zero, nothing done, obstacles at time zero.
    fn reset(&mut self) -> Vec<Agent>;

    /// Advance every agent by one tick.
    ///
    /// `actions[i]` drives agent `i`. Missing or out-of-range actions
    /// act as the variant's idle action. Once every agent is done this
    /// is a no-op returning zero rewards until [`reset`](Environment::reset).
    fn step(&mut self, actions: &[ActionId]) -> StepOutcome;

    /// Current agents in id order.
    fn agents(&self) -> &[Agent];

    /// Owned copy of the current agents.
    fn snapshot_agents(&self) -> Vec<Agent> {
        self.agents().to_vec()
    }

    /// Episode bookkeeping.
    fn episode(&self) -> &EpisodeState;

    /// The level being played.
    fn level(&self) -> &LevelConfig;

    /// Effective episode length in ticks.
    fn max_steps(&self) -> u32;

    /// Fixed observation vector length.
    fn observation_len(&self) -> usize;

    /// Number of discrete actions.
    fn action_count(&self) -> usize;

    /// Observation for agent `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid agent index.
    fn observe(&self, index: usize) -> Vec<f32>;

    /// Deterministic fallback actions, one per agent.
    fn heuristic_actions(&self) -> Vec<ActionId>;

    /// Deep-copied snapshot of the current state.
    fn frame(&self) -> Frame;
}
