//! Core types and configuration for the Warren simulation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: strongly-typed
//! ids, grid geometry, level and grid-world configuration, the error
//! taxonomy, and the schedule helpers used to ramp parameters over
//! step count.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geom;
pub mod gridworld;
pub mod id;
pub mod level;
pub mod schedule;

pub use error::{ConfigError, InferenceError, LoadError, UnsupportedFormatError};
pub use geom::{Cell, Position};
pub use gridworld::{Difficulty, GridWorldConfig};
pub use id::{ActionId, AgentId, TickId};
pub use level::{LevelConfig, MovingObstacle, RewardWeights};
pub use schedule::Schedule;
