//! Warren: grid-based multi-agent simulation with batched policy inference.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Warren sub-crates. For most users, adding `warren` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use warren::prelude::*;
//!
//! // Step the snowplow fleet synchronously with its built-in heuristic.
//! let mut env = EnvKind::SnowplowFleet
//!     .build(EnvKind::SnowplowFleet.default_level(), 42)
//!     .unwrap();
//! for _ in 0..10 {
//!     let actions = env.heuristic_actions();
//!     env.step(&actions);
//! }
//! assert_eq!(env.frame().tick, TickId(10));
//!
//! // Or let the actor tick it on its own thread.
//! let actor = SimActor::spawn(SimConfig::for_kind(EnvKind::SnowplowFleet)).unwrap();
//! actor.send(Command::Step(1)).unwrap();
//! let event = actor.events().recv().unwrap();
//! assert_eq!(event.frame().unwrap().tick, TickId(1));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `warren-core` | Ids, geometry, level config, errors, schedules |
//! | [`env`] | `warren-env` | The six environments and observation helpers |
//! | [`policy`] | `warren-policy` | Policy runner, tensors, inference backends |
//! | [`engine`] | `warren-engine` | Scheduling actor and command/event protocol |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids, and configuration (`warren-core`).
pub use warren_core as types;

/// Environments (`warren-env`).
///
/// Every variant implements [`env::Environment`]; build one with
/// [`env::EnvKind::build`].
pub use warren_env as env;

/// Policy inference (`warren-policy`).
///
/// [`policy::PolicyRunner`] loads a model and maps observation batches
/// to actions.
pub use warren_policy as policy;

/// Scheduling actor (`warren-engine`).
///
/// [`engine::SimActor`] runs the tick loop on a background thread.
pub use warren_engine as engine;

/// Common imports for typical Warren usage.
///
/// ```rust
/// use warren::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use warren_core::{
        ActionId, AgentId, Cell, Difficulty, GridWorldConfig, LevelConfig, Position, TickId,
    };

    // Errors
    pub use warren_core::{ConfigError, InferenceError, LoadError, UnsupportedFormatError};

    // Environments
    pub use warren_env::{observe_all, Agent, EnvKind, Environment, Frame, Resource, StepOutcome};

    // Policy
    pub use warren_policy::{LoadOptions, ObservationSource, PolicyRunner, PolicySource};

    // Engine
    pub use warren_engine::{
        Command, Event, SimActor, SimConfig, SimConfigPatch, TickMetrics, TimingConfig,
    };
}
