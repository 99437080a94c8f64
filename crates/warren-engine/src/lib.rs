//! Scheduling actor and command/event protocol for Warren.
//!
//! A [`SimActor`] runs a [`Scheduler`] on a dedicated `warren-sched`
//! thread. Callers send [`Command`]s and read [`Event`]s; the scheduler
//! owns the environment and policy runner exclusively and publishes
//! deep-copied frames.
//!
//! ```no_run
//! use warren_engine::{Command, Event, SimActor, SimConfig};
//! use warren_env::EnvKind;
//!
//! let mut actor = SimActor::spawn(SimConfig::for_kind(EnvKind::BunnyGarden)).unwrap();
//! actor.send(Command::Step(3)).unwrap();
//! for event in actor.events().iter().take(3) {
//!     if let Event::State { frame, .. } = event {
//!         println!("tick {}", frame.tick);
//!     }
//! }
//! actor.dispose();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actor;
pub mod command;
pub mod config;
pub mod event;
pub mod metrics;
pub mod scheduler;
pub mod timer;

pub use actor::{ActorError, SimActor};
pub use command::Command;
pub use config::{SimConfig, SimConfigPatch, TimingConfig};
pub use event::Event;
pub use metrics::TickMetrics;
pub use scheduler::{Flow, RunState, Scheduler};
pub use timer::PendingTick;
