//! The scheduling actor: a [`Scheduler`] on its own thread.
//!
//! ```text
//! Caller                        warren-sched thread
//!   |                                 |
//!   |--send(Command)----------------->| recv_deadline(pending tick)
//!   |   [cmd_tx: bounded(64)]         |   command  -> scheduler.handle()
//!   |                                 |   deadline -> scheduler.on_deadline()
//!   |<--Event-------------------------|
//!   |   [event_tx: unbounded]         |
//! ```

use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::debug;
use warren_core::ConfigError;
use warren_policy::PolicyRunner;

use crate::command::Command;
use crate::config::SimConfig;
use crate::event::Event;
use crate::scheduler::{Flow, Scheduler};

/// Queued commands before [`SimActor::send`] reports back-pressure.
pub const COMMAND_CAPACITY: usize = 64;

// ── Error types ──────────────────────────────────────────────────

/// Errors from spawning or talking to the actor.
#[derive(Debug, PartialEq)]
pub enum ActorError {
    /// The actor has been disposed.
    Disposed,
    /// The command channel is full (back-pressure).
    ChannelFull,
    /// The initial configuration was rejected.
    Config(ConfigError),
    /// The scheduler thread could not be started.
    Spawn {
        /// The OS error.
        reason: String,
    },
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disposed => write!(f, "actor has been disposed"),
            Self::ChannelFull => write!(f, "command channel full"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Spawn { reason } => write!(f, "failed to spawn scheduler thread: {reason}"),
        }
    }
}

impl std::error::Error for ActorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ActorError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ── SimActor ─────────────────────────────────────────────────────

/// Handle to a running scheduler thread.
///
/// Dropping the handle disposes the actor and joins its thread.
pub struct SimActor {
    cmd_tx: Option<Sender<Command>>,
    events: Receiver<Event>,
    thread: Option<JoinHandle<()>>,
}

impl SimActor {
    /// Spawn with every policy backend compiled into this build.
    pub fn spawn(config: SimConfig) -> Result<Self, ActorError> {
        Self::spawn_with_runner(config, PolicyRunner::with_default_backends())
    }

    /// Spawn with a caller-supplied runner.
    pub fn spawn_with_runner(config: SimConfig, runner: PolicyRunner) -> Result<Self, ActorError> {
        let (event_tx, events) = crossbeam_channel::unbounded();
        let scheduler = Scheduler::new(config, runner, event_tx)?;
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(COMMAND_CAPACITY);

        let thread = thread::Builder::new()
            .name("warren-sched".into())
            .spawn(move || run(scheduler, cmd_rx))
            .map_err(|e| ActorError::Spawn {
                reason: e.to_string(),
            })?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            events,
            thread: Some(thread),
        })
    }

    /// Queue a command without blocking.
    pub fn send(&self, command: Command) -> Result<(), ActorError> {
        let tx = self.cmd_tx.as_ref().ok_or(ActorError::Disposed)?;
        tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ActorError::ChannelFull,
            TrySendError::Disconnected(_) => ActorError::Disposed,
        })
    }

    /// The event stream. Events keep arriving until the actor is
    /// disposed; the stream then disconnects once drained.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Dispose the scheduler and wait for its thread. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            // Dropping the sender also disposes if the channel is full.
            let _ = tx.try_send(Command::Dispose);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                debug!("scheduler thread panicked");
            }
        }
    }
}

impl Drop for SimActor {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn run(mut scheduler: Scheduler, commands: Receiver<Command>) {
    debug!("scheduler thread started");
    loop {
        let received = match scheduler.next_deadline() {
            Some(deadline) => commands.recv_deadline(deadline),
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(command) => {
                if scheduler.handle(command) == Flow::Exit {
                    break;
                }
                // Due ticks still run under a steady command stream.
                scheduler.on_deadline(Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => {
                scheduler.on_deadline(Instant::now());
            }
            Err(RecvTimeoutError::Disconnected) => {
                scheduler.handle(Command::Dispose);
                break;
            }
        }
    }
    debug!("scheduler thread exiting");
}
