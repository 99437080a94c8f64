//! The synchronous heart of the actor: command handling and ticks.
//!
//! [`Scheduler`] owns the environment, the policy runner and the single
//! [`PendingTick`]. It never blocks and never spawns; the actor thread
//! feeds it commands and wakes it when the pending deadline passes,
//! which keeps every state transition testable without threads.

use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{debug, info, trace, warn};
use warren_core::ConfigError;
use warren_env::{observe_all, Environment};
use warren_policy::{LoadOptions, PolicyRunner, PolicySource};

use crate::command::Command;
use crate::config::{SimConfig, SimConfigPatch};
use crate::event::Event;
use crate::metrics::{micros, TickMetrics};
use crate::timer::PendingTick;

/// Whether the loop is ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Not started, or disposed.
    Idle,
    /// Ticking on the timer.
    Running,
    /// Stopped after running.
    Paused,
}

/// What the actor loop should do after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep receiving.
    Continue,
    /// Leave the loop.
    Exit,
}

/// Owns one environment and one policy runner.
pub struct Scheduler {
    config: SimConfig,
    env: Box<dyn Environment>,
    runner: PolicyRunner,
    events: Sender<Event>,
    state: RunState,
    speed: f64,
    pending: PendingTick,
    metrics: TickMetrics,
    fallback_reported: bool,
}

impl Scheduler {
    /// Validate `config`, build its environment and start `Idle`.
    pub fn new(
        config: SimConfig,
        runner: PolicyRunner,
        events: Sender<Event>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let env = config.build_env()?;
        debug!(kind = %env.kind(), agents = env.agents().len(), "scheduler ready");
        Ok(Self {
            config,
            env,
            runner,
            events,
            state: RunState::Idle,
            speed: 1.0,
            pending: PendingTick::default(),
            metrics: TickMetrics::default(),
            fallback_reported: false,
        })
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The environment being simulated.
    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    /// The policy runner.
    pub fn runner(&self) -> &PolicyRunner {
        &self.runner
    }

    /// Timings of the most recent tick.
    pub fn metrics(&self) -> TickMetrics {
        self.metrics
    }

    /// When the pending tick is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    /// Run the pending tick if it is due at `now`, then re-arm.
    ///
    /// Returns whether a tick ran.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        if !self.pending.take_if_due(now) {
            return false;
        }
        self.tick();
        if self.state == RunState::Running {
            self.arm();
        }
        true
    }

    /// Apply one command to completion.
    pub fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Configure(patch) => self.configure(patch),
            Command::LoadPolicy(source) => self.load_policy(source),
            Command::Start(speed) => {
                self.speed = self.config.timing.clamp_speed(speed);
                self.state = RunState::Running;
                self.pending.cancel();
                debug!(speed = self.speed, "start");
                self.tick();
                self.arm();
            }
            Command::Resume(speed) => {
                if let Some(speed) = speed {
                    self.speed = self.config.timing.clamp_speed(speed);
                }
                self.state = RunState::Running;
                self.pending.cancel();
                debug!(speed = self.speed, "resume");
                self.arm();
            }
            Command::Pause => {
                self.state = RunState::Paused;
                self.pending.cancel();
                debug!("pause");
            }
            Command::Step(n) => {
                self.pending.cancel();
                for _ in 0..n {
                    self.tick();
                }
                if self.state == RunState::Running {
                    self.arm();
                }
            }
            Command::Reset => match self.config.build_env() {
                Ok(env) => {
                    self.env = env;
                    debug!(kind = %self.env.kind(), "reset");
                    self.emit_state();
                }
                Err(e) => self.emit_error(format!("reset failed: {e}")),
            },
            Command::Dispose => {
                self.state = RunState::Idle;
                self.pending.cancel();
                self.runner.clear();
                info!("scheduler disposed");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// One tick: observe, act, step, publish.
    ///
    /// A finished episode is reset first so the loop runs across
    /// episodes.
    pub fn tick(&mut self) {
        if self.env.episode().all_done() {
            self.env.reset();
        }

        let start = Instant::now();
        let observations = observe_all(self.env.as_ref());
        let observed = Instant::now();

        let mut used_policy = false;
        let actions = if self.runner.is_ready() {
            let fallbacks = self.runner.metrics().shape_fallbacks;
            match self.runner.act_batch(&observations) {
                Ok(actions) => {
                    used_policy = true;
                    if !self.fallback_reported && self.runner.metrics().shape_fallbacks > fallbacks {
                        self.fallback_reported = true;
                        self.emit_error(
                            "policy input shape does not match the observations; \
                             running as [batch, features]"
                                .to_string(),
                        );
                    }
                    actions
                }
                Err(e) => {
                    warn!(error = %e, "inference failed, using heuristic actions");
                    self.emit_error(format!("inference failed: {e}"));
                    self.env.heuristic_actions()
                }
            }
        } else {
            self.env.heuristic_actions()
        };
        let acted = Instant::now();

        self.env.step(&actions);
        let stepped = Instant::now();

        self.metrics = TickMetrics {
            observation_us: micros(observed - start),
            inference_us: micros(acted - observed),
            step_us: micros(stepped - acted),
            used_policy,
        };
        trace!(
            tick = self.env.episode().tick.0,
            obs_us = self.metrics.observation_us,
            act_us = self.metrics.inference_us,
            step_us = self.metrics.step_us,
            used_policy,
            "tick"
        );
        self.emit_state();
    }

    fn configure(&mut self, patch: SimConfigPatch) {
        let rebuilt = self
            .config
            .merged(patch)
            .and_then(|next| next.build_env().map(|env| (next, env)));
        match rebuilt {
            Ok((next, env)) => {
                self.config = next;
                self.env = env;
                debug!(kind = %self.env.kind(), seed = self.config.seed, "configured");
                if self.state == RunState::Running {
                    self.pending.cancel();
                    self.tick();
                    self.arm();
                } else {
                    self.emit_state();
                }
            }
            Err(e) => {
                warn!(error = %e, "configure rejected");
                self.emit_error(format!("configure rejected: {e}"));
            }
        }
    }

    fn load_policy(&mut self, source: PolicySource) {
        let options = LoadOptions::with_providers(self.config.execution_providers.iter().cloned());
        match self.runner.load(source, &options) {
            Ok(()) => {
                self.fallback_reported = false;
                let ready = self.runner.is_ready();
                let message = if ready {
                    "policy loaded".to_string()
                } else {
                    "policy loaded but declares no input".to_string()
                };
                self.emit(Event::Policy { ready, message });
            }
            Err(e) => {
                self.runner.clear();
                self.emit(Event::Policy {
                    ready: false,
                    message: e.to_string(),
                });
                self.emit_error(format!("policy load failed: {e}"));
            }
        }
    }

    fn arm(&mut self) {
        let period = self.config.timing.period(self.speed);
        self.pending.arm(Instant::now() + period);
    }

    fn emit_state(&self) {
        self.emit(Event::State {
            frame: Box::new(self.env.frame()),
            policy_ready: self.runner.is_ready(),
        });
    }

    fn emit_error(&self, message: String) {
        self.emit(Event::Error { message });
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use std::time::Duration;
    use warren_core::{Cell, LevelConfig};
    use warren_env::EnvKind;

    fn scheduler(kind: EnvKind) -> (Scheduler, Receiver<Event>) {
        let (tx, rx) = unbounded();
        let s = Scheduler::new(SimConfig::for_kind(kind), PolicyRunner::with_default_backends(), tx)
            .unwrap();
        (s, rx)
    }

    fn drain(rx: &Receiver<Event>) -> Vec<Event> {
        rx.try_iter().collect()
    }

    #[test]
    fn starts_idle_without_timer() {
        let (s, rx) = scheduler(EnvKind::BunnyGarden);
        assert_eq!(s.state(), RunState::Idle);
        assert_eq!(s.next_deadline(), None);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn start_ticks_once_and_arms() {
        let (mut s, rx) = scheduler(EnvKind::BunnyGarden);
        s.handle(Command::Start(0.1));
        assert_eq!(s.state(), RunState::Running);
        assert_eq!(s.speed(), 0.25);
        assert_eq!(s.env().episode().tick.0, 1);
        assert!(s.next_deadline().is_some());
        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame().unwrap().tick.0, 1);
    }

    #[test]
    fn deadline_ticks_and_rearms() {
        let (mut s, _rx) = scheduler(EnvKind::GridWorld);
        s.handle(Command::Start(1.0));
        let deadline = s.next_deadline().unwrap();
        assert!(!s.on_deadline(deadline - Duration::from_millis(1)));
        assert!(s.on_deadline(deadline));
        assert_eq!(s.env().episode().tick.0, 2);
        assert!(s.next_deadline().unwrap() >= deadline);
    }

    #[test]
    fn pause_cancels_and_resume_does_not_tick() {
        let (mut s, _rx) = scheduler(EnvKind::GridWorld);
        s.handle(Command::Start(1.0));
        s.handle(Command::Pause);
        assert_eq!(s.next_deadline(), None);
        s.handle(Command::Resume(Some(2.0)));
        assert_eq!(s.state(), RunState::Running);
        assert_eq!(s.speed(), 2.0);
        assert_eq!(s.env().episode().tick.0, 1);
        assert!(s.next_deadline().is_some());
    }

    #[test]
    fn step_keeps_previous_state() {
        let (mut s, rx) = scheduler(EnvKind::SwarmDrones);
        s.handle(Command::Step(5));
        assert_eq!(s.state(), RunState::Idle);
        assert_eq!(s.env().episode().tick.0, 5);
        assert_eq!(s.next_deadline(), None);
        assert_eq!(drain(&rx).len(), 5);

        s.handle(Command::Start(1.0));
        s.handle(Command::Step(5));
        assert_eq!(s.state(), RunState::Running);
        assert_eq!(s.env().episode().tick.0, 11);
        assert!(s.next_deadline().is_some());
    }

    #[test]
    fn finished_episode_resets_on_next_tick() {
        let (tx, _rx) = unbounded();
        let config = SimConfig {
            level: Some(open_level().with_time_limit(2)),
            ..SimConfig::default()
        };
        let mut s = Scheduler::new(config, PolicyRunner::with_default_backends(), tx).unwrap();
        s.handle(Command::Step(2));
        assert!(s.env().episode().all_done());
        s.handle(Command::Step(1));
        assert_eq!(s.env().episode().tick.0, 1);
        assert!(!s.env().episode().all_done());
    }

    fn open_level() -> LevelConfig {
        LevelConfig::new(8)
            .with_start(Cell::new(0, 0))
            .with_goal(Cell::new(7, 7))
    }

    #[test]
    fn rejected_configure_keeps_config() {
        let (mut s, rx) = scheduler(EnvKind::GridWorld);
        let before = s.config().clone();
        s.handle(Command::Configure(SimConfigPatch {
            level: Some(LevelConfig::new(0)),
            ..SimConfigPatch::default()
        }));
        assert_eq!(s.config(), &before);
        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
    }

    #[test]
    fn configure_while_idle_emits_snapshot() {
        let (mut s, rx) = scheduler(EnvKind::GridWorld);
        s.handle(Command::Configure(SimConfigPatch {
            kind: Some(EnvKind::WarehouseBots),
            ..SimConfigPatch::default()
        }));
        assert_eq!(s.env().kind(), EnvKind::WarehouseBots);
        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame().unwrap().tick.0, 0);
    }

    #[test]
    fn dispose_exits_and_clears() {
        let (mut s, _rx) = scheduler(EnvKind::GridWorld);
        s.handle(Command::Start(1.0));
        assert_eq!(s.handle(Command::Dispose), Flow::Exit);
        assert_eq!(s.state(), RunState::Idle);
        assert_eq!(s.next_deadline(), None);
    }
}
