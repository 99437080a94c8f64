//! Simulation configuration, partial updates, and loop timing.
//!
//! [`SimConfig`] is everything the scheduler needs to build an
//! environment. [`SimConfigPatch`] carries a `Configure` command's
//! partial update; [`SimConfig::merged`] applies one and validates the
//! result without touching the original.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use warren_core::{ConfigError, GridWorldConfig, LevelConfig};
use warren_env::{EnvKind, Environment};

// ── TimingConfig ───────────────────────────────────────────────────

/// Loop cadence.
///
/// `period(speed) = max(min_period, 1 / (base_rate_hz · max(min_speed, speed)))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    /// Ticks per second at speed 1.0. Default: 12.
    pub base_rate_hz: f64,
    /// Lowest accepted speed multiplier. Default: 0.25.
    pub min_speed: f64,
    /// Shortest period in milliseconds. Default: 16.
    pub min_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_rate_hz: 12.0,
            min_speed: 0.25,
            min_period_ms: 16,
        }
    }
}

impl TimingConfig {
    /// `speed` raised to at least `min_speed`. `NaN` becomes `min_speed`.
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            self.min_speed
        } else {
            speed.max(self.min_speed)
        }
    }

    /// Time between ticks at `speed`.
    pub fn period(&self, speed: f64) -> Duration {
        let secs = 1.0 / (self.base_rate_hz * self.clamp_speed(speed));
        let floor = Duration::from_millis(self.min_period_ms);
        if secs.is_finite() {
            Duration::from_secs_f64(secs).max(floor)
        } else {
            floor
        }
    }

    /// Check rates are finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_rate_hz.is_finite() || self.base_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidTiming {
                reason: format!("base rate must be finite and positive, got {}", self.base_rate_hz),
            });
        }
        if !self.min_speed.is_finite() || self.min_speed <= 0.0 {
            return Err(ConfigError::InvalidTiming {
                reason: format!("minimum speed must be finite and positive, got {}", self.min_speed),
            });
        }
        if self.min_period_ms == 0 {
            return Err(ConfigError::InvalidTiming {
                reason: "minimum period must be at least 1 ms".into(),
            });
        }
        Ok(())
    }
}

// ── SimConfig ──────────────────────────────────────────────────────

/// What to simulate and how fast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Environment variant. Default: grid world.
    pub kind: EnvKind,
    /// Explicit level. `None` means the grid-world generator for
    /// [`EnvKind::GridWorld`] and the built-in level for the others.
    pub level: Option<LevelConfig>,
    /// Generator settings used when `kind` is grid world and no level
    /// is given.
    pub grid_world: GridWorldConfig,
    /// Seed for the environment's stochastic elements.
    pub seed: u64,
    /// Loop cadence.
    pub timing: TimingConfig,
    /// Execution providers requested when loading policies.
    pub execution_providers: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            kind: EnvKind::GridWorld,
            level: None,
            grid_world: GridWorldConfig::default(),
            seed: 0,
            timing: TimingConfig::default(),
            execution_providers: Vec::new(),
        }
    }
}

impl SimConfig {
    /// A configuration for `kind` on its built-in level.
    pub fn for_kind(kind: EnvKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// The level an environment will be built on.
    pub fn resolve_level(&self) -> Result<LevelConfig, ConfigError> {
        match (&self.level, self.kind) {
            (Some(level), _) => Ok(level.clone()),
            (None, EnvKind::GridWorld) => self.grid_world.to_level(),
            (None, kind) => Ok(kind.default_level()),
        }
    }

    /// Build a fresh environment, validating the level on the way.
    pub fn build_env(&self) -> Result<Box<dyn Environment>, ConfigError> {
        self.kind.build(self.resolve_level()?, self.seed)
    }

    /// Validate timing and the resolved level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        if self.level.is_none() && self.kind == EnvKind::GridWorld {
            self.grid_world.validate()?;
        }
        self.resolve_level()?.validate()
    }

    /// A copy with `patch` applied, validated.
    ///
    /// Changing the kind without supplying a level drops the current
    /// level so the new kind starts on its own.
    pub fn merged(&self, patch: SimConfigPatch) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(kind) = patch.kind {
            if kind != next.kind && patch.level.is_none() {
                next.level = None;
            }
            next.kind = kind;
        }
        if let Some(level) = patch.level {
            next.level = Some(level);
        }
        if let Some(grid_world) = patch.grid_world {
            next.grid_world = grid_world;
        }
        if let Some(seed) = patch.seed {
            next.seed = seed;
        }
        if let Some(timing) = patch.timing {
            next.timing = timing;
        }
        if let Some(providers) = patch.execution_providers {
            next.execution_providers = providers;
        }
        next.validate()?;
        Ok(next)
    }
}

/// A partial [`SimConfig`]; `None` fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfigPatch {
    /// New variant.
    pub kind: Option<EnvKind>,
    /// New explicit level.
    pub level: Option<LevelConfig>,
    /// New generator settings.
    pub grid_world: Option<GridWorldConfig>,
    /// New seed.
    pub seed: Option<u64>,
    /// New cadence.
    pub timing: Option<TimingConfig>,
    /// New execution providers.
    pub execution_providers: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::Cell;

    #[test]
    fn period_follows_speed() {
        let t = TimingConfig::default();
        assert_eq!(t.period(1.0), Duration::from_secs_f64(1.0 / 12.0));
        assert_eq!(t.period(2.0), Duration::from_secs_f64(1.0 / 24.0));
        // 12 Hz × 10 = 8.3 ms, floored at 16 ms
        assert_eq!(t.period(10.0), Duration::from_millis(16));
        assert_eq!(t.period(f64::INFINITY), Duration::from_millis(16));
    }

    #[test]
    fn slow_speeds_clamp() {
        let t = TimingConfig::default();
        assert_eq!(t.clamp_speed(0.01), 0.25);
        assert_eq!(t.clamp_speed(-3.0), 0.25);
        assert_eq!(t.clamp_speed(f64::NAN), 0.25);
        assert_eq!(t.period(0.0), Duration::from_secs_f64(1.0 / 3.0));
    }

    #[test]
    fn bad_timing_rejected() {
        let t = TimingConfig {
            base_rate_hz: 0.0,
            ..TimingConfig::default()
        };
        assert!(matches!(t.validate(), Err(ConfigError::InvalidTiming { .. })));
        let t = TimingConfig {
            min_speed: f64::NAN,
            ..TimingConfig::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn kind_change_drops_level() {
        let level = LevelConfig::new(6)
            .with_start(Cell::new(0, 0))
            .with_goal(Cell::new(5, 5));
        let base = SimConfig {
            level: Some(level.clone()),
            ..SimConfig::default()
        };
        let next = base
            .merged(SimConfigPatch {
                kind: Some(EnvKind::SnowplowFleet),
                ..SimConfigPatch::default()
            })
            .unwrap();
        assert_eq!(next.level, None);
        assert_eq!(next.resolve_level().unwrap(), EnvKind::SnowplowFleet.default_level());

        let same = base
            .merged(SimConfigPatch {
                seed: Some(9),
                ..SimConfigPatch::default()
            })
            .unwrap();
        assert_eq!(same.level, Some(level));
        assert_eq!(same.seed, 9);
    }

    #[test]
    fn invalid_patch_leaves_original() {
        let base = SimConfig::default();
        let err = base.merged(SimConfigPatch {
            level: Some(LevelConfig::new(0)),
            ..SimConfigPatch::default()
        });
        assert!(err.is_err());
        assert_eq!(base, SimConfig::default());
    }

    #[test]
    fn patch_from_json() {
        let patch: SimConfigPatch =
            serde_json::from_str(r#"{"kind":"reef-guardians","seed":4,"timing":{"baseRateHz":30}}"#)
                .unwrap();
        assert_eq!(patch.kind, Some(EnvKind::ReefGuardians));
        assert_eq!(patch.timing.unwrap().base_rate_hz, 30.0);
        assert_eq!(patch.timing.unwrap().min_period_ms, 16);
        assert_eq!(patch.level, None);
    }

    #[test]
    fn every_kind_builds_from_default_config() {
        for kind in EnvKind::ALL {
            let env = SimConfig::for_kind(kind).build_env().unwrap();
            assert_eq!(env.kind(), kind);
        }
    }
}
