//! Scalar schedules over step count.
//!
//! Used to ramp obstacle speed across an episode and to decay
//! environmental quantities as agents make progress.

use serde::{Deserialize, Serialize};

/// Linear interpolation from `start` to `end` with progress
/// `step / total` clamped to `[0, 1]`. A zero `total` yields `end`.
pub fn linear(start: f32, end: f32, step: u64, total: u64) -> f32 {
    if total == 0 {
        return end;
    }
    let t = (step as f64 / total as f64).clamp(0.0, 1.0) as f32;
    start + (end - start) * t
}

/// `start · rate^step`, never crossing `floor`.
///
/// Equivalent to applying `v = max(floor, v · rate)` `step` times for
/// `rate` in `(0, 1]`.
pub fn exponential_decay(start: f32, floor: f32, rate: f32, step: u64) -> f32 {
    let exp = step.min(i32::MAX as u64) as i32;
    let v = start * rate.powi(exp);
    if start >= floor {
        v.max(floor)
    } else {
        v.min(floor)
    }
}

/// A scalar parameter as a function of step count.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Schedule {
    /// Always the same value.
    Constant {
        /// The value.
        value: f32,
    },
    /// See [`linear`].
    Linear {
        /// Value at step 0.
        start: f32,
        /// Value from `total` onwards.
        end: f32,
        /// Steps over which to interpolate.
        total: u64,
    },
    /// See [`exponential_decay`].
    ExponentialDecay {
        /// Value at step 0.
        start: f32,
        /// Bound the value never crosses.
        floor: f32,
        /// Multiplier per step.
        rate: f32,
    },
}

impl Schedule {
    /// Evaluate the schedule at `step`.
    pub fn value_at(&self, step: u64) -> f32 {
        match *self {
            Self::Constant { value } => value,
            Self::Linear { start, end, total } => linear(start, end, step, total),
            Self::ExponentialDecay { start, floor, rate } => {
                exponential_decay(start, floor, rate, step)
            }
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::Constant { value: 1.0 }
    }
}
