//! Per-tick timings for the scheduler.

use std::time::Duration;

/// Wall-clock breakdown of the most recent tick, in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickMetrics {
    /// Building observations for every agent.
    pub observation_us: u64,
    /// Running the policy, or computing heuristic actions.
    pub inference_us: u64,
    /// Advancing the environment.
    pub step_us: u64,
    /// Whether the policy produced this tick's actions.
    pub used_policy: bool,
}

impl TickMetrics {
    /// Sum of the three phases.
    pub fn total_us(&self) -> u64 {
        self.observation_us + self.inference_us + self.step_us
    }
}

pub(crate) fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = TickMetrics::default();
        assert_eq!(m.total_us(), 0);
        assert!(!m.used_policy);
    }

    #[test]
    fn micros_saturates() {
        assert_eq!(micros(Duration::from_millis(3)), 3000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
