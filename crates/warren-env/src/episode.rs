//! Per-episode bookkeeping.

use serde::Serialize;
use warren_core::TickId;

/// Tick counter, returns and done flags for one episode.
///
/// Done is monotonic: once an agent is done it stays done until the
/// next `reset`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeState {
    /// Ticks elapsed since reset.
    pub tick: TickId,
    /// Cumulative reward per agent.
    pub returns: Vec<f32>,
    /// Done flag per agent.
    pub dones: Vec<bool>,
    /// Reward received on the most recent tick.
    pub last_rewards: Vec<f32>,
}

impl EpisodeState {
    /// A fresh episode for `agents` agents.
    pub fn new(agents: usize) -> Self {
        Self {
            tick: TickId(0),
            returns: vec![0.0; agents],
            dones: vec![false; agents],
            last_rewards: vec![0.0; agents],
        }
    }

    /// Whether every agent is done.
    pub fn all_done(&self) -> bool {
        self.dones.iter().all(|&d| d)
    }

    /// Mark agent `index` done.
    pub fn mark_done(&mut self, index: usize) {
        self.dones[index] = true;
    }

    /// Mark every agent done.
    pub fn truncate(&mut self) {
        self.dones.iter_mut().for_each(|d| *d = true);
    }

    /// Record one tick's rewards and advance the counter.
    pub(crate) fn record(&mut self, rewards: &[f32]) {
        for (ret, r) in self.returns.iter_mut().zip(rewards) {
            *ret += r;
        }
        self.last_rewards.clear();
        self.last_rewards.extend_from_slice(rewards);
        self.tick = TickId(self.tick.0 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_and_ticks() {
        let mut e = EpisodeState::new(2);
        e.record(&[-0.01, 1.0]);
        e.record(&[-0.01, 0.0]);
        assert_eq!(e.tick, TickId(2));
        assert!((e.returns[0] + 0.02).abs() < 1e-6);
        assert_eq!(e.returns[1], 1.0);
        assert_eq!(e.last_rewards, vec![-0.01, 0.0]);
    }

    #[test]
    fn all_done_requires_every_agent() {
        let mut e = EpisodeState::new(2);
        e.mark_done(0);
        assert!(!e.all_done());
        e.truncate();
        assert!(e.all_done());
    }
}
