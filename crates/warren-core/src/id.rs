//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an agent within one environment.
///
/// Agents are numbered densely from zero in the order of the level's
/// start positions; `AgentId(n)` is the n-th start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing tick counter.
///
/// Zero after `reset`; incremented once per environment step.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A discrete action chosen for one agent on one tick.
///
/// The meaning of each value is variant-specific. The compass variants
/// share [`ActionId::UP`] through [`ActionId::RIGHT`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Move one cell towards `y - 1`.
    pub const UP: ActionId = ActionId(0);
    /// Move one cell towards `y + 1`.
    pub const DOWN: ActionId = ActionId(1);
    /// Move one cell towards `x - 1`.
    pub const LEFT: ActionId = ActionId(2);
    /// Move one cell towards `x + 1`.
    pub const RIGHT: ActionId = ActionId(3);
    /// Stay in place. Outside every variant's action range, so a policy
    /// never produces it.
    pub const NOOP: ActionId = ActionId(u32::MAX);

    /// The action as an index into a score row.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<usize> for ActionId {
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}
