//! Agents and their variant-specific resources.

use serde::{Deserialize, Serialize};
use warren_core::{AgentId, Cell, Position};

/// Resource levels at or below this count as depleted.
pub const DEPLETION_EPSILON: f32 = 1e-6;

/// The scalar (or scalars) an agent spends while acting.
///
/// Every resource starts full at `reset`; only the primary scalar
/// drives depletion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Resource {
    /// Bunny energy.
    Energy {
        /// Remaining energy in `[0, 1]`.
        level: f32,
    },
    /// Drone battery.
    Battery {
        /// Remaining charge in `[0, 1]`.
        charge: f32,
        /// Flight altitude hint; drops once the charge runs low.
        altitude: f32,
    },
    /// Warehouse bot battery and load.
    Cargo {
        /// Remaining charge in `[0, 1]`.
        battery: f32,
        /// Units currently carried.
        carried: f32,
        /// Maximum units.
        capacity: f32,
    },
    /// Snowplow consumables.
    Fuel {
        /// Remaining fuel in `[0, 1]`.
        fuel: f32,
        /// Remaining salt in `[0, 1]`.
        salt: f32,
        /// Fraction of the grid the fleet has cleared.
        coverage: f32,
    },
    /// Reef guardian air supply.
    Oxygen {
        /// Remaining oxygen in `[0, 1]`.
        level: f32,
        /// Normalised depth, `0` at the top row.
        depth: f32,
    },
    /// Never depletes.
    Unlimited,
}

impl Resource {
    /// The scalar whose exhaustion ends the agent's episode.
    pub fn primary(&self) -> Option<f32> {
        match *self {
            Self::Energy { level } => Some(level),
            Self::Battery { charge, .. } => Some(charge),
            Self::Cargo { battery, .. } => Some(battery),
            Self::Fuel { fuel, .. } => Some(fuel),
            Self::Oxygen { level, .. } => Some(level),
            Self::Unlimited => None,
        }
    }

    /// Whether the primary scalar has run out.
    pub fn is_depleted(&self) -> bool {
        self.primary().is_some_and(|v| v <= DEPLETION_EPSILON)
    }
}

/// One simulated agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Dense id, equal to the agent's index.
    pub id: AgentId,
    /// Current position.
    pub position: Position,
    /// Heading in radians. Kinematic state for heading-based variants,
    /// a rendering hint for the others.
    pub heading: f32,
    /// Displacement applied on the last tick.
    pub velocity: [f32; 2],
    /// Resource state.
    pub resource: Resource,
}

impl Agent {
    /// An agent at `start` with the given resource, facing `+x`.
    pub fn new(id: AgentId, start: Cell, resource: Resource) -> Self {
        Self {
            id,
            position: start.to_position(),
            heading: 0.0,
            velocity: [0.0, 0.0],
            resource,
        }
    }

    /// The occupied cell.
    pub fn cell(&self) -> Cell {
        self.position.cell()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_depletes() {
        assert!(!Resource::Unlimited.is_depleted());
        assert_eq!(Resource::Unlimited.primary(), None);
    }

    #[test]
    fn depletion_uses_primary_scalar() {
        let r = Resource::Fuel {
            fuel: 0.0,
            salt: 1.0,
            coverage: 0.0,
        };
        assert!(r.is_depleted());
        let r = Resource::Fuel {
            fuel: 0.5,
            salt: 0.0,
            coverage: 0.0,
        };
        assert!(!r.is_depleted());
    }
}
