use indexmap::IndexSet;
use warren_core::{ActionId, Cell, Position, Schedule};

use crate::agent::{Agent, Resource};
use crate::heuristic::{advance, steer, Steer};
use crate::kind::EnvKind;
use crate::obs::{base_features, goal_centre};
use crate::world::{Rules, WorldState};

/// Rotate heading by `+TURN`.
pub const TURN_LEFT: ActionId = ActionId(0);
/// Rotate heading by `-TURN`.
pub const TURN_RIGHT: ActionId = ActionId(1);
/// Plough `STRIDE` cells along the heading, spreading salt.
pub const ADVANCE: ActionId = ActionId(2);
/// Stay put.
pub const IDLE: ActionId = ActionId(3);

const TURN: f32 = 0.3;
const STRIDE: f32 = 0.5;
const FUEL_COST: f32 = 0.01;
const SALT_COST: f32 = 0.005;
const CLEAR_BONUS: f32 = 0.3;
const SNOW_READINGS: usize = 16;
const TRAFFIC_SLOTS: usize = 6;
const TRAFFIC_RANGE: f32 = 5.0;

/// Snow depth scale as a function of cells the fleet has cleared.
const SNOW_DECAY: Schedule = Schedule::ExponentialDecay {
    start: 1.0,
    floor: 0.2,
    rate: 0.995,
};

/// A snowplow fleet clearing a road network while dodging traffic.
///
/// Every newly cleared cell pays a bonus, and the remaining snow depth
/// decays as the fleet's coverage grows.
#[derive(Clone, Debug, Default)]
pub struct SnowplowFleet {
    cleared: IndexSet<Cell>,
}

impl SnowplowFleet {
    /// Cells cleared by the fleet this episode.
    pub fn cleared(&self) -> usize {
        self.cleared.len()
    }

    fn coverage(&self, state: &WorldState) -> f32 {
        self.cleared.len() as f32 / (state.level.grid_size as f32).powi(2)
    }
}

impl Rules for SnowplowFleet {
    const KIND: EnvKind = EnvKind::SnowplowFleet;
    const ACTION_COUNT: usize = 4;
    const OBSERVATION_LEN: usize = 30;
    const DEFAULT_MAX_STEPS: u32 = 500;
    const IDLE: ActionId = IDLE;

    fn initial_resource(&self) -> Resource {
        Resource::Fuel {
            fuel: 1.0,
            salt: 1.0,
            coverage: 0.0,
        }
    }

    fn reset(&mut self, state: &WorldState) {
        self.cleared = state.agents.iter().map(Agent::cell).collect();
    }

    fn drain(&mut self, _index: usize, agent: &mut Agent, action: ActionId) {
        if let Resource::Fuel { fuel, salt, .. } = &mut agent.resource {
            *fuel = (*fuel - FUEL_COST).max(0.0);
            if action == ADVANCE {
                *salt = (*salt - SALT_COST).max(0.0);
            }
        }
    }

    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position {
        match action {
            TURN_LEFT => agent.heading += TURN,
            TURN_RIGHT => agent.heading -= TURN,
            ADVANCE => return advance(agent.position, agent.heading, STRIDE),
            _ => {}
        }
        agent.position
    }

    fn shaping(&mut self, _index: usize, agent: &mut Agent, state: &WorldState) -> f32 {
        let bonus = if self.cleared.insert(agent.cell()) {
            CLEAR_BONUS
        } else {
            0.0
        };
        let covered = self.coverage(state);
        if let Resource::Fuel { coverage, .. } = &mut agent.resource {
            *coverage = covered;
        }
        bonus
    }

    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>) {
        let agent = &state.agents[index];
        let goal = state.goal_cell(self.goal_index(index, agent.position, state));
        base_features(agent.position, goal, out);
        out.push(agent.heading);

        let tick = state.tick() as f32;
        let scale = SNOW_DECAY.value_at(self.cleared.len() as u64);
        out.extend((0..SNOW_READINGS).map(|i| {
            let depth = 0.7 + 0.2 * (tick * 0.01 + i as f32 * 0.4).sin();
            depth.clamp(0.0, 1.0) * scale
        }));

        let mut traffic = [0.0f32; TRAFFIC_SLOTS];
        for (slot, (_, pos)) in traffic.iter_mut().zip(state.obstacles.movers()) {
            *slot = (1.0 - agent.position.distance(pos) / TRAFFIC_RANGE).max(0.0);
        }
        out.extend_from_slice(&traffic);

        let (fuel, salt) = match agent.resource {
            Resource::Fuel { fuel, salt, .. } => (fuel, salt),
            _ => (0.0, 0.0),
        };
        out.extend_from_slice(&[salt, fuel]);
    }

    fn heuristic(&self, index: usize, state: &WorldState) -> ActionId {
        let agent = &state.agents[index];
        let Some(goal) = state.goal_cell(self.goal_index(index, agent.position, state)) else {
            return IDLE;
        };
        match steer(agent.heading, agent.position, goal_centre(goal), TURN / 2.0) {
            Steer::Left => TURN_LEFT,
            Steer::Right => TURN_RIGHT,
            Steer::Ahead => {
                let next = advance(agent.position, agent.heading, STRIDE)
                    .clamp_to_grid(state.level.grid_size);
                if state.obstacles.is_static(next.cell()) {
                    TURN_LEFT
                } else if state.obstacles.is_blocked(next.cell()) {
                    // wait for traffic to pass
                    IDLE
                } else {
                    ADVANCE
                }
            }
        }
    }
}
