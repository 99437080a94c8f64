use indexmap::IndexSet;
use warren_core::{ActionId, Cell, Position};

use crate::agent::{Agent, Resource};
use crate::heuristic::{advance, steer, Steer};
use crate::kind::EnvKind;
use crate::obs::{base_features, goal_centre, lidar, neighbour_offsets};
use crate::world::{Rules, WorldState};

/// Rotate heading by `+TURN`.
pub const TURN_LEFT: ActionId = ActionId(0);
/// Rotate heading by `-TURN`.
pub const TURN_RIGHT: ActionId = ActionId(1);
/// Fly `STRIDE` cells along the heading.
pub const THRUST: ActionId = ActionId(2);
/// Hold position at reduced drain.
pub const HOVER: ActionId = ActionId(3);

const TURN: f32 = 0.2;
const STRIDE: f32 = 0.5;
const DRAIN: f32 = 0.01;
const HOVER_DRAIN: f32 = 0.005;
const EXPLORE_BONUS: f32 = 0.1;
const LOW_CHARGE: f32 = 0.1;

/// A drone swarm converging on a shared goal, rewarded for exploring
/// cells it has not flown over before.
#[derive(Clone, Debug, Default)]
pub struct SwarmDrones {
    visited: Vec<IndexSet<Cell>>,
    fleet: IndexSet<Cell>,
}

impl SwarmDrones {
    /// Cells visited by any drone this episode.
    pub fn fleet_coverage(&self) -> usize {
        self.fleet.len()
    }
}

impl Rules for SwarmDrones {
    const KIND: EnvKind = EnvKind::SwarmDrones;
    const ACTION_COUNT: usize = 4;
    const OBSERVATION_LEN: usize = 26;
    const DEFAULT_MAX_STEPS: u32 = 500;
    const IDLE: ActionId = HOVER;

    fn initial_resource(&self) -> Resource {
        Resource::Battery {
            charge: 1.0,
            altitude: 1.0,
        }
    }

    fn reset(&mut self, state: &WorldState) {
        self.visited = state
            .agents
            .iter()
            .map(|a| IndexSet::from([a.cell()]))
            .collect();
        self.fleet = state.agents.iter().map(Agent::cell).collect();
    }

    fn goal_index(&self, _index: usize, _position: Position, state: &WorldState) -> Option<usize> {
        (!state.pickups.is_empty()).then_some(0)
    }

    fn drain(&mut self, _index: usize, agent: &mut Agent, action: ActionId) {
        if let Resource::Battery { charge, altitude } = &mut agent.resource {
            let cost = if action == HOVER { HOVER_DRAIN } else { DRAIN };
            *charge = (*charge - cost).max(0.0);
            *altitude = if *charge > LOW_CHARGE {
                1.0
            } else {
                *charge / LOW_CHARGE
            };
        }
    }

    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position {
        match action {
            TURN_LEFT => agent.heading += TURN,
            TURN_RIGHT => agent.heading -= TURN,
            THRUST => return advance(agent.position, agent.heading, STRIDE),
            _ => {}
        }
        agent.position
    }

    fn shaping(&mut self, index: usize, agent: &mut Agent, _state: &WorldState) -> f32 {
        let cell = agent.cell();
        self.fleet.insert(cell);
        match self.visited.get_mut(index).map(|seen| seen.insert(cell)) {
            Some(true) => EXPLORE_BONUS,
            _ => 0.0,
        }
    }

    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>) {
        let agent = &state.agents[index];
        let goal = state.goal_cell(self.goal_index(index, agent.position, state));
        base_features(agent.position, goal, out);
        let (charge, altitude) = match agent.resource {
            Resource::Battery { charge, altitude } => (charge, altitude),
            _ => (0.0, 0.0),
        };
        out.extend_from_slice(&[charge, altitude, agent.heading]);
        lidar(state, agent.position, out);
        neighbour_offsets(state, index, out);
        let cell = agent.cell();
        let shared = self
            .visited
            .iter()
            .enumerate()
            .any(|(j, seen)| j != index && seen.contains(&cell));
        out.push(if shared { 1.0 } else { 0.0 });
        let cells = (state.level.grid_size as f32).powi(2);
        out.push(self.fleet.len() as f32 / cells);
    }

    fn heuristic(&self, index: usize, state: &WorldState) -> ActionId {
        let agent = &state.agents[index];
        let Some(goal) = state.goal_cell(self.goal_index(index, agent.position, state)) else {
            return HOVER;
        };
        match steer(agent.heading, agent.position, goal_centre(goal), TURN / 2.0) {
            Steer::Left => TURN_LEFT,
            Steer::Right => TURN_RIGHT,
            Steer::Ahead => {
                let next = advance(agent.position, agent.heading, STRIDE)
                    .clamp_to_grid(state.level.grid_size);
                if state.obstacles.is_blocked(next.cell()) {
                    TURN_LEFT
                } else {
                    THRUST
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EnvKind;
    use crate::Environment;

    #[test]
    fn exploring_new_cells_pays_a_bonus() {
        let mut env = EnvKind::SwarmDrones
            .build(EnvKind::SwarmDrones.default_level(), 0)
            .unwrap();
        // two half-cell thrusts: the second lands in a new cell
        let first = env.step(&[THRUST; 4]);
        let second = env.step(&[THRUST; 4]);
        assert!((first.rewards[0] + 0.01).abs() < 1e-6);
        assert!((second.rewards[0] - 0.09).abs() < 1e-6);
    }

    #[test]
    fn hover_drains_half() {
        let mut env = EnvKind::SwarmDrones
            .build(EnvKind::SwarmDrones.default_level(), 0)
            .unwrap();
        env.step(&[HOVER, THRUST, TURN_LEFT, TURN_RIGHT]);
        let charges: Vec<f32> = env
            .agents()
            .iter()
            .map(|a| a.resource.primary().unwrap())
            .collect();
        assert!((charges[0] - 0.995).abs() < 1e-6);
        assert!((charges[1] - 0.99).abs() < 1e-6);
        assert!((env.agents()[2].heading - TURN).abs() < 1e-6);
        assert!((env.agents()[3].heading + TURN).abs() < 1e-6);
    }

    #[test]
    fn heuristic_reaches_shared_goal() {
        let mut env = EnvKind::SwarmDrones
            .build(EnvKind::SwarmDrones.default_level(), 0)
            .unwrap();
        while !env.episode().all_done() {
            let actions = env.heuristic_actions();
            env.step(&actions);
        }
        let goals = env
            .episode()
            .last_rewards
            .iter()
            .zip(env.agents())
            .filter(|(_, a)| a.cell() == Cell::new(24, 24))
            .count();
        assert!(goals >= 1);
    }
}
