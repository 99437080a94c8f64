use std::f32::consts::FRAC_PI_2;

use warren_core::{ActionId, Position};

use crate::agent::{Agent, Resource};
use crate::kind::EnvKind;
use crate::obs::{base_features, occupancy_patch};
use crate::world::{Rules, WorldState};

/// Drive `STRIDE` cells along the heading.
pub const FORWARD: ActionId = ActionId(0);
/// Quarter turn, increasing heading.
pub const TURN_LEFT: ActionId = ActionId(1);
/// Quarter turn, decreasing heading.
pub const TURN_RIGHT: ActionId = ActionId(2);
/// Hold position.
pub const DOCK: ActionId = ActionId(3);
/// Hold position and recharge.
pub const CHARGE: ActionId = ActionId(4);

const STRIDE: f32 = 0.5;
const DRAIN: f32 = 0.01;
const CHARGE_RATE: f32 = 0.05;
const LOW_BATTERY: f32 = 0.15;

/// Grid-aligned quadrant `0..4` of a heading; `0` is `+x`, `1` is `+y`.
fn quadrant(heading: f32) -> i32 {
    ((heading / FRAC_PI_2).round() as i32).rem_euclid(4)
}

fn quadrant_delta(q: i32) -> (f32, f32) {
    match q {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    }
}

/// Warehouse robots carrying a parcel each to their assigned dock.
///
/// Robots drive on grid-aligned headings, so every dock stays
/// reachable by turning and driving forward.
#[derive(Clone, Debug, Default)]
pub struct WarehouseBots {
    docked: Vec<bool>,
}

impl WarehouseBots {
    fn ahead(state: &WorldState, pos: Position, q: i32) -> Position {
        let (dx, dy) = quadrant_delta(q);
        Position::new(pos.x + dx * STRIDE, pos.y + dy * STRIDE)
            .clamp_to_grid(state.level.grid_size)
    }
}

impl Rules for WarehouseBots {
    const KIND: EnvKind = EnvKind::WarehouseBots;
    const ACTION_COUNT: usize = 5;
    const OBSERVATION_LEN: usize = 34;
    const DEFAULT_MAX_STEPS: u32 = 500;
    const IDLE: ActionId = DOCK;

    fn initial_resource(&self) -> Resource {
        Resource::Cargo {
            battery: 1.0,
            carried: 1.0,
            capacity: 1.0,
        }
    }

    fn reset(&mut self, state: &WorldState) {
        self.docked = vec![false; state.agents.len()];
    }

    fn drain(&mut self, index: usize, agent: &mut Agent, action: ActionId) {
        if let Resource::Cargo { battery, .. } = &mut agent.resource {
            let gain = if action == CHARGE { CHARGE_RATE } else { 0.0 };
            *battery = (*battery - DRAIN + gain).clamp(0.0, 1.0);
        }
        if let Some(d) = self.docked.get_mut(index) {
            *d = action == DOCK || action == CHARGE;
        }
    }

    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position {
        let q = quadrant(agent.heading);
        match action {
            FORWARD => {
                let (dx, dy) = quadrant_delta(q);
                return Position::new(
                    agent.position.x + dx * STRIDE,
                    agent.position.y + dy * STRIDE,
                );
            }
            TURN_LEFT => agent.heading = ((q + 1) % 4) as f32 * FRAC_PI_2,
            TURN_RIGHT => agent.heading = ((q + 3) % 4) as f32 * FRAC_PI_2,
            _ => {}
        }
        agent.position
    }

    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>) {
        let agent = &state.agents[index];
        let goal = state.goal_cell(self.goal_index(index, agent.position, state));
        base_features(agent.position, goal, out);
        let (battery, carried, capacity) = match agent.resource {
            Resource::Cargo {
                battery,
                carried,
                capacity,
            } => (battery, carried, capacity),
            _ => (0.0, 0.0, 1.0),
        };
        let carrying = if carried > 0.0 { 1.0 } else { 0.0 };
        out.extend_from_slice(&[battery, carrying, carried / capacity.max(f32::EPSILON)]);
        occupancy_patch(state, index, 2, out);
        let docked = self.docked.get(index).copied().unwrap_or(false);
        out.push(if docked { 1.0 } else { 0.0 });
    }

    /// Recharge when low, otherwise turn onto the axis with the larger
    /// remaining distance and drive; a blocked primary axis falls back
    /// to the other one.
    fn heuristic(&self, index: usize, state: &WorldState) -> ActionId {
        let agent = &state.agents[index];
        if agent.resource.primary().is_some_and(|b| b < LOW_BATTERY) {
            return CHARGE;
        }
        let Some(goal) = state.goal_cell(self.goal_index(index, agent.position, state)) else {
            return DOCK;
        };
        let here = agent.cell();
        let dx = goal.x - here.x;
        let dy = goal.y - here.y;
        let horizontal = if dx >= 0 { 0 } else { 2 };
        let vertical = if dy >= 0 { 1 } else { 3 };
        let axes = if dx.abs() >= dy.abs() {
            [(horizontal, dx), (vertical, dy)]
        } else {
            [(vertical, dy), (horizontal, dx)]
        };
        let desired = axes
            .into_iter()
            .filter(|&(_, d)| d != 0)
            .map(|(q, _)| q)
            .find(|&q| !state.obstacles.is_blocked(Self::ahead(state, agent.position, q).cell()));
        let Some(desired) = desired else {
            return TURN_LEFT;
        };
        match (desired - quadrant(agent.heading)).rem_euclid(4) {
            0 => FORWARD,
            3 => TURN_RIGHT,
            _ => TURN_LEFT,
        }
    }
}
