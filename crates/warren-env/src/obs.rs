//! Observation building blocks shared by the variants.

use std::f32::consts::FRAC_PI_4;

use warren_core::{Cell, Position};

use crate::world::WorldState;
use crate::Environment;

/// Centre of a goal cell, the point fractional movers steer for.
pub fn goal_centre(goal: Cell) -> Position {
    Position::new(goal.x as f32 + 0.5, goal.y as f32 + 0.5)
}

/// `[x, y, gx, gy, dist]` for an agent at `pos` heading for `goal`.
///
/// Without a goal the agent's own position stands in, giving zero
/// distance.
pub fn base_features(pos: Position, goal: Option<Cell>, out: &mut Vec<f32>) {
    let g = goal.map_or(pos, Cell::to_position);
    out.extend_from_slice(&[pos.x, pos.y, g.x, g.y, pos.distance(g)]);
}

/// Eight ray distances at 45° steps starting along `+x`.
///
/// Each ray reports the first step `r` in `1..=grid/2` that lands on a
/// wall or obstacle, or the grid size when nothing is hit.
pub fn lidar(state: &WorldState, pos: Position, out: &mut Vec<f32>) {
    let size = state.level.grid_size;
    let reach = (size / 2).max(1);
    for k in 0..8 {
        let angle = k as f32 * FRAC_PI_4;
        let (dy, dx) = angle.sin_cos();
        let hit = (1..=reach).find(|&r| {
            let p = Position::new(pos.x + dx * r as f32, pos.y + dy * r as f32);
            state.obstacles.is_wall_or_blocked(p.cell())
        });
        out.push(hit.map_or(size as f32, |r| r as f32));
    }
}

/// Offsets to up to four other agents in index order, zero-padded to
/// eight values.
pub fn neighbour_offsets(state: &WorldState, index: usize, out: &mut Vec<f32>) {
    let me = state.agents[index].position;
    let mut written = 0;
    for (_, other) in state.others(index).take(4) {
        out.push(other.position.x - me.x);
        out.push(other.position.y - me.y);
        written += 2;
    }
    out.extend(std::iter::repeat_n(0.0, 8 - written));
}

/// A `(2r+1)²` patch around agent `index`, column-major by x offset:
/// `1.0` for walls and obstacles, `0.5` for another active agent,
/// `0.0` for free cells.
pub fn occupancy_patch(state: &WorldState, index: usize, radius: i32, out: &mut Vec<f32>) {
    let centre = state.agents[index].cell();
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            let cell = centre.offset(dx, dy);
            let value = if state.obstacles.is_wall_or_blocked(cell) {
                1.0
            } else if state
                .others(index)
                .any(|(j, a)| !state.is_done(j) && a.cell() == cell)
            {
                0.5
            } else {
                0.0
            };
            out.push(value);
        }
    }
}

/// Observations for every agent in stable id order.
pub fn observe_all(env: &dyn Environment) -> Vec<Vec<f32>> {
    (0..env.agents().len()).map(|i| env.observe(i)).collect()
}
