//! Greedy steering used by the built-in fallback policies.

use std::f32::consts::{PI, TAU};

use smallvec::SmallVec;
use warren_core::{ActionId, Cell, Position};

use crate::obs::goal_centre;
use crate::world::WorldState;

/// Unit displacement for each compass action.
pub fn compass_delta(action: ActionId) -> (f32, f32) {
    match action {
        ActionId::UP => (0.0, -1.0),
        ActionId::DOWN => (0.0, 1.0),
        ActionId::LEFT => (-1.0, 0.0),
        ActionId::RIGHT => (1.0, 0.0),
        _ => (0.0, 0.0),
    }
}

/// The compass move of length `stride` that ends closest to `goal`
/// without entering a blocked cell. Ties go to the lowest action id;
/// if every move is blocked the result is [`ActionId::UP`].
pub fn greedy_compass(state: &WorldState, pos: Position, goal: Cell, stride: f32) -> ActionId {
    let size = state.level.grid_size;
    let target = if stride >= 1.0 {
        goal.to_position()
    } else {
        goal_centre(goal)
    };
    let candidates: SmallVec<[(ActionId, f32); 4]> = [
        ActionId::UP,
        ActionId::DOWN,
        ActionId::LEFT,
        ActionId::RIGHT,
    ]
    .into_iter()
    .filter_map(|a| {
        let (dx, dy) = compass_delta(a);
        let next = Position::new(pos.x + dx * stride, pos.y + dy * stride).clamp_to_grid(size);
        (!state.obstacles.is_blocked(next.cell())).then(|| (a, next.distance(target)))
    })
    .collect();

    let mut best: Option<(ActionId, f32)> = None;
    for (a, d) in candidates {
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((a, d));
        }
    }
    best.map_or(ActionId::UP, |(a, _)| a)
}

/// Which way to rotate to face a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    /// Increase heading.
    Left,
    /// Decrease heading.
    Right,
    /// Within tolerance.
    Ahead,
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(a: f32) -> f32 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI {
        w + TAU
    } else {
        w
    }
}

/// Steering decision for an agent at `from` with `heading` aiming at
/// `to`, accepting `tolerance` radians of error.
pub fn steer(heading: f32, from: Position, to: Position, tolerance: f32) -> Steer {
    let desired = (to.y - from.y).atan2(to.x - from.x);
    let diff = wrap_angle(desired - heading);
    if diff.abs() <= tolerance {
        Steer::Ahead
    } else if diff > 0.0 {
        Steer::Left
    } else {
        Steer::Right
    }
}

/// Position after moving `stride` along `heading`.
pub fn advance(pos: Position, heading: f32, stride: f32) -> Position {
    let (sin, cos) = heading.sin_cos();
    Position::new(pos.x + cos * stride, pos.y + sin * stride)
}
