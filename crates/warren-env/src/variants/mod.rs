//! The six environment variants, one [`Rules`](crate::Rules) type each.

mod bunny_garden;
mod grid_world;
mod reef_guardians;
mod snowplow_fleet;
mod swarm_drones;
mod warehouse_bots;

pub use bunny_garden::BunnyGarden;
pub use grid_world::GridWorld;
pub use reef_guardians::ReefGuardians;
pub use snowplow_fleet::SnowplowFleet;
pub use swarm_drones::SwarmDrones;
pub use warehouse_bots::WarehouseBots;

use warren_core::{ActionId, Position};

use crate::agent::Agent;
use crate::heuristic::compass_delta;

/// Compass move of `stride` cells, pointing the heading hint along the
/// move.
fn compass_move(agent: &mut Agent, action: ActionId, stride: f32) -> Position {
    let (dx, dy) = compass_delta(action);
    if dx != 0.0 || dy != 0.0 {
        agent.heading = dy.atan2(dx);
    }
    Position::new(
        agent.position.x + dx * stride,
        agent.position.y + dy * stride,
    )
}
