//! Reusable levels and policy networks.
//!
//! - [`corridor_level`]: the 25×25 reference layout with one start,
//!   one goal and a single obstacle.
//! - [`open_level`]: an obstacle-free square for movement tests.
//! - [`fixed_action_network`]: a `WDN1` network that always picks the
//!   same action.

use warren_core::{Cell, LevelConfig, MovingObstacle};
use warren_policy::dense::Activation;
use warren_policy::{DenseLayer, DenseNetwork};

/// 25×25, start (5,5), goal (20,20), static obstacle (10,10).
pub fn corridor_level() -> LevelConfig {
    LevelConfig::new(25)
        .with_start(Cell::new(5, 5))
        .with_goal(Cell::new(20, 20))
        .with_obstacle(Cell::new(10, 10))
}

/// `size`×`size` with a start in one corner and a goal in the other.
pub fn open_level(size: u32) -> LevelConfig {
    let far = size as i32 - 1;
    LevelConfig::new(size)
        .with_start(Cell::new(0, 0))
        .with_goal(Cell::new(far, far))
}

/// [`corridor_level`] plus a car patrolling row 8 at half speed.
pub fn patrolled_corridor() -> LevelConfig {
    corridor_level().with_moving(MovingObstacle::patrol(
        "car_1",
        Cell::new(2, 8),
        Cell::new(22, 8),
        0.5,
        0.0,
    ))
}

/// A single linear layer that ignores its input and scores `action`
/// highest out of `action_count`.
pub fn fixed_action_network(features: usize, action_count: usize, action: usize) -> DenseNetwork {
    let mut biases = vec![0.0; action_count];
    biases[action] = 1.0;
    DenseNetwork::new(vec![DenseLayer {
        inputs: features,
        outputs: action_count,
        activation: Activation::Linear,
        weights: vec![0.0; features * action_count],
        biases,
    }])
}

/// Two-layer network scoring action `i` by feature `i`, through a ReLU
/// hidden layer of the same width.
pub fn echo_network(width: usize) -> DenseNetwork {
    let identity: Vec<f32> = (0..width * width)
        .map(|k| if k / width == k % width { 1.0 } else { 0.0 })
        .collect();
    let layer = |activation| DenseLayer {
        inputs: width,
        outputs: width,
        activation,
        weights: identity.clone(),
        biases: vec![0.0; width],
    };
    DenseNetwork::new(vec![layer(Activation::Relu), layer(Activation::Linear)])
}
