//! End-to-end episodes on hand-built levels.

use warren_core::{ActionId, Cell, LevelConfig, MovingObstacle, Position};
use warren_env::{EnvKind, Environment};
use warren_test_utils::fixtures::{corridor_level, open_level};

fn gridworld(level: LevelConfig) -> Box<dyn Environment> {
    EnvKind::GridWorld.build(level, 0).unwrap()
}

#[test]
fn corridor_reaches_goal_on_thirtieth_tick() {
    let mut env = gridworld(corridor_level());
    let plan = std::iter::repeat_n(ActionId::RIGHT, 15).chain(std::iter::repeat_n(ActionId::DOWN, 15));

    for (tick, action) in plan.enumerate() {
        let out = env.step(&[action]);
        if tick < 29 {
            assert_eq!(out.rewards, vec![-0.01], "tick {}", tick + 1);
            assert!(!out.dones[0]);
        } else {
            assert_eq!(out.rewards, vec![1.0]);
            assert!(out.dones[0]);
        }
    }

    assert_eq!(env.agents()[0].cell(), Cell::new(20, 20));
    assert_eq!(env.episode().tick.0, 30);
    let ret = env.episode().returns[0];
    assert!((ret - 0.71).abs() < 1e-4, "return {ret}");
}

#[test]
fn reset_restores_starting_state() {
    let mut env = gridworld(corridor_level());
    env.step(&[ActionId::RIGHT]);
    env.step(&[ActionId::RIGHT]);
    let agents = env.reset();

    assert_eq!(agents[0].position, Position::new(5.0, 5.0));
    assert_eq!(env.episode().tick.0, 0);
    assert_eq!(env.episode().dones, vec![false]);
    assert_eq!(env.episode().returns, vec![0.0]);
}

#[test]
fn static_obstacle_ends_episode_in_place() {
    let level = LevelConfig::new(25)
        .with_start(Cell::new(9, 10))
        .with_goal(Cell::new(20, 20))
        .with_obstacle(Cell::new(10, 10));
    let mut env = gridworld(level);

    let out = env.step(&[ActionId::RIGHT]);
    assert_eq!(out.rewards, vec![-1.0]);
    assert_eq!(out.dones, vec![true]);
    assert_eq!(out.agents[0].position, Position::new(9.0, 10.0));
    assert_eq!(out.agents[0].velocity, [0.0, 0.0]);
}

#[test]
fn moving_obstacle_collides() {
    // A degenerate patrol parks the obstacle at (5,7).
    let parked = MovingObstacle::patrol("car_1", Cell::new(5, 7), Cell::new(5, 7), 1.0, 0.0);
    let mut env = gridworld(corridor_level().with_moving(parked));

    assert_eq!(env.step(&[ActionId::DOWN]).rewards, vec![-0.01]);
    let out = env.step(&[ActionId::DOWN]);
    assert_eq!(out.rewards, vec![-1.0]);
    assert!(out.dones[0]);
    assert_eq!(out.agents[0].cell(), Cell::new(5, 6));
}

#[test]
fn moves_off_the_grid_are_clamped() {
    let mut env = gridworld(open_level(5));
    let out = env.step(&[ActionId::LEFT]);
    assert_eq!(out.agents[0].position, Position::new(0.0, 0.0));
    assert_eq!(out.rewards, vec![-0.01]);
    assert!(!out.dones[0]);
}

#[test]
fn time_limit_truncates_without_bonus() {
    let mut env = gridworld(open_level(5).with_time_limit(3));
    for _ in 0..3 {
        let out = env.step(&[]);
        assert_eq!(out.rewards, vec![-0.01]);
    }
    assert!(env.episode().all_done());
    assert!((env.episode().returns[0] + 0.03).abs() < 1e-6);

    let after = env.step(&[ActionId::RIGHT]);
    assert_eq!(after.rewards, vec![0.0]);
    assert_eq!(env.episode().tick.0, 3);
}

#[test]
fn done_agents_ignore_actions() {
    let level = LevelConfig::new(5)
        .with_start(Cell::new(0, 0))
        .with_start(Cell::new(0, 4))
        .with_goal(Cell::new(1, 0));
    let mut env = gridworld(level);

    let out = env.step(&[ActionId::RIGHT, ActionId::RIGHT]);
    assert_eq!(out.rewards, vec![1.0, -0.01]);
    assert_eq!(out.dones, vec![true, false]);
    assert!(env.frame().pickups[0].collected);

    let out = env.step(&[ActionId::DOWN, ActionId::RIGHT]);
    assert_eq!(out.rewards, vec![0.0, -0.01]);
    assert_eq!(out.agents[0].cell(), Cell::new(1, 0));
    assert!(out.dones[0]);
}

#[test]
fn out_of_range_action_idles() {
    let mut env = gridworld(corridor_level());
    let out = env.step(&[ActionId(17)]);
    assert_eq!(out.agents[0].position, Position::new(5.0, 5.0));
    assert_eq!(out.rewards, vec![-0.01]);
}

#[test]
fn frame_serialises_for_renderers() {
    let mut env = EnvKind::SnowplowFleet
        .build(EnvKind::SnowplowFleet.default_level(), 0)
        .unwrap();
    let actions = env.heuristic_actions();
    env.step(&actions);
    let json = serde_json::to_value(env.frame()).unwrap();
    assert_eq!(json["kind"], "snowplow-fleet");
    assert_eq!(json["tick"], 1);
    assert_eq!(json["tiles"]["movingObstacles"][0]["id"], "car_1");
}

#[test]
fn heuristic_solves_every_default_level_without_panicking() {
    for kind in EnvKind::ALL {
        let mut env = kind.build(kind.default_level(), 3).unwrap();
        let mut ticks = 0;
        while !env.episode().all_done() {
            let actions = env.heuristic_actions();
            assert_eq!(actions.len(), env.agents().len());
            env.step(&actions);
            ticks += 1;
        }
        assert!(ticks <= env.max_steps(), "{kind} ran {ticks} ticks");
    }
}

#[test]
fn gridworld_heuristic_reaches_goal() {
    let mut env = gridworld(corridor_level());
    while !env.episode().all_done() {
        let actions = env.heuristic_actions();
        env.step(&actions);
    }
    assert_eq!(env.episode().last_rewards, vec![1.0]);
    assert_eq!(env.agents()[0].cell(), Cell::new(20, 20));
}
