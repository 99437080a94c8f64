use warren_core::{ActionId, Position};

use super::compass_move;
use crate::agent::{Agent, Resource};
use crate::heuristic::greedy_compass;
use crate::kind::EnvKind;
use crate::obs::base_features;
use crate::world::{Rules, WorldState};

/// Configurable grid world: compass moves of one cell, unlimited
/// resources, and pickups any agent may collect.
///
/// An agent finishes on whichever uncollected pickup it reaches first;
/// that pickup is then gone for everyone else.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridWorld;

impl Rules for GridWorld {
    const KIND: EnvKind = EnvKind::GridWorld;
    const ACTION_COUNT: usize = 4;
    const OBSERVATION_LEN: usize = 5;
    const DEFAULT_MAX_STEPS: u32 = 100;
    const IDLE: ActionId = ActionId::NOOP;

    fn initial_resource(&self) -> Resource {
        Resource::Unlimited
    }

    fn consumes_pickups(&self) -> bool {
        true
    }

    /// Nearest uncollected pickup, lowest index on ties.
    fn goal_index(&self, _index: usize, position: Position, state: &WorldState) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (g, p) in state.pickups.iter().enumerate() {
            if p.collected {
                continue;
            }
            let d = position.distance(p.cell.to_position());
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((g, d));
            }
        }
        best.map(|(g, _)| g)
    }

    fn drain(&mut self, _index: usize, _agent: &mut Agent, _action: ActionId) {}

    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position {
        compass_move(agent, action, 1.0)
    }

    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>) {
        let pos = state.agents[index].position;
        let goal = state.goal_cell(self.goal_index(index, pos, state));
        base_features(pos, goal, out);
    }

    fn heuristic(&self, index: usize, state: &WorldState) -> ActionId {
        let pos = state.agents[index].position;
        match state.goal_cell(self.goal_index(index, pos, state)) {
            Some(goal) => greedy_compass(state, pos, goal, 1.0),
            None => ActionId::UP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use crate::Environment;
    use warren_core::{Cell, LevelConfig};

    fn two_pickups() -> LevelConfig {
        LevelConfig::new(10)
            .with_start(Cell::new(0, 0))
            .with_start(Cell::new(9, 9))
            .with_goal(Cell::new(1, 0))
            .with_goal(Cell::new(8, 9))
    }

    #[test]
    fn each_agent_takes_nearest_pickup() {
        let mut env = World::new(GridWorld, two_pickups(), 0).unwrap();
        let out = env.step(&[ActionId::RIGHT, ActionId::LEFT]);
        assert_eq!(out.rewards, vec![1.0, 1.0]);
        assert!(env.frame().pickups.iter().all(|p| p.collected));
    }

    #[test]
    fn collected_pickup_is_not_a_goal_twice() {
        let level = LevelConfig::new(10)
            .with_start(Cell::new(0, 0))
            .with_start(Cell::new(2, 0))
            .with_goal(Cell::new(1, 0))
            .with_goal(Cell::new(9, 9));
        let mut env = World::new(GridWorld, level, 0).unwrap();
        env.step(&[ActionId::RIGHT, ActionId::DOWN]);
        // agent 1 now heads for the remaining pickup
        let obs = env.observe(1);
        assert_eq!(&obs[2..4], &[9.0, 9.0]);
        let out = env.step(&[ActionId::RIGHT, ActionId::LEFT, ActionId::LEFT]);
        assert_eq!(out.rewards[0], 0.0);
        assert!((out.rewards[1] + 0.01).abs() < 1e-6);
    }

    #[test]
    fn observation_layout() {
        let env = World::new(GridWorld, two_pickups(), 0).unwrap();
        assert_eq!(env.observe(0), vec![0.0, 0.0, 1.0, 0.0, 1.0]);
    }
}
