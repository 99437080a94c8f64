use warren_core::{ActionId, Position};

use super::compass_move;
use crate::agent::{Agent, Resource};
use crate::heuristic::greedy_compass;
use crate::kind::EnvKind;
use crate::obs::base_features;
use crate::world::{Rules, WorldState};

/// Energy spent per tick.
pub const ENERGY_COST: f32 = 0.002;

/// A bunny hopping towards its goal on a slowly draining energy
/// budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct BunnyGarden;

impl Rules for BunnyGarden {
    const KIND: EnvKind = EnvKind::BunnyGarden;
    const ACTION_COUNT: usize = 4;
    const OBSERVATION_LEN: usize = 6;
    const DEFAULT_MAX_STEPS: u32 = 500;
    const IDLE: ActionId = ActionId::NOOP;

    fn initial_resource(&self) -> Resource {
        Resource::Energy { level: 1.0 }
    }

    fn drain(&mut self, _index: usize, agent: &mut Agent, _action: ActionId) {
        if let Resource::Energy { level } = &mut agent.resource {
            *level = (*level - ENERGY_COST).max(0.0);
        }
    }

    fn propose(&self, agent: &mut Agent, action: ActionId) -> Position {
        compass_move(agent, action, 1.0)
    }

    fn observe(&self, index: usize, state: &WorldState, out: &mut Vec<f32>) {
        let agent = &state.agents[index];
        let goal = state.goal_cell(self.goal_index(index, agent.position, state));
        base_features(agent.position, goal, out);
        out.push(agent.resource.primary().unwrap_or(0.0));
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

    #[test]
    fn energy_drains_each_tick() {
        let level = LevelConfig::new(25)
            .with_start(Cell::new(1, 1))
            .with_goal(Cell::new(23, 23));
        let mut env = World::new(BunnyGarden, level, 0).unwrap();
        env.step(&[ActionId::RIGHT]);
        env.step(&[ActionId::DOWN]);
        let obs = env.observe(0);
        assert_eq!(obs.len(), 6);
        assert!((obs[5] - (1.0 - 2.0 * ENERGY_COST)).abs() < 1e-6);
        assert_eq!(env.agents()[0].cell(), Cell::new(2, 2));
    }

    #[test]
    fn exhausted_energy_ends_the_episode() {
        let level = LevelConfig::new(25)
            .with_start(Cell::new(1, 1))
            .with_goal(Cell::new(23, 23))
            .with_time_limit(10_000);
        let mut env = World::new(BunnyGarden, level, 0).unwrap();
        let mut ticks = 0;
        while !env.episode().all_done() {
            let a = if ticks % 2 == 0 {
                ActionId::UP
            } else {
                ActionId::DOWN
            };
            env.step(&[a]);
            ticks += 1;
        }
        assert!((499..=501).contains(&ticks));
        assert!((env.episode().last_rewards[0] + 0.01).abs() < 1e-6);
    }
}
