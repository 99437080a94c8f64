//! Invariants that hold for every variant under arbitrary actions.

use proptest::prelude::*;
use warren_core::{ActionId, GridWorldConfig};
use warren_env::{observe_all, EnvKind, Environment, StepOutcome};

fn kind_strategy() -> impl Strategy<Value = EnvKind> {
    proptest::sample::select(EnvKind::ALL.to_vec())
}

fn actions_strategy() -> impl Strategy<Value = Vec<Vec<u32>>> {
    proptest::collection::vec(proptest::collection::vec(0u32..8, 0..8), 0..80)
}

fn rollout(kind: EnvKind, seed: u64, script: &[Vec<u32>]) -> Vec<StepOutcome> {
    let mut env = kind.build(kind.default_level(), seed).unwrap();
    script
        .iter()
        .map(|tick| {
            let actions: Vec<ActionId> = tick.iter().map(|&a| ActionId(a)).collect();
            env.step(&actions)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replay_is_deterministic(kind in kind_strategy(), seed in 0u64..1000, script in actions_strategy()) {
        prop_assert_eq!(rollout(kind, seed, &script), rollout(kind, seed, &script));
    }

    #[test]
    fn done_is_monotonic_and_rewards_finite(kind in kind_strategy(), script in actions_strategy()) {
        let outcomes = rollout(kind, 7, &script);
        for pair in outcomes.windows(2) {
            for (before, after) in pair[0].dones.iter().zip(&pair[1].dones) {
                prop_assert!(!before || *after);
            }
        }
        for out in &outcomes {
            prop_assert!(out.rewards.iter().all(|r| r.is_finite()));
        }
    }

    #[test]
    fn observations_keep_their_length(kind in kind_strategy(), script in actions_strategy()) {
        let mut env = kind.build(kind.default_level(), 1).unwrap();
        for tick in &script {
            let actions: Vec<ActionId> = tick.iter().map(|&a| ActionId(a)).collect();
            env.step(&actions);
            for obs in observe_all(env.as_ref()) {
                prop_assert_eq!(obs.len(), env.observation_len());
                prop_assert!(obs.iter().all(|v| v.is_finite()));
            }
        }
    }

    #[test]
    fn agents_stay_on_the_grid(kind in kind_strategy(), script in actions_strategy()) {
        let mut env = kind.build(kind.default_level(), 2).unwrap();
        let limit = (env.level().grid_size - 1) as f32;
        for tick in &script {
            let actions: Vec<ActionId> = tick.iter().map(|&a| ActionId(a)).collect();
            for agent in env.step(&actions).agents {
                prop_assert!((0.0..=limit).contains(&agent.position.x));
                prop_assert!((0.0..=limit).contains(&agent.position.y));
            }
        }
    }

    #[test]
    fn gridworld_non_terminal_ticks_cost_exactly_the_step_weight(script in actions_strategy()) {
        let mut env = EnvKind::GridWorld.build(EnvKind::GridWorld.default_level(), 0).unwrap();
        let step = env.level().reward_weights().step;
        for tick in &script {
            let actions: Vec<ActionId> = tick.iter().map(|&a| ActionId(a)).collect();
            let was_done = env.episode().dones.clone();
            let out = env.step(&actions);
            for (i, r) in out.rewards.iter().enumerate() {
                if !was_done[i] && !out.dones[i] {
                    prop_assert_eq!(*r, step);
                }
            }
        }
    }

    #[test]
    fn generated_gridworlds_build_and_reset(seed in 0u64..500, agents in 1u32..4) {
        let config = GridWorldConfig { agent_count: agents, seed, ..GridWorldConfig::default() };
        let level = config.to_level().unwrap();
        let mut env = EnvKind::GridWorld.build(level, seed).unwrap();
        let fresh = env.reset();
        prop_assert_eq!(fresh.len(), agents as usize);
        prop_assert_eq!(env.episode().tick.0, 0);
        prop_assert!(env.episode().dones.iter().all(|d| !d));
    }
}
