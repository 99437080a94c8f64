//! Criterion micro-benchmarks for environment stepping and observation.

use criterion::{criterion_group, criterion_main, Criterion};
use warren_core::{Difficulty, GridWorldConfig};
use warren_env::{observe_all, EnvKind, Environment};

/// Step every variant's default level with heuristic actions,
/// resetting whenever the episode ends.
fn bench_heuristic_step(c: &mut Criterion) {
    for kind in EnvKind::ALL {
        let mut env = kind.build(kind.default_level(), 42).unwrap();
        c.bench_function(&format!("step_{}", kind.name()), |b| {
            b.iter(|| {
                if env.episode().all_done() {
                    env.reset();
                }
                let actions = env.heuristic_actions();
                let out = env.step(&actions);
                std::hint::black_box(&out);
            });
        });
    }
}

/// Benchmark: observations for a crowded hard generated grid world.
fn bench_observe_generated(c: &mut Criterion) {
    let config = GridWorldConfig {
        grid_size: 40,
        agent_count: 16,
        pickup_count: 16,
        difficulty: Difficulty::Hard,
        seed: 42,
        ..GridWorldConfig::default()
    };
    let level = config.to_level().unwrap();
    let env = EnvKind::GridWorld.build(level, 42).unwrap();

    c.bench_function("observe_gridworld_16_agents", |b| {
        b.iter(|| {
            let obs = observe_all(env.as_ref());
            std::hint::black_box(&obs);
        });
    });
}

/// Benchmark: deep-copied frame snapshot of the snowplow level.
fn bench_frame_snapshot(c: &mut Criterion) {
    let mut env = EnvKind::SnowplowFleet
        .build(EnvKind::SnowplowFleet.default_level(), 42)
        .unwrap();
    for _ in 0..20 {
        let actions = env.heuristic_actions();
        env.step(&actions);
    }

    c.bench_function("frame_snowplow", |b| {
        b.iter(|| {
            let frame = env.frame();
            std::hint::black_box(&frame);
        });
    });
}

criterion_group!(
    benches,
    bench_heuristic_step,
    bench_observe_generated,
    bench_frame_snapshot
);
criterion_main!(benches);
