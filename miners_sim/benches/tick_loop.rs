// Tick-loop throughput on the default 50x50 cave.

use criterion::{Criterion, criterion_group, criterion_main};
use miners_sim::config::{CampData, SimConfig};
use miners_sim::sim::SimState;
use std::hint::black_box;

fn busy_config() -> SimConfig {
    SimConfig {
        camp: CampData {
            spawn_interval: 0.2,
            max_alive_miners: 20,
        },
        ..SimConfig::default()
    }
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_default_cave", |b| {
        b.iter(|| {
            let sim = SimState::new(black_box(42));
            black_box(sim)
        });
    });
}

fn bench_step(c: &mut Criterion) {
    // Warm the world up so the camp is at its cap before measuring.
    let config = busy_config();
    let mut sim = SimState::with_config(42, config).expect("busy config");
    sim.run(300, 0.1);
    c.bench_function("step_populated_cave", |b| {
        b.iter(|| {
            let result = sim.step(&[], black_box(0.1));
            black_box(result)
        });
    });
}

fn bench_run(c: &mut Criterion) {
    c.bench_function("run_1000_ticks", |b| {
        b.iter(|| {
            let config = busy_config();
            let mut sim = SimState::with_config(7, config).expect("busy config");
            black_box(sim.run(1000, 0.1).len())
        });
    });
}

criterion_group!(benches, bench_generate, bench_step, bench_run);
criterion_main!(benches);
