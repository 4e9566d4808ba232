//! Performance benchmarks for the quadsim engine.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench simulation_bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use quadsim::components::{Clock, Combinational, InputSwitch, Probe};
use quadsim::{
    ComponentId, LogicValue, ManualClock, PinRef, SimConfigBuilder, SimEvent, Simulation, Timeline,
};

// ============================================================================
// Circuit Builders
// ============================================================================

fn paused_sim() -> Simulation {
    let config = SimConfigBuilder::new()
        .start_paused(true)
        .max_visits_per_pass(u32::MAX)
        .build()
        .expect("valid config");
    Simulation::from_config(Arc::new(ManualClock::new()), &config)
}

/// A switch feeding `length` inverters in series, each with `delay`.
fn inverter_chain(length: usize, delay: u64) -> (Simulation, ComponentId) {
    let mut sim = paused_sim();
    let source = sim.add_component("src", Box::new(InputSwitch::new(LogicValue::Low)));
    let mut prev = source;
    for i in 0..length {
        let not = sim.add_component(format!("n{i}"), Box::new(Combinational::not().with_delay(delay)));
        sim.connect(PinRef::output(prev, 0), PinRef::input(not, 0))
            .expect("connect");
        prev = not;
    }
    sim.run_until(length as u64 * delay).expect("paused");
    (sim, source)
}

// ============================================================================
// Propagation Benchmarks
// ============================================================================

fn bench_zero_delay_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("zero_delay_chain");

    for length in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*length as u64));
        group.bench_with_input(BenchmarkId::new("inverters", length), length, |b, &length| {
            let (mut sim, source) = inverter_chain(length, 0);
            let mut level = LogicValue::Low;
            b.iter(|| {
                level = quadsim::invert(level);
                black_box(sim.set_input(source, level).expect("switch"));
            });
        });
    }

    group.finish();
}

fn bench_delayed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("delayed_chain");

    for length in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*length as u64));
        group.bench_with_input(BenchmarkId::new("inverters", length), length, |b, &length| {
            b.iter_batched(
                || inverter_chain(length, 3),
                |(mut sim, source)| {
                    sim.set_input(source, LogicValue::High).expect("switch");
                    let target = sim.now() + length as u64 * 3;
                    black_box(sim.run_until(target).expect("paused"));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Clock Benchmarks
// ============================================================================

fn bench_clock_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_fanout");

    for probes in [1, 10, 100].iter() {
        group.throughput(Throughput::Elements(*probes as u64));
        group.bench_with_input(BenchmarkId::new("probes", probes), probes, |b, &probes| {
            b.iter_batched(
                || {
                    let mut sim = paused_sim();
                    let clk = sim.add_component("clk", Box::new(Clock::new(10)));
                    for i in 0..probes {
                        let p = sim.add_component(format!("p{i}"), Box::new(Probe::new()));
                        sim.connect(PinRef::output(clk, 0), PinRef::input(p, 0))
                            .expect("connect");
                    }
                    sim
                },
                |mut sim| {
                    // 200 edges
                    black_box(sim.run_until(1_000).expect("paused"));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Timeline Benchmarks
// ============================================================================

fn bench_timeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline");

    for num_events in [1000, 10000, 100000].iter() {
        group.throughput(Throughput::Elements(*num_events as u64));

        group.bench_with_input(
            BenchmarkId::new("schedule", num_events),
            num_events,
            |b, &num_events| {
                b.iter(|| {
                    let mut timeline = Timeline::new(Arc::new(ManualClock::new()));
                    for i in 0..num_events as u64 {
                        let event = SimEvent::MarkDirty { component: i % 64 };
                        timeline.schedule_at((i * 7919) % 10_000, event, "bench", false);
                    }
                    black_box(timeline.pending_count());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("drain", num_events),
            num_events,
            |b, &num_events| {
                b.iter_batched(
                    || {
                        let mut timeline = Timeline::new(Arc::new(ManualClock::new()));
                        timeline.pause();
                        for i in 0..num_events as u64 {
                            let event = SimEvent::MarkDirty { component: i % 64 };
                            timeline.schedule_at((i * 7919) % 10_000, event, "bench", false);
                        }
                        timeline
                    },
                    |mut timeline| {
                        while let Ok(Some(batch)) = timeline.step() {
                            black_box(batch.events.len());
                            timeline.finish_batch();
                        }
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_zero_delay_chain,
    bench_delayed_chain,
    bench_clock_fanout,
    bench_timeline,
);

criterion_main!(benches);
