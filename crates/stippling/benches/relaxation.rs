mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stippling::geometry::Tessellation;
use stippling::stipple::config::StippleConfig;
use stippling::stipple::relax::{relax, Thresholds};
use stippling::stipple::runner::StippleEngine;

const RADII: [f64; 4] = [8.0, 4.0, 2.0, 1.0];

fn tessellation_benches(c: &mut Criterion) {
    let field = common::radial_field(256);
    let mut group = c.benchmark_group("relaxation/tessellation");

    for &radius in &RADII {
        let engine = StippleEngine::new(StippleConfig::new().with_initial_stipple_radius(radius));
        let mut rng = StdRng::seed_from_u64(0x5EED ^ radius.to_bits());
        let sites: Vec<DVec2> = engine
            .initial_population(&field, &mut rng)
            .iter()
            .map(|s| s.position)
            .collect();
        group.throughput(common::elements_throughput(sites.len()));

        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, _| {
            b.iter(|| {
                let tess = Tessellation::new(&sites, field.bounds());
                let cells = (0..tess.len())
                    .filter(|&i| tess.cell_polygon(i).is_some())
                    .count();
                black_box(cells);
            });
        });
    }

    group.finish();
}

fn relax_step_benches(c: &mut Criterion) {
    let field = common::radial_field(256);
    let mut group = c.benchmark_group("relaxation/step");

    for &radius in &RADII {
        let config = StippleConfig::new().with_initial_stipple_radius(radius);
        let engine = StippleEngine::new(config.clone());
        let mut rng = StdRng::seed_from_u64(0xC0FFEE ^ radius.to_bits());
        let stipples = engine.initial_population(&field, &mut rng);
        let thresholds = Thresholds::new(config.target_area(), 0.0);
        group.throughput(common::elements_throughput(stipples.len()));

        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, _| {
            b.iter(|| {
                let generation = relax(&stipples, &field, thresholds, &mut rng);
                black_box(generation.stipples.len());
            });
        });
    }

    group.finish();
}

fn full_run_benches(c: &mut Criterion) {
    let field = common::radial_field(128);
    let mut group = c.benchmark_group("relaxation/run");

    for &radius in &RADII[..3] {
        let engine = StippleEngine::new(
            StippleConfig::new()
                .with_initial_stipple_radius(radius)
                .with_convergence_rate(0.05)
                .with_max_iterations(50),
        );

        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, _| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                let result = engine.run(&field, &mut rng);
                black_box(result.stipples.len());
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = tessellation_benches, relax_step_benches, full_run_benches
}
criterion_main!(benches);
