//! Performance benchmarks for the crowding pipeline.
//!
//! Run with: `cargo bench`
//!
//! Tracks and land-use layers come from the synthetic scenarios, so results
//! are reproducible across runs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crowdtrack::synthetic::SyntheticScenario;
use crowdtrack::{
    chi2_contingency, crowd, mask_track, rasterize, CrowdConfig, CrowdParameters, LocationTable,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_config() -> CrowdConfig {
    CrowdConfig {
        lag: 25.0,
        seed: Some(42),
        ..CrowdConfig::default()
    }
}

// ============================================================================
// Stage Benchmarks
// ============================================================================

/// Benchmark rasterization for different track lengths.
fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    for steps in [50, 200, 1000].iter() {
        let dataset = SyntheticScenario::with_steps(*steps).generate();
        group.bench_with_input(
            BenchmarkId::new("track_steps", steps),
            &dataset.track,
            |b, track| b.iter(|| rasterize(black_box(track), 18.0)),
        );
    }

    group.finish();
}

/// Benchmark location table construction, serial or parallel per feature.
fn bench_location_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("location_table");
    group.sample_size(20);

    let dataset = SyntheticScenario::city_walk().generate();
    for spacing in [6.25, 3.125, 1.5625].iter() {
        group.bench_with_input(
            BenchmarkId::new("spacing", spacing),
            spacing,
            |b, &spacing| {
                b.iter(|| {
                    LocationTable::from_track(black_box(&dataset.track), &dataset.land, 25.0, spacing)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the chi-square test on tables of growing height.
fn bench_chi2(c: &mut Criterion) {
    let mut group = c.benchmark_group("chi2_contingency");

    for rows in [2usize, 8, 32].iter() {
        let table: Vec<[f64; 2]> = (0..*rows)
            .map(|i| [1.0 + i as f64, 2.0 + (i % 3) as f64])
            .collect();
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, t| {
            b.iter(|| chi2_contingency(black_box(t.as_slice())))
        });
    }

    group.finish();
}

/// Benchmark masking for template radii derived from common k values.
fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_track");
    let dataset = SyntheticScenario::with_steps(200).generate();

    for k in [4u32, 10, 40].iter() {
        let params = CrowdParameters::derive(&dataset.track, *k).unwrap();
        let raster = rasterize(&dataset.track, params.m).unwrap();
        group.bench_with_input(BenchmarkId::new("k", k), &raster, |b, raster| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(1);
                mask_track(black_box(raster.points()), params.m, params.r, &mut rng)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pipeline Benchmarks
// ============================================================================

/// Benchmark the full pipeline on the preset scenarios.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("crowd");
    group.sample_size(10); // Extension rescoring dominates

    let scenarios = [
        ("city_walk", SyntheticScenario::city_walk()),
        ("winding_ride", SyntheticScenario::winding_ride()),
    ];
    for (name, scenario) in scenarios.iter() {
        let dataset = scenario.generate();
        group.bench_function(*name, |b| {
            b.iter(|| crowd(black_box(&dataset.track), &dataset.land, &bench_config()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rasterize,
    bench_location_table,
    bench_chi2,
    bench_mask,
    bench_pipeline
);
criterion_main!(benches);
