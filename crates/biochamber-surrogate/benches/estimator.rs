//! Estimator benchmarks
//!
//! - Surrogate fit at several training-set sizes
//! - Single inference latency (runs once per control cycle)

use biochamber_common::Profile;
use biochamber_surrogate::{EfficiencyModel, ForestParams, SurrogateConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);

    for samples in [250usize, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*samples as u64));
        group.bench_with_input(BenchmarkId::new("samples", samples), samples, |b, &samples| {
            let config = SurrogateConfig {
                samples,
                ..Default::default()
            };
            b.iter(|| EfficiencyModel::train(black_box(&Profile::e_coli()), &config));
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");

    for trees in [50usize, 100].iter() {
        let config = SurrogateConfig {
            forest: ForestParams {
                n_trees: *trees,
                ..Default::default()
            },
            ..Default::default()
        };
        let model = match EfficiencyModel::train(&Profile::e_coli(), &config) {
            Ok(model) => model,
            Err(e) => panic!("fit failed: {}", e),
        };

        group.bench_with_input(BenchmarkId::new("trees", trees), trees, |b, _| {
            b.iter(|| model.predict(black_box(&[37.2, 7.1, 45.0, 1.5])));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
