//! Benchmarks for model fitting and rolling-origin evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use retail_forecast::data::synthetic_retail;
use retail_forecast::models::arima::{ARIMAOrder, ARIMA};
use retail_forecast::models::baseline::SeasonalNaive;
use retail_forecast::models::exponential::{AutoETS, HoltWinters};
use retail_forecast::models::Forecaster;
use retail_forecast::utils::{rolling_origin, RollingOriginConfig};

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(20);

    for years in [10, 20, 30].iter() {
        let series = synthetic_retail(*years, 1).unwrap();

        group.bench_with_input(BenchmarkId::new("HoltWinters", years), years, |b, _| {
            b.iter(|| {
                let mut model = HoltWinters::multiplicative(12);
                model.fit(black_box(&series)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("ARIMA", years), years, |b, _| {
            b.iter(|| {
                let mut model = ARIMA::new(ARIMAOrder::default());
                model.fit(black_box(&series)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("AutoETS", years), years, |b, _| {
            b.iter(|| {
                let mut model = AutoETS::with_period(12);
                model.fit(black_box(&series)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_rolling_origin(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_origin");
    group.sample_size(10);
    let series = synthetic_retail(20, 1).unwrap();
    let config = RollingOriginConfig::new(120, 12).with_step(6);

    group.bench_function("SNaive", |b| {
        b.iter(|| rolling_origin(black_box(&series), &config, "snaive", || SeasonalNaive::new(12)))
    });

    group.bench_function("HoltWinters", |b| {
        b.iter(|| {
            rolling_origin(black_box(&series), &config, "hw", || {
                HoltWinters::additive(12)
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fit, bench_rolling_origin);
criterion_main!(benches);
