//! Criterion benchmarks for the inference path
//!
//! These benchmarks measure:
//! - Single prediction latency per disease
//! - Input validation on its own
//! - Parallel batch throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use disease_risk_predictor::ml::{DiseaseId, InferenceService, ModelRegistry, RangePolicy};
use std::path::PathBuf;
use std::sync::Arc;

fn setup_service() -> InferenceService {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/all_disease_models.json");
    let registry = ModelRegistry::load(path).expect("fixture artifact should load");
    InferenceService::new(Arc::new(registry))
}

/// Benchmark one prediction for each disease
fn bench_single_prediction(c: &mut Criterion) {
    let service = setup_service();
    let mut group = c.benchmark_group("predict");

    for disease in DiseaseId::all() {
        let values = service.spec_for(disease).unwrap().defaults();
        group.bench_with_input(
            BenchmarkId::from_parameter(disease.artifact_key()),
            &values,
            |b, values| {
                b.iter(|| service.predict(black_box(disease), black_box(values)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark field validation without scaling or classification
fn bench_validation(c: &mut Criterion) {
    let service = setup_service();
    let spec = service.spec_for(DiseaseId::HeartDisease).unwrap();
    let values = spec.defaults();

    c.bench_function("validate_heart", |b| {
        b.iter(|| spec.validate(black_box(&values), RangePolicy::Reject).unwrap());
    });
}

/// Benchmark parallel batches of diabetes requests
fn bench_batch_prediction(c: &mut Criterion) {
    let service = setup_service();
    let mut group = c.benchmark_group("predict_batch");

    for size in [16usize, 256, 4096] {
        let rows: Vec<Vec<f64>> = (0..size)
            .map(|i| vec![(i % 10) as f64, 80.0 + (i % 200) as f64, 70.0, 20.0, 80.0, 30.0, 0.5, 40.0])
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| service.predict_batch(DiseaseId::Diabetes, black_box(rows)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_prediction,
    bench_validation,
    bench_batch_prediction
);
criterion_main!(benches);
