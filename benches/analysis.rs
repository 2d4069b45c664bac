//! Benchmarks for ingestion, aggregation and percentile computation

use cachelens::percentile::quantile;
use cachelens::{ingest_reader, Analyzer, MetricStore, ScenarioRun};
use cachelens_testdata::{generate_lines, to_jsonl, GeneratorConfig, ScenarioProfile};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io::Cursor;

fn generate_jsonl(requests: u64) -> String {
    let profile = ScenarioProfile::ttl_invalidate().with_requests(requests);
    let lines = generate_lines(&profile, &GeneratorConfig::new().with_seed(42)).unwrap();
    to_jsonl(&lines).unwrap()
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    let text = generate_jsonl(100_000);
    let line_count = text.lines().count() as u64;
    group.throughput(Throughput::Elements(line_count));

    group.bench_function("parse_jsonl", |b| {
        b.iter(|| {
            let ingested = ingest_reader(Cursor::new(text.as_bytes()), "unknown");
            black_box(ingested.events.len())
        })
    });

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    let text = generate_jsonl(100_000);
    let events = ingest_reader(Cursor::new(text.as_bytes()), "unknown").events;
    let analyzer = Analyzer::default();
    let run = ScenarioRun {
        id: "C".to_string(),
        source: "bench".into(),
        discovered_at: "20250114_093000".to_string(),
    };

    group.bench_function("aggregate", |b| {
        b.iter(|| black_box(MetricStore::from_events(events.iter().cloned()).len()))
    });

    let store = MetricStore::from_events(events);
    group.bench_function("kpis_and_score", |b| {
        b.iter(|| black_box(analyzer.analyze_store(run.clone(), &store).score.points))
    });

    group.finish();
}

fn bench_percentiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentiles");

    for size in [100usize, 10_000, 100_000] {
        // Deterministic, unsorted samples.
        let samples: Vec<f64> = (0..size)
            .map(|i| ((i * 7919) % size) as f64 * 0.25)
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("p95_{}", size), |b| {
            b.iter(|| black_box(quantile(&samples, 0.95)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_analyze, bench_percentiles);
criterion_main!(benches);
