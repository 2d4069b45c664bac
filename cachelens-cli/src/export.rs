// Cachelens CLI - KPI exports
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus text and CSV exports of analyzed scenarios.
//!
//! Each export builds its own registry, so nothing leaks between runs.

use cachelens::{Bucket, ScenarioAnalysis};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Export error types.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Encoded metrics are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Numeric rank of a bucket for gauges. 0 is best; unmeasured buckets are -1.
pub fn bucket_rank(bucket: Bucket) -> f64 {
    match bucket {
        Bucket::Excellent => 0.0,
        Bucket::Good => 1.0,
        Bucket::Poor | Bucket::Slow => 2.0,
        Bucket::NotWorking => 3.0,
        Bucket::NotApplicable | Bucket::NotMeasured => -1.0,
    }
}

/// Encode every scenario's KPIs and score in Prometheus text format.
pub fn encode_prometheus(analyses: &[ScenarioAnalysis]) -> Result<String, ExportError> {
    let registry = Registry::new();

    let kpi_value = GaugeVec::new(
        Opts::new("cachelens_kpi_value", "KPI value by scenario"),
        &["scenario", "kpi"],
    )?;
    let kpi_bucket = GaugeVec::new(
        Opts::new(
            "cachelens_kpi_bucket",
            "KPI bucket rank (0=excellent, 1=good, 2=poor/slow, 3=not working, -1=unmeasured)",
        ),
        &["scenario", "kpi"],
    )?;
    let score = GaugeVec::new(
        Opts::new("cachelens_score", "Composite readiness score (0-100)"),
        &["scenario"],
    )?;

    registry.register(Box::new(kpi_value.clone()))?;
    registry.register(Box::new(kpi_bucket.clone()))?;
    registry.register(Box::new(score.clone()))?;

    for analysis in analyses.iter().filter(|a| !a.is_empty()) {
        let id = analysis.id();
        for kpi in &analysis.kpis.kpis {
            let labels = [id, kpi.kind.as_str()];
            if let Some(value) = kpi.value {
                kpi_value.with_label_values(&labels).set(value);
            }
            kpi_bucket
                .with_label_values(&labels)
                .set(bucket_rank(kpi.bucket));
        }
        score
            .with_label_values(&[id])
            .set(analysis.score.points as f64);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    scenario: &'a str,
    kpi: &'a str,
    value: Option<f64>,
    unit: &'a str,
    bucket: &'a str,
    samples: usize,
}

/// Write the comparison table as CSV, one row per scenario and KPI.
/// Scenarios without data are skipped, as in the Prometheus export.
pub fn write_csv<W: io::Write>(analyses: &[ScenarioAnalysis], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    for analysis in analyses.iter().filter(|a| !a.is_empty()) {
        let id = analysis.id();
        let kpis = &analysis.kpis;

        for kpi in &kpis.kpis {
            csv.serialize(CsvRow {
                scenario: id,
                kpi: kpi.kind.as_str(),
                value: kpi.value,
                unit: kpi.unit.symbol(),
                bucket: kpi.bucket.as_str(),
                samples: kpi.sample_count,
            })?;
        }

        csv.serialize(CsvRow {
            scenario: id,
            kpi: "total_requests",
            value: Some(kpis.cache.total),
            unit: "count",
            bucket: "",
            samples: kpis.event_count,
        })?;

        let latency = kpis.primary_latency();
        csv.serialize(CsvRow {
            scenario: id,
            kpi: "primary_latency_p95",
            value: latency.map(|l| l.summary.p95),
            unit: "ms",
            bucket: "",
            samples: latency.map(|l| l.summary.count).unwrap_or(0),
        })?;

        csv.serialize(CsvRow {
            scenario: id,
            kpi: "score",
            value: Some(analysis.score.points as f64),
            unit: "points",
            bucket: analysis.score.verdict.as_str(),
            samples: kpis.event_count,
        })?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the Prometheus export to a file.
pub fn export_prometheus(path: &Path, analyses: &[ScenarioAnalysis]) -> Result<(), ExportError> {
    fs::write(path, encode_prometheus(analyses)?)?;
    Ok(())
}

/// Write the CSV export to a file.
pub fn export_csv(path: &Path, analyses: &[ScenarioAnalysis]) -> Result<(), ExportError> {
    write_csv(analyses, fs::File::create(path)?)
}
