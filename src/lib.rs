// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Cachelens - Cache invalidation metrics analysis
//!
//! Batch analysis of newline-delimited metric events emitted by a caching and
//! invalidation subsystem. One pass reads the metric files, groups events into
//! series, derives KPIs (hit rate, stale read rate, invalidation success,
//! latency and inconsistency-window percentiles), scores them and renders a
//! text report.
//!
//! ## Quick Start
//!
//! ```rust
//! use cachelens::{Analyzer, MetricEvent, MetricStore, ScenarioRun, Verdict};
//!
//! let store = MetricStore::from_events(vec![
//!     MetricEvent::new("catalog", "cache_hits", 80.0),
//!     MetricEvent::new("catalog", "cache_misses", 20.0),
//!     MetricEvent::new("catalog", "stale_reads_detected", 0.0),
//! ]);
//!
//! let run = ScenarioRun {
//!     id: "CURRENT".to_string(),
//!     source: "/tmp/metrics".into(),
//!     discovered_at: "current".to_string(),
//! };
//! let analysis = Analyzer::default().analyze_store(run, &store);
//!
//! assert_eq!(analysis.score.points, 75);
//! assert_eq!(analysis.score.verdict, Verdict::ReadyGood);
//! ```
//!
//! ## Modules
//!
//! - [`event`]: One parsed metric record
//! - [`ingest`]: Reading files, directories and wildcard sources
//! - [`aggregate`]: Per-key series
//! - [`percentile`]: p50/p95 and sample summaries
//! - [`thresholds`]: The KPI table (buckets, weights, points)
//! - [`kpi`]: KPI calculation
//! - [`score`]: Composite score and verdict
//! - [`scenario`]: Result-store discovery
//! - [`engine`]: The per-run pipeline
//! - [`compare`]: Cross-scenario picks
//! - [`report`]: Text rendering
//! - [`persist`]: Saving rendered reports

// Modules
pub mod aggregate;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ingest;
pub mod kpi;
pub mod percentile;
pub mod persist;
pub mod report;
pub mod scenario;
pub mod score;
pub mod thresholds;

// Re-exports for convenient access
pub use aggregate::{MetricSeries, MetricStore};
pub use compare::ScenarioComparison;
pub use config::{AnalysisConfig, MetricNames, ScenarioConfig, UnitConfig, VerdictThresholds};
pub use engine::{Analyzer, ScenarioAnalysis};
pub use error::{CachelensError, Result};
pub use event::MetricEvent;
pub use ingest::{
    has_parsable_record, ingest_file, ingest_reader, ingest_source, FallbackService, IngestStats,
    Ingested,
};
pub use kpi::{CacheStats, InvalidationStats, Kpi, KpiCalculator, KpiSet, LatencyKpi, StaleStats};
pub use percentile::{Percentiles, SampleFilter, SampleSummary};
pub use persist::ReportWriter;
pub use report::{render, Report, ReportInput, ReportKind};
pub use scenario::{LocatorOutcome, ScenarioLocator, ScenarioRun, CURRENT_ID};
pub use score::{Score, ScoreComponent, Scorer, Verdict};
pub use thresholds::{Bucket, KpiKind, KpiRule, KpiTable, Unit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default live metrics directory.
pub const DEFAULT_METRICS_DIR: &str = "/tmp/metrics";

/// Default scenario result store.
pub const DEFAULT_RESULTS_DIR: &str = "/tmp/eds-results";

/// Default directory for saved reports.
pub const DEFAULT_REPORTS_DIR: &str = "/tmp/eds-reports";
