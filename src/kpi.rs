// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! KPI calculation over one aggregated dataset.
//!
//! Every rate uses floating-point division and reads as 0 when its
//! denominator is 0. The invalidation success rate is the exception: with
//! nothing sent it has no value at all and lands in its `unmeasured` bucket.

use crate::aggregate::{MetricSeries, MetricStore};
use crate::config::{AnalysisConfig, MetricNames, UnitConfig};
use crate::percentile::{collect_samples, SampleSummary};
use crate::thresholds::{Bucket, KpiKind, KpiTable, Unit};
use serde::{Deserialize, Serialize};

/// `numerator / denominator * 100`, or 0 for an empty denominator.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// One bucketed indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub kind: KpiKind,
    /// `None` when the indicator could not be measured.
    pub value: Option<f64>,
    pub unit: Unit,
    /// Number of events or samples behind the value.
    pub sample_count: usize,
    pub bucket: Bucket,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: f64,
    pub misses: f64,
    pub total: f64,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new(hits: f64, misses: f64) -> Self {
        let total = hits + misses;
        Self {
            hits,
            misses,
            total,
            hit_rate: rate(hits, total),
        }
    }
}

/// Stale reads relative to all cache requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StaleStats {
    pub count: f64,
    pub rate: f64,
}

/// Invalidation delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvalidationStats {
    pub sent: f64,
    pub received: f64,
    /// `None` when nothing was sent.
    pub success_rate: Option<f64>,
}

impl InvalidationStats {
    pub fn new(sent: f64, received: f64) -> Self {
        Self {
            sent,
            received,
            success_rate: (sent > 0.0).then(|| received / sent * 100.0),
        }
    }
}

/// Latency summary of one series, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyKpi {
    pub key: String,
    pub summary: SampleSummary,
}

/// Every indicator derived from one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSet {
    pub cache: CacheStats,
    pub stale: StaleStats,
    pub invalidation: InvalidationStats,
    /// Inconsistency-window summary in milliseconds.
    pub inconsistency: Option<SampleSummary>,
    pub latencies: Vec<LatencyKpi>,
    /// The four scored indicators, in table order.
    pub kpis: Vec<Kpi>,
    pub event_count: usize,
    primary_latency_hint: String,
}

impl KpiSet {
    /// True when the dataset held no events.
    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }

    pub fn get(&self, kind: KpiKind) -> Option<&Kpi> {
        self.kpis.iter().find(|k| k.kind == kind)
    }

    pub fn bucket(&self, kind: KpiKind) -> Option<Bucket> {
        self.get(kind).map(|k| k.bucket)
    }

    /// Headline latency: the series matching the configured hint, else the
    /// first latency series.
    pub fn primary_latency(&self) -> Option<&LatencyKpi> {
        self.latencies
            .iter()
            .find(|l| l.key.contains(&self.primary_latency_hint))
            .or_else(|| self.latencies.first())
    }
}

/// Derives a [`KpiSet`] from a [`MetricStore`].
#[derive(Debug, Clone)]
pub struct KpiCalculator {
    names: MetricNames,
    units: UnitConfig,
    table: KpiTable,
}

impl KpiCalculator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            names: config.metrics.clone(),
            units: config.units.clone(),
            table: config.kpis.clone(),
        }
    }

    pub fn compute(&self, store: &MetricStore) -> KpiSet {
        let n = &self.names;
        let counter = |metric: &str| store.sum(&n.service, metric);

        let cache = CacheStats::new(counter(&n.cache_hits), counter(&n.cache_misses));
        let stale_count = counter(&n.stale_reads);
        let stale = StaleStats {
            count: stale_count,
            rate: rate(stale_count, cache.total),
        };
        let invalidation = InvalidationStats::new(
            counter(&n.invalidations_sent),
            counter(&n.invalidations_received),
        );

        let inconsistency_samples = collect_samples(
            store.matching(&n.inconsistency_pattern),
            self.units.sample_scale,
            self.units.inconsistency_filter,
        );
        let inconsistency = SampleSummary::from_samples(&inconsistency_samples);

        let latencies = self.latencies(store);

        let measured = |kind: KpiKind| -> (Option<f64>, usize) {
            match kind {
                KpiKind::CacheHitRate => (Some(cache.hit_rate), cache.total as usize),
                KpiKind::StaleReadRate => (Some(stale.rate), cache.total as usize),
                KpiKind::InvalidationSuccessRate => {
                    (invalidation.success_rate, invalidation.sent as usize)
                }
                KpiKind::InconsistencyWindow => (
                    inconsistency.map(|s| s.p95),
                    inconsistency.map(|s| s.count).unwrap_or(0),
                ),
            }
        };

        let kpis = self
            .table
            .kpis
            .iter()
            .map(|rule| {
                let (value, sample_count) = measured(rule.kind);
                Kpi {
                    kind: rule.kind,
                    value,
                    unit: rule.unit,
                    sample_count,
                    bucket: rule.classify(value),
                }
            })
            .collect();

        KpiSet {
            cache,
            stale,
            invalidation,
            inconsistency,
            latencies,
            kpis,
            event_count: store.event_count(),
            primary_latency_hint: n.primary_latency_hint.clone(),
        }
    }

    /// One summary per latency-bearing series; series without usable samples
    /// are left out.
    fn latencies(&self, store: &MetricStore) -> Vec<LatencyKpi> {
        store
            .iter()
            .filter(|s| self.is_latency(s))
            .filter_map(|s| {
                let samples = collect_samples(
                    std::iter::once(s),
                    self.units.sample_scale,
                    self.units.latency_filter,
                );
                SampleSummary::from_samples(&samples).map(|summary| LatencyKpi {
                    key: s.key(),
                    summary,
                })
            })
            .collect()
    }

    fn is_latency(&self, series: &MetricSeries) -> bool {
        let key = series.key().to_lowercase();
        self.names
            .latency_patterns
            .iter()
            .any(|p| key.contains(&p.to_lowercase()))
    }
}
