// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Analysis configuration.

use crate::error::{CachelensError, Result};
use crate::percentile::SampleFilter;
use crate::thresholds::KpiTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Master configuration for one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which series feed which KPI.
    pub metrics: MetricNames,

    /// Sample scaling and filtering.
    pub units: UnitConfig,

    /// KPI thresholds, buckets and points.
    pub kpis: KpiTable,

    /// Score cut-offs for each verdict.
    pub verdicts: VerdictThresholds,

    /// Scenario identifiers and descriptions.
    pub scenarios: ScenarioConfig,
}

/// Metric names and key patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricNames {
    /// Service whose counters drive the cache and invalidation KPIs.
    pub service: String,
    pub cache_hits: String,
    pub cache_misses: String,
    pub stale_reads: String,
    pub invalidations_sent: String,
    pub invalidations_received: String,
    /// Substring identifying inconsistency-window series.
    pub inconsistency_pattern: String,
    /// Substrings identifying latency-bearing series.
    pub latency_patterns: Vec<String>,
    /// Substring picking the headline latency in comparisons.
    pub primary_latency_hint: String,
}

impl Default for MetricNames {
    fn default() -> Self {
        Self {
            service: "catalog".to_string(),
            cache_hits: "cache_hits".to_string(),
            cache_misses: "cache_misses".to_string(),
            stale_reads: "stale_reads_detected".to_string(),
            invalidations_sent: "invalidations_sent".to_string(),
            invalidations_received: "invalidations_received".to_string(),
            inconsistency_pattern: "inconsistency_window".to_string(),
            latency_patterns: vec!["latency".to_string(), "duration".to_string()],
            primary_latency_hint: "get_product_latency".to_string(),
        }
    }
}

/// Sample unit handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Multiplier applied to timer samples (timers are emitted in seconds).
    pub sample_scale: f64,
    /// Filter for latency samples.
    pub latency_filter: SampleFilter,
    /// Filter for inconsistency-window samples.
    pub inconsistency_filter: SampleFilter,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            sample_scale: 1000.0,
            latency_filter: SampleFilter::PositiveOnly,
            inconsistency_filter: SampleFilter::PositiveOnly,
        }
    }
}

/// Minimum score for each verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    pub ready_excellent: u32,
    pub ready_good: u32,
    pub needs_optimization: u32,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            ready_excellent: 90,
            ready_good: 75,
            needs_optimization: 60,
        }
    }
}

/// Scenario identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Identifiers the latest-results report looks for.
    pub requested: Vec<String>,
    /// Identifier of the configuration with caching and invalidation.
    pub full_system: String,
    /// Identifier given to the live-source fallback.
    pub current_label: String,
    pub descriptions: BTreeMap<String, String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let descriptions = [
            ("A", "No Cache (CACHE_MODE=none) - Direct DB calls"),
            ("B", "TTL Only (CACHE_MODE=ttl) - Cache without invalidation"),
            (
                "C",
                "TTL + Invalidation (CACHE_MODE=ttl_invalidate) - Full system",
            ),
            ("CURRENT", "Current System State"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            requested: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            full_system: "C".to_string(),
            current_label: "CURRENT".to_string(),
            descriptions,
        }
    }
}

impl ScenarioConfig {
    /// Description of a scenario, or a generic one.
    pub fn describe(&self, id: &str) -> String {
        self.descriptions
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Scenario {}", id))
    }
}

impl AnalysisConfig {
    /// Parse from a JSON string. Absent sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that would break scoring invariants.
    pub fn validate(&self) -> Result<()> {
        self.kpis.validate().map_err(CachelensError::InvalidConfig)?;

        let v = &self.verdicts;
        if !(v.ready_excellent > v.ready_good && v.ready_good > v.needs_optimization) {
            return Err(CachelensError::InvalidConfig(
                "verdict cut-offs must strictly decrease".to_string(),
            ));
        }
        if v.ready_excellent > 100 {
            return Err(CachelensError::InvalidConfig(
                "verdict cut-offs must not exceed 100".to_string(),
            ));
        }

        if !(self.units.sample_scale.is_finite() && self.units.sample_scale > 0.0) {
            return Err(CachelensError::InvalidConfig(
                "sample_scale must be positive".to_string(),
            ));
        }

        if self.metrics.latency_patterns.iter().any(|p| p.is_empty())
            || self.metrics.inconsistency_pattern.is_empty()
        {
            return Err(CachelensError::InvalidConfig(
                "series patterns must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
