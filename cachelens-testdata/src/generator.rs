// Cachelens Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metric stream generation.
//!
//! Counters are flushed once per batch; latency and inconsistency samples
//! are spread evenly across the batches. Timers are emitted in seconds, as a
//! real service would.

use crate::profile::{DelayProfile, ScenarioProfile};
use crate::{Result, TestdataError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Binomial, LogNormal};
use serde::{Deserialize, Serialize};

/// One line of a metrics file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub metric: String,
    pub value: f64,
    pub tags: String,
    pub timestamp: String,
}

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Service name written on every line. `None` omits the field.
    pub service: Option<String>,
    /// Timestamp of the first batch.
    pub start_time: DateTime<Utc>,
    /// Interval between counter flushes in milliseconds.
    pub batch_interval_ms: i64,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            service: Some("catalog".to_string()),
            start_time: Utc
                .with_ymd_and_hms(2025, 1, 14, 9, 30, 0)
                .single()
                .unwrap_or_else(Utc::now),
            batch_interval_ms: 5_000,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    /// Leave `service` out of every line.
    pub fn without_service(mut self) -> Self {
        self.service = None;
        self
    }

    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = start;
        self
    }

    fn timestamp(&self, batch: u32) -> String {
        (self.start_time + Duration::milliseconds(self.batch_interval_ms * batch as i64))
            .to_rfc3339()
    }
}

/// Generate every metric line of one scenario.
pub fn generate_lines(profile: &ScenarioProfile, config: &GeneratorConfig) -> Result<Vec<MetricLine>> {
    profile.validate()?;

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let tags = format!("scenario={}", profile.id);
    let line = |metric: &str, value: f64, batch: u32| MetricLine {
        service: config.service.clone(),
        metric: metric.to_string(),
        value,
        tags: tags.clone(),
        timestamp: config.timestamp(batch),
    };

    let latency = delay_distribution(&profile.latency)?;
    let inconsistency = profile
        .inconsistency
        .as_ref()
        .map(delay_distribution)
        .transpose()?;

    let batches = profile.batches;
    let mut lines = Vec::new();

    for batch in 0..batches {
        let requests = share(profile.requests, batch, batches);
        let hits = binomial(&mut rng, requests, profile.hit_ratio)?;
        let stale = binomial(&mut rng, requests, profile.stale_ratio)?;

        lines.push(line("cache_hits", hits as f64, batch));
        lines.push(line("cache_misses", (requests - hits) as f64, batch));
        lines.push(line("stale_reads_detected", stale as f64, batch));

        if profile.invalidations_sent > 0 {
            let sent = share(profile.invalidations_sent, batch, batches);
            let received = binomial(&mut rng, sent, 1.0 - profile.invalidation_loss)?;
            lines.push(line("invalidations_sent", sent as f64, batch));
            lines.push(line("invalidations_received", received as f64, batch));
        }

        for _ in 0..share(profile.latency.samples as u64, batch, batches) {
            lines.push(line("get_product_latency", latency.sample(&mut rng), batch));
        }

        if let (Some(dist), Some(delay)) = (&inconsistency, &profile.inconsistency) {
            for _ in 0..share(delay.samples as u64, batch, batches) {
                lines.push(line("inconsistency_window", dist.sample(&mut rng), batch));
            }
        }
    }

    Ok(lines)
}

/// Serialize lines as newline-delimited JSON.
pub fn to_jsonl(lines: &[MetricLine]) -> Result<String> {
    let mut out = String::new();
    for line in lines {
        out.push_str(&serde_json::to_string(line)?);
        out.push('\n');
    }
    Ok(out)
}

/// Portion of `total` assigned to `batch`; the shares sum to `total`.
fn share(total: u64, batch: u32, batches: u32) -> u64 {
    let base = total / batches as u64;
    let extra = (batch as u64) < total % batches as u64;
    base + extra as u64
}

fn binomial(rng: &mut StdRng, n: u64, p: f64) -> Result<u64> {
    let dist = Binomial::new(n, p)
        .map_err(|e| TestdataError::InvalidProfile(format!("binomial({}, {}): {}", n, p, e)))?;
    Ok(dist.sample(rng))
}

fn delay_distribution(delay: &DelayProfile) -> Result<LogNormal<f64>> {
    LogNormal::new(delay.median_secs.ln(), delay.sigma)
        .map_err(|e| TestdataError::InvalidProfile(format!("{:?}: {}", delay, e)))
}
