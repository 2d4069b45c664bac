// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Order statistics over numeric samples.
//!
//! Percentiles use linear interpolation between the closest ranks of the
//! ascending-sorted samples: for quantile `q` over `n` samples the position is
//! `h = (n - 1) * q` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[ceil(h)] - x[floor(h)])`.
//! The result is non-decreasing in `q`, so `p50 <= p95` always holds.

use crate::aggregate::MetricSeries;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which samples the caller keeps before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFilter {
    /// Keep every finite sample.
    All,
    /// Keep strictly positive samples only.
    #[default]
    PositiveOnly,
}

impl SampleFilter {
    pub fn keeps(&self, value: f64) -> bool {
        match self {
            SampleFilter::All => value.is_finite(),
            SampleFilter::PositiveOnly => value.is_finite() && value > 0.0,
        }
    }
}

/// Median and 95th percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
}

impl Percentiles {
    /// Compute p50/p95. `None` when no finite sample exists.
    pub fn compute(samples: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(samples);
        if sorted.is_empty() {
            return None;
        }
        Some(Self {
            p50: quantile_sorted(&sorted, 0.50),
            p95: quantile_sorted(&sorted, 0.95),
        })
    }
}

fn sorted_finite(samples: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Interpolated quantile over already-sorted, non-empty samples.
///
/// `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    if a == b {
        return a;
    }
    let t = h - lo as f64;
    let span = b - a;
    if span.is_finite() {
        a + t * span
    } else {
        // b - a overflowed; the weighted form stays within [a, b].
        a * (1.0 - t) + b * t
    }
}

/// Interpolated quantile over unsorted samples. `None` when empty.
pub fn quantile(samples: &[f64], q: f64) -> Option<f64> {
    let sorted = sorted_finite(samples);
    if sorted.is_empty() {
        None
    } else {
        Some(quantile_sorted(&sorted, q))
    }
}

/// Percentiles plus mean and count of one sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub p50: f64,
    pub p95: f64,
    pub mean: f64,
    pub count: usize,
}

impl SampleSummary {
    /// Summarize finite samples. `None` means "no data".
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(samples);
        if sorted.is_empty() {
            return None;
        }
        let count = sorted.len();
        Some(Self {
            p50: quantile_sorted(&sorted, 0.50),
            p95: quantile_sorted(&sorted, 0.95),
            mean: sorted.iter().sum::<f64>() / count as f64,
            count,
        })
    }

    pub fn percentiles(&self) -> Percentiles {
        Percentiles {
            p50: self.p50,
            p95: self.p95,
        }
    }
}

/// Scale every value of `series` and keep the ones `filter` accepts.
///
/// Unit conversion happens here, before any ranking.
pub fn collect_samples<'a, I>(series: I, scale: f64, filter: SampleFilter) -> Vec<f64>
where
    I: IntoIterator<Item = &'a MetricSeries>,
{
    series
        .into_iter()
        .flat_map(|s| s.values())
        .filter(|v| filter.keeps(*v))
        .map(|v| v * scale)
        .collect()
}
