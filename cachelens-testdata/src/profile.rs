// Cachelens Testdata - Scenario profiles
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Behavioural profiles of one cache configuration.

use crate::{Result, TestdataError};
use serde::{Deserialize, Serialize};

/// Log-normal delay distribution, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayProfile {
    /// Median delay in seconds.
    pub median_secs: f64,
    /// Shape of the log-normal (standard deviation of the log).
    pub sigma: f64,
    /// Number of samples to emit.
    pub samples: usize,
}

impl DelayProfile {
    pub fn new(median_secs: f64, sigma: f64, samples: usize) -> Self {
        Self {
            median_secs,
            sigma,
            samples,
        }
    }
}

/// How one scenario behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Scenario identifier (`A`, `B`, `C`, ...).
    pub id: String,
    /// Total cache lookups.
    pub requests: u64,
    /// Number of counter flushes the lookups are spread over.
    pub batches: u32,
    /// Probability that a lookup hits.
    pub hit_ratio: f64,
    /// Probability that a lookup returns stale data.
    pub stale_ratio: f64,
    /// Invalidation messages published. 0 disables invalidation metrics.
    pub invalidations_sent: u64,
    /// Probability that a published invalidation is lost.
    pub invalidation_loss: f64,
    /// Read latency.
    pub latency: DelayProfile,
    /// Time until a write stops being observed stale. `None` emits nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inconsistency: Option<DelayProfile>,
}

impl ScenarioProfile {
    /// Scenario A: caching disabled, every read goes to the database.
    pub fn no_cache() -> Self {
        Self {
            id: "A".to_string(),
            requests: 10_000,
            batches: 20,
            hit_ratio: 0.0,
            stale_ratio: 0.0,
            invalidations_sent: 0,
            invalidation_loss: 0.0,
            latency: DelayProfile::new(0.045, 0.35, 500),
            inconsistency: None,
        }
    }

    /// Scenario B: TTL cache without invalidation.
    pub fn ttl_only() -> Self {
        Self {
            id: "B".to_string(),
            requests: 10_000,
            batches: 20,
            hit_ratio: 0.86,
            stale_ratio: 0.03,
            invalidations_sent: 0,
            invalidation_loss: 0.0,
            latency: DelayProfile::new(0.006, 0.5, 500),
            inconsistency: Some(DelayProfile::new(2.5, 0.4, 200)),
        }
    }

    /// Scenario C: TTL cache plus invalidation.
    pub fn ttl_invalidate() -> Self {
        Self {
            id: "C".to_string(),
            requests: 10_000,
            batches: 20,
            hit_ratio: 0.84,
            stale_ratio: 0.0004,
            invalidations_sent: 2_000,
            invalidation_loss: 0.002,
            latency: DelayProfile::new(0.007, 0.5, 500),
            inconsistency: Some(DelayProfile::new(0.035, 0.3, 200)),
        }
    }

    /// Preset for a scenario identifier.
    pub fn preset(id: &str) -> Option<Self> {
        match id.to_uppercase().as_str() {
            "A" => Some(Self::no_cache()),
            "B" => Some(Self::ttl_only()),
            "C" => Some(Self::ttl_invalidate()),
            _ => None,
        }
    }

    pub fn with_requests(mut self, requests: u64) -> Self {
        self.requests = requests;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(TestdataError::InvalidProfile(format!(
                    "{} must be within [0, 1], got {}",
                    name, v
                )))
            }
        };
        ratio("hit_ratio", self.hit_ratio)?;
        ratio("stale_ratio", self.stale_ratio)?;
        ratio("invalidation_loss", self.invalidation_loss)?;

        if self.batches == 0 {
            return Err(TestdataError::InvalidProfile(
                "batches must be at least 1".to_string(),
            ));
        }

        let delays = std::iter::once(&self.latency).chain(self.inconsistency.as_ref());
        for delay in delays {
            if !(delay.median_secs > 0.0 && delay.sigma >= 0.0 && delay.sigma.is_finite()) {
                return Err(TestdataError::InvalidProfile(format!(
                    "invalid delay distribution {:?}",
                    delay
                )));
            }
        }
        Ok(())
    }
}
