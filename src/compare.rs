// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Cross-scenario comparison.

use crate::engine::ScenarioAnalysis;
use serde::{Deserialize, Serialize};

/// Scenario picks over a set of analyses. Identifiers, not indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Highest cache hit rate.
    pub best_cache: Option<String>,
    /// Lowest stale read rate.
    pub best_consistency: Option<String>,
    /// The caching-plus-invalidation configuration, when analyzed.
    pub full_system: Option<String>,
}

impl ScenarioComparison {
    /// Empty analyses never win. Ties go to the lowest identifier.
    pub fn new(analyses: &[ScenarioAnalysis], full_system_id: &str) -> Self {
        let mut candidates: Vec<&ScenarioAnalysis> =
            analyses.iter().filter(|a| !a.is_empty()).collect();
        candidates.sort_by(|a, b| a.id().cmp(b.id()));

        let mut best_cache: Option<&ScenarioAnalysis> = None;
        let mut best_consistency: Option<&ScenarioAnalysis> = None;
        for &a in &candidates {
            if best_cache.map_or(true, |b| a.kpis.cache.hit_rate > b.kpis.cache.hit_rate) {
                best_cache = Some(a);
            }
            if best_consistency.map_or(true, |b| a.kpis.stale.rate < b.kpis.stale.rate) {
                best_consistency = Some(a);
            }
        }

        Self {
            best_cache: best_cache.map(|a| a.id().to_string()),
            best_consistency: best_consistency.map(|a| a.id().to_string()),
            full_system: analyses
                .iter()
                .find(|a| a.id() == full_system_id)
                .map(|a| a.id().to_string()),
        }
    }
}
