// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Analyzer - orchestrates ingest, aggregation, KPIs and scoring for one run.

use crate::aggregate::MetricStore;
use crate::config::AnalysisConfig;
use crate::ingest::{ingest_source, FallbackService, IngestStats};
use crate::kpi::{KpiCalculator, KpiSet};
use crate::scenario::ScenarioRun;
use crate::score::{Score, Scorer};
use tracing::{debug, info};

/// Everything computed for one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioAnalysis {
    pub run: ScenarioRun,
    pub description: String,
    pub stats: IngestStats,
    pub kpis: KpiSet,
    pub score: Score,
}

impl ScenarioAnalysis {
    pub fn id(&self) -> &str {
        &self.run.id
    }

    /// No usable records behind this run.
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
    }
}

/// Main analysis pipeline.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    calculator: KpiCalculator,
    scorer: Scorer,
    fallback: FallbackService,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            calculator: KpiCalculator::new(&config),
            scorer: Scorer::new(&config),
            config,
            fallback: FallbackService::default(),
        }
    }

    /// Service name used for records without one.
    pub fn with_fallback_service(mut self, fallback: FallbackService) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze an already aggregated store.
    pub fn analyze_store(&self, run: ScenarioRun, store: &MetricStore) -> ScenarioAnalysis {
        let kpis = self.calculator.compute(store);
        let score = self.scorer.score(&kpis);
        debug!(
            "Scenario {}: {} events, score {}",
            run.id, kpis.event_count, score.points
        );

        ScenarioAnalysis {
            description: self.config.scenarios.describe(&run.id),
            run,
            stats: IngestStats::default(),
            kpis,
            score,
        }
    }

    /// Ingest a run's source and analyze it. Unreadable sources give an
    /// empty analysis.
    pub fn analyze(&self, run: &ScenarioRun) -> ScenarioAnalysis {
        let ingested = ingest_source(&run.source, self.fallback);
        let stats = ingested.stats;
        if ingested.is_empty() {
            info!("Scenario {} has no usable records", run.id);
        }

        let store = MetricStore::from_events(ingested.events);
        let mut analysis = self.analyze_store(run.clone(), &store);
        analysis.stats = stats;
        analysis
    }

    pub fn analyze_all(&self, runs: &[ScenarioRun]) -> Vec<ScenarioAnalysis> {
        runs.iter().map(|run| self.analyze(run)).collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
