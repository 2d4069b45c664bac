// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Weighted composite score and production-readiness verdict.

use crate::config::{AnalysisConfig, VerdictThresholds};
use crate::kpi::KpiSet;
use crate::thresholds::{Bucket, KpiKind, KpiTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Production-readiness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    ReadyExcellent,
    ReadyGood,
    NeedsOptimization,
    NotReady,
}

impl Verdict {
    /// Map a point total onto a verdict.
    pub fn from_points(points: u32, cutoffs: &VerdictThresholds) -> Self {
        if points >= cutoffs.ready_excellent {
            Verdict::ReadyExcellent
        } else if points >= cutoffs.ready_good {
            Verdict::ReadyGood
        } else if points >= cutoffs.needs_optimization {
            Verdict::NeedsOptimization
        } else {
            Verdict::NotReady
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::ReadyExcellent => "READY_EXCELLENT",
            Verdict::ReadyGood => "READY_GOOD",
            Verdict::NeedsOptimization => "NEEDS_OPTIMIZATION",
            Verdict::NotReady => "NOT_READY",
        }
    }

    /// Sentence printed under the score.
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::ReadyExcellent => "PRODUCTION READY - Excellent performance!",
            Verdict::ReadyGood => "PRODUCTION READY - Good performance",
            Verdict::NeedsOptimization => "NEEDS OPTIMIZATION - Acceptable but can improve",
            Verdict::NotReady => "NOT READY - Significant issues need fixing",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Verdict::ReadyExcellent | Verdict::ReadyGood)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded for one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub kind: KpiKind,
    pub bucket: Bucket,
    pub points: u32,
    pub weight: u32,
}

/// Composite 0-100 score of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub points: u32,
    pub components: Vec<ScoreComponent>,
    pub verdict: Verdict,
}

impl Score {
    pub fn component(&self, kind: KpiKind) -> Option<&ScoreComponent> {
        self.components.iter().find(|c| c.kind == kind)
    }
}

/// Turns bucketed KPIs into a [`Score`].
#[derive(Debug, Clone)]
pub struct Scorer {
    table: KpiTable,
    cutoffs: VerdictThresholds,
}

impl Scorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            table: config.kpis.clone(),
            cutoffs: config.verdicts.clone(),
        }
    }

    /// Score a KPI set. A KPI missing from the set is scored as unmeasured.
    pub fn score(&self, kpis: &KpiSet) -> Score {
        let components: Vec<ScoreComponent> = self
            .table
            .kpis
            .iter()
            .map(|rule| {
                let bucket = kpis
                    .bucket(rule.kind)
                    .unwrap_or_else(|| rule.classify(None));
                ScoreComponent {
                    kind: rule.kind,
                    bucket,
                    points: rule.points_for(bucket),
                    weight: rule.weight,
                }
            })
            .collect();

        let points = components.iter().map(|c| c.points).sum::<u32>().min(100);
        Score {
            points,
            verdict: Verdict::from_points(points, &self.cutoffs),
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MetricStore;
    use crate::event::MetricEvent;
    use crate::kpi::KpiCalculator;

    fn score_of(events: Vec<MetricEvent>) -> Score {
        let config = AnalysisConfig::default();
        let kpis = KpiCalculator::new(&config).compute(&MetricStore::from_events(events));
        Scorer::new(&config).score(&kpis)
    }

    fn ev(metric: &str, value: f64) -> MetricEvent {
        MetricEvent::new("catalog", metric, value)
    }

    #[test]
    fn test_verdict_cutoffs() {
        let cutoffs = VerdictThresholds::default();
        assert_eq!(Verdict::from_points(100, &cutoffs), Verdict::ReadyExcellent);
        assert_eq!(Verdict::from_points(90, &cutoffs), Verdict::ReadyExcellent);
        assert_eq!(Verdict::from_points(89, &cutoffs), Verdict::ReadyGood);
        assert_eq!(Verdict::from_points(75, &cutoffs), Verdict::ReadyGood);
        assert_eq!(Verdict::from_points(60, &cutoffs), Verdict::NeedsOptimization);
        assert_eq!(Verdict::from_points(59, &cutoffs), Verdict::NotReady);
        assert_eq!(Verdict::from_points(0, &cutoffs), Verdict::NotReady);
    }

    #[test]
    fn test_three_facts_score_75() {
        let score = score_of(vec![
            ev("cache_hits", 80.0),
            ev("cache_misses", 20.0),
            ev("stale_reads_detected", 0.0),
        ]);

        let points: Vec<u32> = score.components.iter().map(|c| c.points).collect();
        assert_eq!(points, vec![30, 30, 10, 5]);
        assert_eq!(score.points, 75);
        assert_eq!(score.verdict, Verdict::ReadyGood);
        assert!(score.verdict.is_ready());
    }

    #[test]
    fn test_full_marks() {
        let score = score_of(vec![
            ev("cache_hits", 95.0),
            ev("cache_misses", 5.0),
            ev("invalidations_sent", 1000.0),
            ev("invalidations_received", 1000.0),
            ev("inconsistency_window", 0.02),
        ]);
        assert_eq!(score.points, 100);
        assert_eq!(score.verdict, Verdict::ReadyExcellent);
    }

    #[test]
    fn test_broken_cache_is_not_ready() {
        let score = score_of(vec![
            ev("cache_misses", 100.0),
            ev("stale_reads_detected", 5.0),
            ev("invalidations_sent", 10.0),
            ev("invalidations_received", 2.0),
            ev("inconsistency_window", 3.0),
        ]);
        assert_eq!(score.points, 13);
        assert_eq!(score.verdict, Verdict::NotReady);
        assert_eq!(
            score.component(KpiKind::InconsistencyWindow).unwrap().bucket,
            Bucket::Slow
        );
    }

    #[test]
    fn test_bucket_improvement_raises_score() {
        let poor = score_of(vec![ev("cache_hits", 20.0), ev("cache_misses", 80.0)]);
        let good = score_of(vec![ev("cache_hits", 60.0), ev("cache_misses", 40.0)]);
        let excellent = score_of(vec![ev("cache_hits", 90.0), ev("cache_misses", 10.0)]);
        assert!(poor.points < good.points);
        assert!(good.points < excellent.points);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Verdict::NotReady.message(),
            "NOT READY - Significant issues need fixing"
        );
        assert_eq!(Verdict::ReadyGood.to_string(), "READY_GOOD");
    }
}
