// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! The KPI table: thresholds, bucket labels, weights and points.
//!
//! Both the KPI calculator (bucketing) and the scorer (points) read this one
//! table. Rules of a KPI are evaluated top to bottom; the first rule whose
//! comparison holds decides the bucket, `otherwise` applies when none does,
//! and `unmeasured` applies when the KPI has no value at all.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative bucket of one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bucket {
    Excellent,
    Good,
    Poor,
    NotWorking,
    Slow,
    NotApplicable,
    NotMeasured,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Excellent => "EXCELLENT",
            Bucket::Good => "GOOD",
            Bucket::Poor => "POOR",
            Bucket::NotWorking => "NOT_WORKING",
            Bucket::Slow => "SLOW",
            Bucket::NotApplicable => "NOT_APPLICABLE",
            Bucket::NotMeasured => "NOT_MEASURED",
        }
    }

    /// Human label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Excellent => "EXCELLENT",
            Bucket::Good => "GOOD",
            Bucket::Poor => "POOR",
            Bucket::NotWorking => "NOT WORKING",
            Bucket::Slow => "SLOW",
            Bucket::NotApplicable => "NOT APPLICABLE",
            Bucket::NotMeasured => "NOT MEASURED",
        }
    }

    /// Buckets that describe a measured value (as opposed to an absent one).
    pub fn is_measured(&self) -> bool {
        !matches!(self, Bucket::NotApplicable | Bucket::NotMeasured)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four scored indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    CacheHitRate,
    StaleReadRate,
    InvalidationSuccessRate,
    InconsistencyWindow,
}

impl KpiKind {
    pub const ALL: [KpiKind; 4] = [
        KpiKind::CacheHitRate,
        KpiKind::StaleReadRate,
        KpiKind::InvalidationSuccessRate,
        KpiKind::InconsistencyWindow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiKind::CacheHitRate => "cache_hit_rate",
            KpiKind::StaleReadRate => "stale_read_rate",
            KpiKind::InvalidationSuccessRate => "invalidation_success_rate",
            KpiKind::InconsistencyWindow => "inconsistency_window_p95",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            KpiKind::CacheHitRate => "Cache Hit Rate",
            KpiKind::StaleReadRate => "Stale Read Rate",
            KpiKind::InvalidationSuccessRate => "Invalidation Success",
            KpiKind::InconsistencyWindow => "Inconsistency p95",
        }
    }

    /// Name of the score component this KPI feeds.
    pub fn score_component(&self) -> &'static str {
        match self {
            KpiKind::CacheHitRate => "Cache Performance",
            KpiKind::StaleReadRate => "Data Consistency",
            KpiKind::InvalidationSuccessRate => "Invalidation",
            KpiKind::InconsistencyWindow => "Responsiveness",
        }
    }
}

/// Unit attached to a KPI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    Milliseconds,
    Count,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Milliseconds => "ms",
            Unit::Count => "count",
        }
    }
}

/// How a rule compares the KPI value to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::GreaterThan => value > threshold,
            Comparison::LessThan => value < threshold,
        }
    }
}

/// One threshold row of a KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRule {
    pub bucket: Bucket,
    pub comparison: Comparison,
    pub threshold: f64,
    pub points: u32,
}

/// Bucket with its awarded points, used for fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPoints {
    pub bucket: Bucket,
    pub points: u32,
}

/// Full definition of one KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRule {
    pub kind: KpiKind,
    pub unit: Unit,
    /// Maximum points this KPI contributes to the composite score.
    pub weight: u32,
    pub rules: Vec<BucketRule>,
    /// Bucket when no rule holds.
    pub otherwise: BucketPoints,
    /// Bucket when the KPI has no value. `None` evaluates `otherwise`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmeasured: Option<BucketPoints>,
}

impl KpiRule {
    fn rule(bucket: Bucket, comparison: Comparison, threshold: f64, points: u32) -> BucketRule {
        BucketRule {
            bucket,
            comparison,
            threshold,
            points,
        }
    }

    /// Bucket for a value, or for its absence.
    pub fn classify(&self, value: Option<f64>) -> Bucket {
        match value {
            Some(v) => self
                .rules
                .iter()
                .find(|r| r.comparison.holds(v, r.threshold))
                .map(|r| r.bucket)
                .unwrap_or(self.otherwise.bucket),
            None => self
                .unmeasured
                .map(|u| u.bucket)
                .unwrap_or(self.otherwise.bucket),
        }
    }

    /// Points awarded for a bucket. Buckets foreign to this KPI score 0.
    pub fn points_for(&self, bucket: Bucket) -> u32 {
        self.rules
            .iter()
            .find(|r| r.bucket == bucket)
            .map(|r| r.points)
            .or_else(|| (self.otherwise.bucket == bucket).then_some(self.otherwise.points))
            .or_else(|| {
                self.unmeasured
                    .filter(|u| u.bucket == bucket)
                    .map(|u| u.points)
            })
            .unwrap_or(0)
    }

    fn validate(&self) -> Result<(), String> {
        let name = self.kind.as_str();
        if self.rules.is_empty() {
            return Err(format!("{}: no bucket rules", name));
        }

        let mut awarded: Vec<u32> = self.rules.iter().map(|r| r.points).collect();
        awarded.push(self.otherwise.points);
        if let Some(u) = self.unmeasured {
            if u.points > self.weight {
                return Err(format!("{}: {} awards more than weight", name, u.bucket));
            }
        }
        if awarded.iter().any(|&p| p > self.weight) {
            return Err(format!("{}: a bucket awards more than weight {}", name, self.weight));
        }
        if awarded.windows(2).any(|w| w[0] <= w[1]) {
            return Err(format!("{}: bucket points must strictly decrease", name));
        }

        for pair in self.rules.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = match (a.comparison, b.comparison) {
                (Comparison::GreaterThan, Comparison::GreaterThan) => a.threshold >= b.threshold,
                (Comparison::LessThan, Comparison::LessThan) => a.threshold <= b.threshold,
                _ => false,
            };
            if !ordered {
                return Err(format!("{}: thresholds out of order", name));
            }
        }
        Ok(())
    }
}

/// The complete KPI table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiTable {
    pub kpis: Vec<KpiRule>,
}

impl Default for KpiTable {
    fn default() -> Self {
        use Bucket::*;
        use Comparison::*;

        Self {
            kpis: vec![
                KpiRule {
                    kind: KpiKind::CacheHitRate,
                    unit: Unit::Percent,
                    weight: 40,
                    rules: vec![
                        KpiRule::rule(Excellent, GreaterThan, 80.0, 40),
                        KpiRule::rule(Good, GreaterThan, 50.0, 30),
                        KpiRule::rule(Poor, GreaterThan, 0.0, 15),
                    ],
                    otherwise: BucketPoints {
                        bucket: NotWorking,
                        points: 0,
                    },
                    unmeasured: None,
                },
                KpiRule {
                    kind: KpiKind::StaleReadRate,
                    unit: Unit::Percent,
                    weight: 30,
                    rules: vec![
                        KpiRule::rule(Excellent, LessThan, 0.1, 30),
                        KpiRule::rule(Good, LessThan, 1.0, 20),
                    ],
                    otherwise: BucketPoints {
                        bucket: Poor,
                        points: 5,
                    },
                    unmeasured: None,
                },
                KpiRule {
                    kind: KpiKind::InvalidationSuccessRate,
                    unit: Unit::Percent,
                    weight: 20,
                    rules: vec![
                        KpiRule::rule(Excellent, GreaterThan, 99.0, 20),
                        KpiRule::rule(Good, GreaterThan, 95.0, 15),
                    ],
                    otherwise: BucketPoints {
                        bucket: Poor,
                        points: 5,
                    },
                    unmeasured: Some(BucketPoints {
                        bucket: NotApplicable,
                        points: 10,
                    }),
                },
                KpiRule {
                    kind: KpiKind::InconsistencyWindow,
                    unit: Unit::Milliseconds,
                    weight: 10,
                    rules: vec![
                        KpiRule::rule(Excellent, LessThan, 100.0, 10),
                        KpiRule::rule(Good, LessThan, 1000.0, 7),
                    ],
                    otherwise: BucketPoints {
                        bucket: Slow,
                        points: 3,
                    },
                    unmeasured: Some(BucketPoints {
                        bucket: NotMeasured,
                        points: 5,
                    }),
                },
            ],
        }
    }
}

impl KpiTable {
    pub fn get(&self, kind: KpiKind) -> Option<&KpiRule> {
        self.kpis.iter().find(|k| k.kind == kind)
    }

    pub fn total_weight(&self) -> u32 {
        self.kpis.iter().map(|k| k.weight).sum()
    }

    /// Check the structural invariants of the table.
    pub fn validate(&self) -> Result<(), String> {
        for kind in KpiKind::ALL {
            match self.kpis.iter().filter(|k| k.kind == kind).count() {
                1 => {}
                0 => return Err(format!("{}: missing from KPI table", kind.as_str())),
                _ => return Err(format!("{}: defined more than once", kind.as_str())),
            }
        }
        if self.total_weight() != 100 {
            return Err(format!(
                "KPI weights sum to {}, expected 100",
                self.total_weight()
            ));
        }
        self.kpis.iter().try_for_each(|k| k.validate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(kind: KpiKind) -> KpiRule {
        KpiTable::default().get(kind).cloned().unwrap()
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = KpiTable::default();
        assert_eq!(table.total_weight(), 100);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_cache_hit_buckets() {
        let r = rule(KpiKind::CacheHitRate);
        assert_eq!(r.classify(Some(95.0)), Bucket::Excellent);
        assert_eq!(r.classify(Some(80.0)), Bucket::Good);
        assert_eq!(r.classify(Some(50.0)), Bucket::Poor);
        assert_eq!(r.classify(Some(0.5)), Bucket::Poor);
        assert_eq!(r.classify(Some(0.0)), Bucket::NotWorking);
    }

    #[test]
    fn test_stale_buckets() {
        let r = rule(KpiKind::StaleReadRate);
        assert_eq!(r.classify(Some(0.0)), Bucket::Excellent);
        assert_eq!(r.classify(Some(0.1)), Bucket::Good);
        assert_eq!(r.classify(Some(1.0)), Bucket::Poor);
    }

    #[test]
    fn test_unmeasured_buckets() {
        assert_eq!(
            rule(KpiKind::InvalidationSuccessRate).classify(None),
            Bucket::NotApplicable
        );
        assert_eq!(
            rule(KpiKind::InconsistencyWindow).classify(None),
            Bucket::NotMeasured
        );
        assert_eq!(rule(KpiKind::StaleReadRate).classify(None), Bucket::Poor);
    }

    #[test]
    fn test_points_lookup() {
        let r = rule(KpiKind::InvalidationSuccessRate);
        assert_eq!(r.points_for(Bucket::Excellent), 20);
        assert_eq!(r.points_for(Bucket::Good), 15);
        assert_eq!(r.points_for(Bucket::Poor), 5);
        assert_eq!(r.points_for(Bucket::NotApplicable), 10);
        assert_eq!(r.points_for(Bucket::Slow), 0);
    }

    #[test]
    fn test_points_strictly_increase_with_quality() {
        for kpi in KpiTable::default().kpis {
            let poor = kpi.points_for(Bucket::Poor);
            let good = kpi.points_for(Bucket::Good);
            let excellent = kpi.points_for(Bucket::Excellent);
            assert!(poor < good && good < excellent, "{:?}", kpi.kind);
            assert_eq!(excellent, kpi.weight);
        }
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut table = KpiTable::default();
        table.kpis[0].weight = 50;
        assert!(table.validate().unwrap_err().contains("sum"));
    }

    #[test]
    fn test_validate_rejects_non_monotonic_points() {
        let mut table = KpiTable::default();
        table.kpis[1].rules[1].points = 30;
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_thresholds() {
        let mut table = KpiTable::default();
        table.kpis[0].rules[0].threshold = 40.0;
        assert!(table.validate().unwrap_err().contains("order"));
    }

    #[test]
    fn test_table_json_roundtrip() {
        let table = KpiTable::default();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"NOT_APPLICABLE\""));
        let parsed: KpiTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }
}
