// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Report rendering.
//!
//! Rendering only formats what the analyzer already computed: it reads a
//! [`ReportInput`] and produces an ordered list of text lines.

use crate::compare::ScenarioComparison;
use crate::config::ScenarioConfig;
use crate::engine::ScenarioAnalysis;
use crate::kpi::KpiSet;
use crate::score::Score;
use crate::thresholds::{Bucket, KpiKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

const WIDTH: usize = 80;

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Live source only.
    Current,
    /// Every scenario found in the result store.
    Comparison,
    /// Live source plus the latest run of each requested scenario.
    Latest,
}

impl ReportKind {
    /// File name prefix used when persisting.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Current => "current-report",
            ReportKind::Comparison => "scenario-comparison",
            ReportKind::Latest => "latest-comprehensive-report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Current => "CURRENT SYSTEM METRICS REPORT",
            ReportKind::Comparison => "SCENARIO COMPARISON REPORT",
            ReportKind::Latest => "LATEST TEST RESULTS - COMPREHENSIVE REPORT",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub generated_at: NaiveDateTime,
    pub lines: Vec<String>,
}

impl Report {
    /// Lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A requested scenario with no usable run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingScenario {
    pub id: String,
    pub description: String,
}

/// Everything a report shows, computed up front.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub generated_at: NaiveDateTime,
    pub current: Option<ScenarioAnalysis>,
    /// Scenario analyses ordered by identifier.
    pub scenarios: Vec<ScenarioAnalysis>,
    pub missing: Vec<MissingScenario>,
    pub comparison: ScenarioComparison,
}

impl ReportInput {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self {
            generated_at,
            current: None,
            scenarios: Vec::new(),
            missing: Vec::new(),
            comparison: ScenarioComparison::default(),
        }
    }

    pub fn with_current(mut self, current: ScenarioAnalysis) -> Self {
        self.current = Some(current);
        self
    }

    /// Attach scenario analyses and the identifiers that were not found.
    /// Also computes the cross-scenario comparison.
    pub fn with_scenarios(
        mut self,
        mut analyses: Vec<ScenarioAnalysis>,
        missing: &[String],
        scenarios: &ScenarioConfig,
    ) -> Self {
        analyses.sort_by(|a, b| a.id().cmp(b.id()));
        self.comparison = ScenarioComparison::new(&analyses, &scenarios.full_system);
        self.scenarios = analyses;
        self.missing = missing
            .iter()
            .map(|id| MissingScenario {
                id: id.clone(),
                description: scenarios.describe(id),
            })
            .collect();
        self
    }

    fn scenario(&self, id: &str) -> Option<&ScenarioAnalysis> {
        self.scenarios.iter().find(|a| a.id() == id)
    }
}

/// Render one report kind.
pub fn render(kind: ReportKind, input: &ReportInput) -> Report {
    let mut out = Lines::default();
    out.banner(&format!("CACHELENS {}", kind.title()));
    out.push(format!(
        "Generated: {}",
        input.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.blank();

    match kind {
        ReportKind::Current => render_current(&mut out, input),
        ReportKind::Comparison => render_comparison(&mut out, input),
        ReportKind::Latest => render_latest(&mut out, input),
    }

    out.blank();
    out.banner("Report generation complete");

    Report {
        kind,
        generated_at: input.generated_at,
        lines: out.0,
    }
}

fn render_current(out: &mut Lines, input: &ReportInput) {
    match input.current.as_ref().filter(|c| !c.is_empty()) {
        Some(current) => {
            out.banner("CURRENT SYSTEM PERFORMANCE");
            out.blank();
            details(out, &current.kpis);
            assessment(out, &current.score);
        }
        None => no_current_data(out),
    }
}

fn render_comparison(out: &mut Lines, input: &ReportInput) {
    if input.scenarios.is_empty() {
        out.push("No scenario results found.");
        out.push("Run the scenario tests to populate the result store.");
        return;
    }

    out.push(format!("Found {} scenario result(s)", input.scenarios.len()));
    for a in &input.scenarios {
        out.push(format!(
            "  Scenario {}: {} ({})",
            a.id(),
            a.description,
            a.run.discovered_at
        ));
    }
    out.blank();

    if input.scenarios.len() > 1 {
        comparison_table(out, &input.scenarios);
    }

    for a in &input.scenarios {
        out.banner(&format!("DETAILED ANALYSIS - SCENARIO {}", a.id()));
        out.push(a.description.as_str());
        out.blank();
        scenario_body(out, a);
    }

    out.banner("PERFORMANCE INSIGHTS & RECOMMENDATIONS");
    out.blank();
    if input.scenarios.len() > 1 {
        insights(out, input);
    } else if let Some(only) = input.scenarios.first() {
        out.push(format!("SINGLE SCENARIO ANALYSIS: {}", only.id()));
        out.push(format!(
            "  Cache Performance: {}",
            bucket_label(&only.kpis, KpiKind::CacheHitRate)
        ));
        out.push(format!(
            "  Data Consistency: {}",
            bucket_label(&only.kpis, KpiKind::StaleReadRate)
        ));
        out.push(format!("  {}", only.score.verdict.message()));
    }
}

fn render_latest(out: &mut Lines, input: &ReportInput) {
    out.push("PART 1: CURRENT SYSTEM ANALYSIS");
    out.rule('=');
    match input.current.as_ref().filter(|c| !c.is_empty()) {
        Some(current) => {
            details(out, &current.kpis);
            assessment(out, &current.score);
        }
        None => no_current_data(out),
    }
    out.blank();

    out.push("PART 2: LATEST SCENARIO TEST COMPARISON");
    out.rule('=');
    if input.scenarios.is_empty() {
        out.push("No recent scenario test results found.");
        out.push("Run the scenario tests first.");
        if !input.missing.is_empty() {
            let ids: Vec<&str> = input.missing.iter().map(|m| m.id.as_str()).collect();
            out.push(format!("Not found: {}", ids.join(", ")));
        }
        out.blank();
    } else {
        out.push("LATEST SCENARIO TEST RESULTS:");
        for row in latest_rows(input) {
            match row {
                Row::Found(a) => out.push(format!(
                    "  Scenario {}: {}",
                    a.id(),
                    a.run.discovered_at
                )),
                Row::Missing(m) => out.push(format!("  Scenario {}: not found", m.id)),
            }
        }
        out.push(format!("Found {} scenario result(s)", input.scenarios.len()));
        out.blank();

        if input.scenarios.len() > 1 {
            comparison_table(out, &input.scenarios);
        }

        out.banner("DETAILED SCENARIO ANALYSIS");
        for row in latest_rows(input) {
            match row {
                Row::Found(a) => {
                    out.push(format!("SCENARIO {}: {}", a.id(), a.description));
                    out.rule('-');
                    scenario_body(out, a);
                }
                Row::Missing(m) => {
                    out.push(format!("SCENARIO {}: {}", m.id, m.description));
                    out.rule('-');
                    out.push("  No test data found for this scenario");
                    out.blank();
                }
            }
        }

        full_system_summary(out, input, "RECOMMENDED CONFIGURATION");
    }

    out.push("PART 3: SUMMARY & RECOMMENDATIONS");
    out.rule('=');
    let current = input.current.as_ref().filter(|c| !c.is_empty());
    match (current, input.scenarios.is_empty()) {
        (Some(current), false) => {
            out.push("SYSTEM STATUS: Operational with scenario test validation");
            out.blank();
            out.push("FINAL RECOMMENDATION:");
            out.push(format!(
                "  Current score {}/100 - {}",
                current.score.points,
                current.score.verdict.message()
            ));
            if current.score.verdict.is_ready() {
                out.push("  Ready to deploy.");
            } else {
                out.push("  Address the issues identified above before deploying.");
            }
        }
        (Some(_), true) => out.push(
            "PARTIAL ANALYSIS: Current system data available, but no scenario tests found",
        ),
        (None, false) => out.push(
            "PARTIAL ANALYSIS: Scenario test data available, but no current system metrics",
        ),
        (None, true) => {
            out.push("INSUFFICIENT DATA: No current metrics or scenario test results found")
        }
    }
}

enum Row<'a> {
    Found(&'a ScenarioAnalysis),
    Missing(&'a MissingScenario),
}

/// Found and missing scenarios merged in identifier order.
fn latest_rows(input: &ReportInput) -> Vec<Row<'_>> {
    let mut rows: Vec<(&str, Row<'_>)> = input
        .scenarios
        .iter()
        .map(|a| (a.id(), Row::Found(a)))
        .chain(input.missing.iter().map(|m| (m.id.as_str(), Row::Missing(m))))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

fn no_current_data(out: &mut Lines) {
    out.push("No current metrics found (no data).");
    out.push("Make sure the service is running and emitting metrics.");
}

fn scenario_body(out: &mut Lines, analysis: &ScenarioAnalysis) {
    if analysis.is_empty() {
        out.push("  No usable records (no data)");
        out.blank();
        return;
    }
    details(out, &analysis.kpis);
    assessment(out, &analysis.score);
}

/// Per-KPI breakdown of one dataset.
fn details(out: &mut Lines, kpis: &KpiSet) {
    out.push("CACHE PERFORMANCE:");
    out.field("Cache Hits", thousands(kpis.cache.hits));
    out.field("Cache Misses", thousands(kpis.cache.misses));
    out.field("Total Requests", thousands(kpis.cache.total));
    out.field("Hit Rate", format!("{:.2}%", kpis.cache.hit_rate));
    out.field("Assessment", bucket_label(kpis, KpiKind::CacheHitRate));
    out.blank();

    if !kpis.latencies.is_empty() {
        out.push("LATENCY PERFORMANCE:");
        for latency in &kpis.latencies {
            let s = &latency.summary;
            out.push(format!("  {}:", latency.key));
            out.sub_field("p50", format!("{:.2} ms", s.p50));
            out.sub_field("p95", format!("{:.2} ms", s.p95));
            out.sub_field("Average", format!("{:.2} ms", s.mean));
            out.sub_field("Samples", thousands(s.count as f64));
        }
        out.blank();
    }

    out.push("DATA CONSISTENCY:");
    out.field("Stale Reads", thousands(kpis.stale.count));
    out.field("Stale Rate", format!("{:.3}%", kpis.stale.rate));
    out.field("Assessment", bucket_label(kpis, KpiKind::StaleReadRate));
    out.blank();

    out.push("INVALIDATION PERFORMANCE:");
    match kpis.invalidation.success_rate {
        Some(success) => {
            out.field("Invalidations Sent", thousands(kpis.invalidation.sent));
            out.field("Invalidations Rcvd", thousands(kpis.invalidation.received));
            out.field("Success Rate", format!("{:.2}%", success));
        }
        None => out.field("Success Rate", "N/A (no invalidations sent)"),
    }
    out.field("Assessment", bucket_label(kpis, KpiKind::InvalidationSuccessRate));
    out.blank();

    out.push("INCONSISTENCY WINDOW:");
    match &kpis.inconsistency {
        Some(s) => {
            out.field("p50", format!("{:.2} ms", s.p50));
            out.field("p95", format!("{:.2} ms", s.p95));
            out.field("Samples", thousands(s.count as f64));
        }
        None => out.field("p95", "N/A (no samples)"),
    }
    out.field("Assessment", bucket_label(kpis, KpiKind::InconsistencyWindow));
    out.blank();
}

fn assessment(out: &mut Lines, score: &Score) {
    out.push("SCORE BREAKDOWN:");
    for c in &score.components {
        out.push(format!(
            "  {} ({}%): {} ({}/{})",
            c.kind.score_component(),
            c.weight,
            c.bucket.label(),
            c.points,
            c.weight
        ));
    }
    out.rule('-');
    out.push(format!("OVERALL SCORE: {}/100", score.points));
    out.push(format!("VERDICT: {}", score.verdict.message()));
    out.blank();
}

fn bucket_label(kpis: &KpiSet, kind: KpiKind) -> &'static str {
    kpis.bucket(kind).map(|b| b.label()).unwrap_or("N/A")
}

/// KPI rows by scenario columns.
fn comparison_table(out: &mut Lines, analyses: &[ScenarioAnalysis]) {
    out.push("PERFORMANCE COMPARISON");
    out.rule('-');
    let header: Vec<String> = analyses
        .iter()
        .map(|a| format!("{:>10}", format!("Scn {}", a.id())))
        .collect();
    out.push(format!("{:<25} {:<8} {}", "Metric", "Unit", header.join(" ")));
    out.rule('-');

    table_row(out, analyses, "Cache Hit Rate", "%", |a| {
        Some(format!("{:.1}", a.kpis.cache.hit_rate))
    });
    table_row(out, analyses, "Total Requests", "count", |a| {
        Some(compact_count(a.kpis.cache.total))
    });
    table_row(out, analyses, "Stale Read Rate", "%", |a| {
        Some(format!("{:.3}", a.kpis.stale.rate))
    });
    table_row(out, analyses, "Latency p95", "ms", |a| {
        a.kpis
            .primary_latency()
            .map(|l| format!("{:.1}", l.summary.p95))
    });
    table_row(out, analyses, "Inconsistency p95", "ms", |a| {
        a.kpis.inconsistency.map(|s| format!("{:.1}", s.p95))
    });
    table_row(out, analyses, "Invalidation Success", "%", |a| {
        a.kpis.invalidation.success_rate.map(|r| format!("{:.2}", r))
    });
    table_row(out, analyses, "Score", "/100", |a| {
        Some(a.score.points.to_string())
    });
    out.rule('-');
    out.blank();
}

/// One table row. Empty analyses and unmeasured values show `N/A`.
fn table_row<F>(out: &mut Lines, analyses: &[ScenarioAnalysis], name: &str, unit: &str, cell: F)
where
    F: Fn(&ScenarioAnalysis) -> Option<String>,
{
    let cells: Vec<String> = analyses
        .iter()
        .map(|a| {
            let text = if a.is_empty() { None } else { cell(a) };
            format!("{:>10}", text.unwrap_or_else(|| "N/A".to_string()))
        })
        .collect();
    out.push(format!("{:<25} {:<8} {}", name, unit, cells.join(" ")));
}

fn insights(out: &mut Lines, input: &ReportInput) {
    let cmp = &input.comparison;
    if let Some(best) = cmp.best_cache.as_deref().and_then(|id| input.scenario(id)) {
        out.push(format!("BEST CACHE PERFORMANCE: Scenario {}", best.id()));
        out.push(format!("  Hit Rate: {:.2}%", best.kpis.cache.hit_rate));
        out.blank();
    }
    if let Some(best) = cmp
        .best_consistency
        .as_deref()
        .and_then(|id| input.scenario(id))
    {
        out.push(format!("BEST CONSISTENCY: Scenario {}", best.id()));
        out.push(format!("  Stale Rate: {:.3}%", best.kpis.stale.rate));
        out.blank();
    }
    full_system_summary(out, input, "OVERALL ASSESSMENT");
}

/// Recommendation based on the full-system scenario, when it was analyzed.
fn full_system_summary(out: &mut Lines, input: &ReportInput, heading: &str) {
    let full = match input
        .comparison
        .full_system
        .as_deref()
        .and_then(|id| input.scenario(id))
        .filter(|a| !a.is_empty())
    {
        Some(full) => full,
        None => return,
    };

    out.push(format!("{}:", heading));
    out.push(format!("  Scenario {} ({}) provides:", full.id(), full.description));
    out.push(format!("  - Cache Hit Rate: {:.2}%", full.kpis.cache.hit_rate));
    out.push(format!("  - Stale Read Rate: {:.3}%", full.kpis.stale.rate));
    match full.kpis.invalidation.success_rate {
        Some(rate) => out.push(format!("  - Invalidation Success: {:.2}%", rate)),
        None => out.push("  - Invalidation Success: N/A"),
    }
    out.push(format!(
        "  - Total Requests: {}",
        thousands(full.kpis.cache.total)
    ));
    out.blank();
    out.push(format!(
        "RECOMMENDATION: {} ({}/100)",
        full.score.verdict.message(),
        full.score.points
    ));
    if full.kpis.bucket(KpiKind::CacheHitRate) == Some(Bucket::NotWorking) {
        out.push("  Cache is not serving hits; check cache configuration.");
    }
    out.blank();
}

/// Integer part of `value` with `,` thousands separators.
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Short count for table cells: `1.2M`, `45.0K`, `812`.
pub fn compact_count(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    fn blank(&mut self) {
        self.0.push(String::new());
    }

    fn rule(&mut self, ch: char) {
        self.0.push(ch.to_string().repeat(WIDTH));
    }

    fn banner(&mut self, title: &str) {
        self.rule('=');
        self.push(title);
        self.rule('=');
    }

    fn field(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .push(format!("  {:<22}{}", format!("{}:", name), value.into()));
    }

    fn sub_field(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .push(format!("    {:<20}{}", format!("{}:", name), value.into()));
    }
}
