// Cachelens CLI - Report pipeline
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Builds report inputs for each report kind and publishes the result.

use cachelens::{
    AnalysisConfig, Analyzer, FallbackService, Report, ReportInput, ReportKind, ReportWriter,
    ScenarioAnalysis, ScenarioLocator,
};
use chrono::NaiveDateTime;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Inputs of one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub metrics_dir: PathBuf,
    pub results_dir: PathBuf,
    pub config: AnalysisConfig,
    /// Scenario identifiers for the latest-results report.
    pub requested: Vec<String>,
    pub fallback: FallbackService,
}

impl RunOptions {
    pub fn new(metrics_dir: PathBuf, results_dir: PathBuf, config: AnalysisConfig) -> Self {
        let requested = config.scenarios.requested.clone();
        Self {
            metrics_dir,
            results_dir,
            config,
            requested,
            fallback: FallbackService::default(),
        }
    }
}

/// Every analysis a report needs, computed up front.
pub fn build_input(kind: ReportKind, opts: &RunOptions, now: NaiveDateTime) -> ReportInput {
    let scenarios = &opts.config.scenarios;
    let analyzer = Analyzer::new(opts.config.clone()).with_fallback_service(opts.fallback);
    let locator = ScenarioLocator::new(&opts.results_dir, &opts.metrics_dir)
        .with_current_label(&scenarios.current_label);

    let input = ReportInput::new(now);
    match kind {
        ReportKind::Current => input.with_current(analyzer.analyze(&locator.current_run())),
        ReportKind::Comparison => {
            let outcome = locator.locate_all_or_current();
            info!("Comparing {} scenario run(s)", outcome.runs.len());
            input.with_scenarios(analyzer.analyze_all(&outcome.runs), &[], scenarios)
        }
        ReportKind::Latest => {
            let outcome = locator.locate(&opts.requested);
            input
                .with_current(analyzer.analyze(&locator.current_run()))
                .with_scenarios(
                    analyzer.analyze_all(&outcome.runs),
                    &outcome.missing,
                    scenarios,
                )
        }
    }
}

/// Analyses to export: scenarios when present, else the current run.
pub fn exported_analyses(input: &ReportInput) -> Vec<ScenarioAnalysis> {
    let mut out: Vec<ScenarioAnalysis> = input.current.iter().cloned().collect();
    out.extend(input.scenarios.iter().cloned());
    out
}

/// Print the report, then try to save it. A failed save is a warning.
pub fn publish<W: Write>(
    report: &Report,
    writer: Option<&ReportWriter>,
    out: &mut W,
) -> io::Result<Option<PathBuf>> {
    for line in &report.lines {
        writeln!(out, "{}", line)?;
    }

    let writer = match writer {
        Some(w) => w,
        None => return Ok(None),
    };

    match writer.persist(report) {
        Ok(path) => {
            writeln!(out)?;
            writeln!(out, "Report saved to: {}", path.display())?;
            Ok(Some(path))
        }
        Err(e) => {
            warn!("{}", e);
            writeln!(out)?;
            writeln!(out, "Could not save report: {}", e)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachelens_testdata::{generate_lines, GeneratorConfig, ScenarioProfile, StoreBuilder};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn build_report(kind: ReportKind, opts: &RunOptions, now: NaiveDateTime) -> Report {
        cachelens::render(kind, &build_input(kind, opts, now))
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    struct Fixture {
        _tmp: TempDir,
        opts: RunOptions,
    }

    fn fixture(scenarios: &[&str], live: bool) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let store = StoreBuilder::new(tmp.path().join("results"));
        let config = GeneratorConfig::new().with_seed(9);
        for id in scenarios {
            let profile = ScenarioProfile::preset(id).unwrap().with_requests(1_000);
            let lines = generate_lines(&profile, &config).unwrap();
            store.write_scenario("20250114_093000", id, &lines).unwrap();
        }
        let metrics_dir = tmp.path().join("metrics");
        if live {
            let lines = generate_lines(&ScenarioProfile::ttl_invalidate(), &config).unwrap();
            StoreBuilder::write_live(&metrics_dir, &lines).unwrap();
        }
        let opts = RunOptions::new(
            metrics_dir,
            tmp.path().join("results"),
            AnalysisConfig::default(),
        );
        Fixture { _tmp: tmp, opts }
    }

    #[test]
    fn test_latest_with_partial_store() {
        let f = fixture(&["A", "C"], true);
        let input = build_input(ReportKind::Latest, &f.opts, now());

        assert!(input.current.as_ref().is_some_and(|c| !c.is_empty()));
        let ids: Vec<&str> = input.scenarios.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(input.missing.len(), 1);
        assert_eq!(input.missing[0].id, "B");
        assert_eq!(input.comparison.full_system.as_deref(), Some("C"));
    }

    #[test]
    fn test_comparison_falls_back_to_current() {
        let f = fixture(&[], true);
        let input = build_input(ReportKind::Comparison, &f.opts, now());
        assert_eq!(input.scenarios.len(), 1);
        assert_eq!(input.scenarios[0].id(), "CURRENT");
    }

    #[test]
    fn test_current_without_metrics() {
        let f = fixture(&[], false);
        let report = build_report(ReportKind::Current, &f.opts, now());
        assert!(report.text().contains("No current metrics found"));
    }

    #[test]
    fn test_publish_saves_and_prints() {
        let f = fixture(&["B", "C"], false);
        let report = build_report(ReportKind::Comparison, &f.opts, now());
        let reports = TempDir::new().unwrap();
        let writer = ReportWriter::new(reports.path());

        let mut out = Vec::new();
        let saved = publish(&report, Some(&writer), &mut out).unwrap().unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert!(printed.starts_with(&report.lines[0]));
        assert!(printed.contains("Report saved to:"));
        assert_eq!(
            fs::read_to_string(saved).unwrap(),
            format!("{}\n", report.text())
        );
    }

    #[test]
    fn test_publish_survives_unwritable_dir() {
        let f = fixture(&["A"], false);
        let report = build_report(ReportKind::Comparison, &f.opts, now());
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let mut out = Vec::new();
        let saved = publish(&report, Some(&ReportWriter::new(blocker.join("r"))), &mut out).unwrap();
        assert!(saved.is_none());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Could not save report"));
        assert!(printed.contains("SCENARIO COMPARISON REPORT"));
    }

    #[test]
    fn test_exported_analyses() {
        let f = fixture(&["A"], true);
        let input = build_input(ReportKind::Latest, &f.opts, now());
        let ids: Vec<String> = exported_analyses(&input)
            .iter()
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(ids, vec!["CURRENT", "A"]);
    }
}
