// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Scenario discovery against generated result stores.

use cachelens::*;
use cachelens_testdata::{generate_lines, GeneratorConfig, ScenarioProfile, StoreBuilder};
use tempfile::TempDir;

fn lines(id: &str) -> Vec<cachelens_testdata::MetricLine> {
    let profile = ScenarioProfile::preset(id).unwrap().with_requests(500);
    generate_lines(&profile, &GeneratorConfig::new().with_seed(3)).unwrap()
}

#[test]
fn newest_usable_run_wins() {
    let tmp = TempDir::new().unwrap();
    let store = StoreBuilder::new(tmp.path());
    store.write_scenario("20250110_120000", "A", &lines("A")).unwrap();
    store.write_scenario("20250112_120000", "A", &lines("A")).unwrap();
    // Newest run of A is corrupt and must be passed over.
    store.write_raw("20250114_120000", "A", "{oops\n\n").unwrap();
    store.write_scenario("20250114_120000", "B", &lines("B")).unwrap();

    let locator = ScenarioLocator::new(tmp.path(), tmp.path().join("live"));
    let outcome = locator.locate(&["A", "B", "C"]);

    assert_eq!(outcome.get("A").unwrap().discovered_at, "20250112_120000");
    assert_eq!(outcome.get("B").unwrap().discovered_at, "20250114_120000");
    assert_eq!(outcome.missing, vec!["C"]);
}

#[test]
fn undecodable_first_line_does_not_hide_a_run() {
    let tmp = TempDir::new().unwrap();
    let store = StoreBuilder::new(tmp.path());
    store.write_scenario("20250110_120000", "B", &lines("B")).unwrap();

    let dir = store.scenario_dir("20250114_120000", "B");
    std::fs::create_dir_all(&dir).unwrap();
    let mut content = b"\xff\xfe not utf-8\n".to_vec();
    content.extend_from_slice(br#"{"service":"catalog","metric":"cache_hits","value":7}"#);
    content.push(b'\n');
    std::fs::write(dir.join("catalog.jsonl"), content).unwrap();

    let outcome = ScenarioLocator::new(tmp.path(), tmp.path().join("live")).locate(&["B"]);
    let run = outcome.get("B").unwrap();
    assert_eq!(run.discovered_at, "20250114_120000");

    let analysis = Analyzer::default().analyze(run);
    assert_eq!(analysis.stats.malformed, 1);
    assert_eq!(analysis.kpis.cache.hits, 7.0);
}

#[test]
fn empty_timestamp_dirs_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let store = StoreBuilder::new(tmp.path());
    store.write_scenario("20250110_120000", "C", &lines("C")).unwrap();
    store.write_empty_run("20250115_000000").unwrap();

    let outcome = ScenarioLocator::new(tmp.path(), tmp.path().join("live")).locate(&["c"]);
    assert_eq!(outcome.runs.len(), 1);
    assert_eq!(outcome.runs[0].id, "C");
    assert_eq!(outcome.runs[0].discovered_at, "20250110_120000");
}

#[test]
fn missing_store_falls_back_to_live_data() {
    let tmp = TempDir::new().unwrap();
    let live = tmp.path().join("live");
    StoreBuilder::write_live(&live, &lines("C")).unwrap();

    let locator = ScenarioLocator::new(tmp.path().join("no-such-store"), &live);
    assert!(locator.locate_all().runs.is_empty());

    let outcome = locator.locate_all_or_current();
    assert_eq!(outcome.runs.len(), 1);
    assert!(outcome.runs[0].is_current());

    let analysis = Analyzer::default().analyze(&outcome.runs[0]);
    assert!(!analysis.is_empty());
}

#[test]
fn no_fallback_without_live_data() {
    let tmp = TempDir::new().unwrap();
    let locator = ScenarioLocator::new(tmp.path(), tmp.path().join("live"));
    let outcome = locator.locate_or_current(&["A"]);
    assert!(outcome.runs.is_empty());
    assert_eq!(outcome.missing, vec!["A"]);
}

#[test]
fn generated_presets_rank_in_comparison() {
    let tmp = TempDir::new().unwrap();
    let store = StoreBuilder::new(tmp.path());
    for id in ["A", "B", "C"] {
        store.write_scenario("20250114_120000", id, &lines(id)).unwrap();
    }

    let config = AnalysisConfig::default();
    let outcome = ScenarioLocator::new(tmp.path(), tmp.path().join("live")).locate_all();
    let analyses = Analyzer::new(config.clone()).analyze_all(&outcome.runs);
    let comparison = ScenarioComparison::new(&analyses, &config.scenarios.full_system);

    assert!(matches!(comparison.best_cache.as_deref(), Some("B") | Some("C")));
    // A never caches, so it never serves stale data either.
    assert_ne!(comparison.best_consistency.as_deref(), Some("B"));
    assert_eq!(comparison.full_system.as_deref(), Some("C"));

    let a = analyses.iter().find(|a| a.id() == "A").unwrap();
    assert_eq!(a.kpis.bucket(KpiKind::CacheHitRate), Some(Bucket::NotWorking));
    assert!(!a.score.verdict.is_ready());
}
