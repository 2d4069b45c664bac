// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Discovery of scenario datasets in a result store.
//!
//! Store layout:
//!
//! ```text
//! <results_root>/
//!   20250114_093000/
//!     scenario-A-metrics/catalog.jsonl
//!     scenario-C-metrics/catalog.jsonl
//!   20250113_171500/
//!     scenario-B-metrics/catalog.jsonl
//! ```
//!
//! Timestamp directories are scanned newest-first (their names sort
//! chronologically). A scenario directory only resolves its identifier when
//! it holds at least one parsable record.

use crate::ingest::has_parsable_record;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identifier given to the live-source fallback.
pub const CURRENT_ID: &str = "CURRENT";

/// `discovered_at` value of the live-source fallback.
pub const CURRENT_DISCOVERED_AT: &str = "current";

const SCENARIO_PREFIX: &str = "scenario-";
const SCENARIO_SUFFIX: &str = "-metrics";

/// One independently analyzable dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub id: String,
    /// File or directory to ingest.
    pub source: PathBuf,
    /// Name of the timestamp directory, or `"current"`.
    pub discovered_at: String,
}

impl ScenarioRun {
    pub fn is_current(&self) -> bool {
        self.discovered_at == CURRENT_DISCOVERED_AT
    }
}

/// Result of a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorOutcome {
    /// Resolved runs, in requested order.
    pub runs: Vec<ScenarioRun>,
    /// Requested identifiers that no directory resolved.
    pub missing: Vec<String>,
}

impl LocatorOutcome {
    pub fn get(&self, id: &str) -> Option<&ScenarioRun> {
        self.runs.iter().find(|r| r.id == id)
    }
}

/// Scenario identifier encoded in a directory name, upper-cased.
pub fn scenario_id_from_dir(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if !lower.starts_with(SCENARIO_PREFIX) || !lower.ends_with(SCENARIO_SUFFIX) {
        return None;
    }
    let start = SCENARIO_PREFIX.len();
    let end = name.len().checked_sub(SCENARIO_SUFFIX.len())?;
    if end <= start {
        return None;
    }
    name.get(start..end).map(|id| id.to_uppercase())
}

/// Finds scenario runs in a result store, with a live-source fallback.
#[derive(Debug, Clone)]
pub struct ScenarioLocator {
    results_root: PathBuf,
    live_source: PathBuf,
    current_label: String,
}

impl ScenarioLocator {
    pub fn new(results_root: impl Into<PathBuf>, live_source: impl Into<PathBuf>) -> Self {
        Self {
            results_root: results_root.into(),
            live_source: live_source.into(),
            current_label: CURRENT_ID.to_string(),
        }
    }

    /// Override the identifier of the live-source fallback.
    pub fn with_current_label(mut self, label: &str) -> Self {
        self.current_label = label.to_string();
        self
    }

    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// The live source as a run, whether or not it holds data.
    pub fn current_run(&self) -> ScenarioRun {
        ScenarioRun {
            id: self.current_label.clone(),
            source: self.live_source.clone(),
            discovered_at: CURRENT_DISCOVERED_AT.to_string(),
        }
    }

    /// Timestamp directories, newest first.
    fn timestamp_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = sorted_subdirs(&self.results_root);
        dirs.reverse();
        dirs
    }

    /// Most recent usable run of each requested identifier.
    pub fn locate<S: AsRef<str>>(&self, ids: &[S]) -> LocatorOutcome {
        let wanted: Vec<String> = ids.iter().map(|id| id.as_ref().to_uppercase()).collect();
        let mut found: Vec<Option<ScenarioRun>> = vec![None; wanted.len()];

        for ts_dir in self.timestamp_dirs() {
            if found.iter().all(|f| f.is_some()) {
                break;
            }
            let discovered_at = dir_name(&ts_dir);

            for scenario_dir in sorted_subdirs(&ts_dir) {
                let id = match scenario_id_from_dir(&dir_name(&scenario_dir)) {
                    Some(id) => id,
                    None => continue,
                };
                let slot = match wanted.iter().position(|w| *w == id) {
                    Some(pos) if found[pos].is_none() => pos,
                    _ => continue,
                };

                if !has_parsable_record(&scenario_dir) {
                    debug!(
                        "Skipping {}: no parsable records",
                        scenario_dir.display()
                    );
                    continue;
                }

                info!("Scenario {} resolved from {}", id, discovered_at);
                found[slot] = Some(ScenarioRun {
                    id,
                    source: scenario_dir,
                    discovered_at: discovered_at.clone(),
                });
            }
        }

        let mut outcome = LocatorOutcome::default();
        for (id, run) in wanted.into_iter().zip(found) {
            match run {
                Some(run) => outcome.runs.push(run),
                None => outcome.missing.push(id),
            }
        }
        outcome
    }

    /// Every scenario identifier present anywhere in the store, sorted.
    pub fn discover_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .timestamp_dirs()
            .iter()
            .flat_map(|ts| sorted_subdirs(ts))
            .filter_map(|dir| scenario_id_from_dir(&dir_name(&dir)))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn locate_all(&self) -> LocatorOutcome {
        self.locate(&self.discover_ids())
    }

    /// [`locate`](Self::locate), falling back to the live source when no
    /// requested identifier resolves and the live source has data.
    pub fn locate_or_current<S: AsRef<str>>(&self, ids: &[S]) -> LocatorOutcome {
        let mut outcome = self.locate(ids);
        if outcome.runs.is_empty() {
            self.push_current(&mut outcome);
        }
        outcome
    }

    /// [`locate_all`](Self::locate_all) with the same fallback.
    pub fn locate_all_or_current(&self) -> LocatorOutcome {
        let mut outcome = self.locate_all();
        if outcome.runs.is_empty() {
            self.push_current(&mut outcome);
        }
        outcome
    }

    fn push_current(&self, outcome: &mut LocatorOutcome) {
        if has_parsable_record(&self.live_source) {
            info!(
                "No scenario results, using live source {}",
                self.live_source.display()
            );
            outcome.runs.push(self.current_run());
        } else {
            debug!("Live source {} has no data", self.live_source.display());
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            debug!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    };
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LINE: &str = "{\"service\":\"catalog\",\"metric\":\"cache_hits\",\"value\":1}\n";

    fn scenario(root: &Path, ts: &str, id: &str, content: &str) -> PathBuf {
        let dir = root.join(ts).join(format!("scenario-{}-metrics", id));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("catalog.jsonl"), content).unwrap();
        dir
    }

    #[test]
    fn test_scenario_id_from_dir() {
        assert_eq!(scenario_id_from_dir("scenario-A-metrics"), Some("A".into()));
        assert_eq!(scenario_id_from_dir("Scenario-b-Metrics"), Some("B".into()));
        assert_eq!(scenario_id_from_dir("scenario--metrics"), None);
        assert_eq!(scenario_id_from_dir("scenario-metrics"), None);
        assert_eq!(scenario_id_from_dir("logs"), None);
    }

    #[test]
    fn test_newest_wins() {
        let store = TempDir::new().unwrap();
        scenario(store.path(), "20250101_100000", "A", LINE);
        let newer = scenario(store.path(), "20250102_100000", "A", LINE);

        let locator = ScenarioLocator::new(store.path(), store.path().join("live"));
        let outcome = locator.locate(&["A"]);
        assert_eq!(outcome.runs.len(), 1);
        assert_eq!(outcome.runs[0].source, newer);
        assert_eq!(outcome.runs[0].discovered_at, "20250102_100000");
    }

    #[test]
    fn test_unparsable_newer_dir_is_skipped() {
        let store = TempDir::new().unwrap();
        let older = scenario(store.path(), "20250101_100000", "B", LINE);
        scenario(store.path(), "20250102_100000", "B", "");
        scenario(store.path(), "20250103_100000", "B", "not json\n");

        let locator = ScenarioLocator::new(store.path(), store.path().join("live"));
        let outcome = locator.locate(&["B"]);
        assert_eq!(outcome.runs[0].source, older);
    }

    #[test]
    fn test_missing_ids_and_order() {
        let store = TempDir::new().unwrap();
        scenario(store.path(), "20250101_100000", "C", LINE);
        scenario(store.path(), "20250102_100000", "A", LINE);

        let locator = ScenarioLocator::new(store.path(), store.path().join("live"));
        let outcome = locator.locate(&["a", "B", "C"]);
        let ids: Vec<&str> = outcome.runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(outcome.missing, vec!["B"]);
        assert!(outcome.get("C").is_some());
    }

    #[test]
    fn test_discover_ids() {
        let store = TempDir::new().unwrap();
        scenario(store.path(), "20250101_100000", "C", LINE);
        scenario(store.path(), "20250102_100000", "a", LINE);
        scenario(store.path(), "20250102_100000", "C", LINE);
        fs::write(store.path().join("README"), "not a run").unwrap();

        let locator = ScenarioLocator::new(store.path(), store.path().join("live"));
        assert_eq!(locator.discover_ids(), vec!["A", "C"]);
    }

    #[test]
    fn test_current_fallback() {
        let store = TempDir::new().unwrap();
        let live = TempDir::new().unwrap();
        fs::write(live.path().join("catalog.jsonl"), LINE).unwrap();

        let locator = ScenarioLocator::new(store.path().join("absent"), live.path());
        let outcome = locator.locate_or_current(&["A", "B", "C"]);
        assert_eq!(outcome.runs.len(), 1);
        assert_eq!(outcome.runs[0].id, CURRENT_ID);
        assert!(outcome.runs[0].is_current());
        assert_eq!(outcome.missing.len(), 3);
    }

    #[test]
    fn test_no_fallback_without_live_data() {
        let store = TempDir::new().unwrap();
        let live = TempDir::new().unwrap();
        fs::write(live.path().join("catalog.jsonl"), "\n\n").unwrap();

        let locator = ScenarioLocator::new(store.path(), live.path());
        assert!(locator.locate_all_or_current().runs.is_empty());
    }

    #[test]
    fn test_no_fallback_when_scenarios_exist() {
        let store = TempDir::new().unwrap();
        let live = TempDir::new().unwrap();
        scenario(store.path(), "20250101_100000", "A", LINE);
        fs::write(live.path().join("catalog.jsonl"), LINE).unwrap();

        let locator = ScenarioLocator::new(store.path(), live.path());
        let outcome = locator.locate_all_or_current();
        assert_eq!(outcome.runs.len(), 1);
        assert_eq!(outcome.runs[0].id, "A");
    }
}
