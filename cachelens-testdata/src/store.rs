// Cachelens Testdata - Result store writer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Writes generated lines in the result-store layout:
//! `<root>/<timestamp>/scenario-<ID>-metrics/catalog.jsonl`.

use crate::generator::{to_jsonl, MetricLine};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// File name used for every generated metrics file.
pub const METRICS_FILE: &str = "catalog.jsonl";

/// Builds result stores and live metric directories on disk.
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    root: PathBuf,
}

impl StoreBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one scenario run.
    pub fn scenario_dir(&self, timestamp: &str, id: &str) -> PathBuf {
        self.root
            .join(timestamp)
            .join(format!("scenario-{}-metrics", id))
    }

    /// Write a scenario run and return its metrics file.
    pub fn write_scenario(&self, timestamp: &str, id: &str, lines: &[MetricLine]) -> Result<PathBuf> {
        self.write_raw(timestamp, id, &to_jsonl(lines)?)
    }

    /// Write arbitrary file content for a scenario run (empty or corrupt
    /// files for negative tests).
    pub fn write_raw(&self, timestamp: &str, id: &str, content: &str) -> Result<PathBuf> {
        let dir = self.scenario_dir(timestamp, id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(METRICS_FILE);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create an empty timestamp directory.
    pub fn write_empty_run(&self, timestamp: &str) -> Result<PathBuf> {
        let dir = self.root.join(timestamp);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write a live metrics directory outside the store layout.
    pub fn write_live(dir: &Path, lines: &[MetricLine]) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(METRICS_FILE);
        fs::write(&path, to_jsonl(lines)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_lines, GeneratorConfig, ScenarioProfile};
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let tmp = TempDir::new().unwrap();
        let store = StoreBuilder::new(tmp.path());
        let lines = generate_lines(
            &ScenarioProfile::ttl_only().with_requests(100),
            &GeneratorConfig::new().with_seed(1),
        )
        .unwrap();

        let path = store.write_scenario("20250114_093000", "B", &lines).unwrap();
        assert_eq!(
            path,
            tmp.path()
                .join("20250114_093000")
                .join("scenario-B-metrics")
                .join("catalog.jsonl")
        );
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), lines.len());
    }

    #[test]
    fn test_raw_and_live() {
        let tmp = TempDir::new().unwrap();
        let store = StoreBuilder::new(tmp.path().join("results"));

        let corrupt = store.write_raw("20250101_000000", "A", "{not json\n").unwrap();
        assert_eq!(fs::read_to_string(corrupt).unwrap(), "{not json\n");

        let live = StoreBuilder::write_live(&tmp.path().join("live"), &[]).unwrap();
        assert_eq!(fs::read_to_string(live).unwrap(), "");

        assert!(store.write_empty_run("20250102_000000").unwrap().is_dir());
    }
}
