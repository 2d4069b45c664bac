// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ingestion of newline-delimited metric files.
//!
//! A source is a single file, a directory (every `*.jsonl` inside), or a path
//! whose file name contains `*` wildcards. Nothing here fails the batch: bad
//! lines are skipped and counted, missing sources read as empty.

use crate::error::{CachelensError, Result};
use crate::event::{MetricEvent, UNKNOWN_SERVICE};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of metric files inside a source directory.
pub const METRICS_EXTENSION: &str = "jsonl";

/// Service name applied to records that do not carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackService {
    /// Use `"unknown"`.
    #[default]
    Unknown,
    /// Use the stem of the file being read (`catalog.jsonl` -> `catalog`).
    FileStem,
}

/// Line accounting for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub lines: usize,
    pub blank: usize,
    pub malformed: usize,
}

impl IngestStats {
    /// Lines that became events.
    pub fn parsed(&self) -> usize {
        self.lines - self.blank - self.malformed
    }

    fn absorb(&mut self, other: IngestStats) {
        self.files += other.files;
        self.lines += other.lines;
        self.blank += other.blank;
        self.malformed += other.malformed;
    }
}

/// Events read from one source plus accounting.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub events: Vec<MetricEvent>,
    pub stats: IngestStats,
}

impl Ingested {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Split `reader` into raw lines without the trailing `\n` or `\r\n`.
/// Stops at the first read error.
fn raw_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Vec<u8>> {
    reader
        .split(b'\n')
        .enumerate()
        .map_while(|(idx, line)| match line {
            Ok(mut bytes) => {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                Some(bytes)
            }
            Err(e) => {
                // Treat an unreadable tail like a truncated file.
                warn!("Stopped reading at line {}: {}", idx + 1, e);
                None
            }
        })
}

/// Read every line of `reader`. Malformed lines, including lines that are
/// not valid UTF-8, are skipped and counted.
pub fn ingest_reader<R: BufRead>(reader: R, fallback_service: &str) -> Ingested {
    let mut out = Ingested::default();

    for (idx, bytes) in raw_lines(reader).enumerate() {
        out.stats.lines += 1;

        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                debug!(
                    "{}",
                    CachelensError::MalformedRecord {
                        line: idx + 1,
                        reason: e.to_string(),
                    }
                );
                out.stats.malformed += 1;
                continue;
            }
        };

        if line.trim().is_empty() {
            out.stats.blank += 1;
            continue;
        }

        match parse_numbered(&line, idx + 1, fallback_service) {
            Ok(event) => out.events.push(event),
            Err(e) => {
                debug!("{}", e);
                out.stats.malformed += 1;
            }
        }
    }

    out
}

fn parse_numbered(line: &str, number: usize, fallback_service: &str) -> Result<MetricEvent> {
    MetricEvent::from_line_with_service(line, fallback_service).map_err(|e| match e {
        CachelensError::MalformedRecord { reason, .. } => CachelensError::MalformedRecord {
            line: number,
            reason,
        },
        other => other,
    })
}

fn open_source(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CachelensError::MissingSource(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn service_for(path: &Path, fallback: FallbackService) -> String {
    match fallback {
        FallbackService::Unknown => UNKNOWN_SERVICE.to_string(),
        FallbackService::FileStem => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
    }
}

/// Read one file. A missing or unreadable file yields an empty result.
pub fn ingest_file(path: &Path, fallback: FallbackService) -> Ingested {
    match open_source(path) {
        Ok(file) => {
            let mut ingested = ingest_reader(BufReader::new(file), &service_for(path, fallback));
            ingested.stats.files = 1;
            debug!(
                "Read {} events from {} ({} malformed)",
                ingested.events.len(),
                path.display(),
                ingested.stats.malformed
            );
            ingested
        }
        Err(CachelensError::MissingSource(p)) => {
            debug!("Source {} does not exist, treating as empty", p.display());
            Ingested::default()
        }
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            Ingested::default()
        }
    }
}

/// Resolve a source identifier into the files it names, in file-name order.
///
/// Returns an empty list when nothing matches.
pub fn resolve_files(source: &Path) -> Vec<PathBuf> {
    if source.is_file() {
        return vec![source.to_path_buf()];
    }

    if source.is_dir() {
        return list_dir(source, |name| {
            Path::new(name).extension().and_then(|e| e.to_str()) == Some(METRICS_EXTENSION)
        });
    }

    let pattern = match source.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.contains('*') => name.to_string(),
        _ => return Vec::new(),
    };
    let parent = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    list_dir(&parent, |name| wildcard_match(&pattern, name))
}

fn list_dir(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(&keep)
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Match `name` against a pattern where `*` matches any run of characters.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !name.starts_with(first) || name.len() < first.len() + last.len() {
        return false;
    }

    let mut rest = &name[first.len()..];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Read every file named by `source` and concatenate their events.
pub fn ingest_source(source: &Path, fallback: FallbackService) -> Ingested {
    let mut out = Ingested::default();
    for file in resolve_files(source) {
        let ingested = ingest_file(&file, fallback);
        out.events.extend(ingested.events);
        out.stats.absorb(ingested.stats);
    }
    out
}

/// Whether `source` holds at least one parsable record. Stops at the first.
pub fn has_parsable_record(source: &Path) -> bool {
    resolve_files(source).iter().any(|file| {
        let reader = match open_source(file) {
            Ok(f) => BufReader::new(f),
            Err(_) => return false,
        };
        raw_lines(reader)
            .filter_map(|bytes| String::from_utf8(bytes).ok())
            .filter(|line| !line.trim().is_empty())
            .any(|line| MetricEvent::from_line(&line).is_ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reader_skips_bad_lines() {
        let data = concat!(
            "{\"service\":\"catalog\",\"metric\":\"cache_hits\",\"value\":5}\n",
            "garbage\n",
            "\n",
            "{\"service\":\"catalog\",\"metric\":\"cache_misses\",\"value\":1}\n",
            "{\"metric\":\"cache_hits\",\"value\":\n",
        );
        let ingested = ingest_reader(Cursor::new(data), "unknown");

        assert_eq!(ingested.events.len(), 2);
        assert_eq!(ingested.stats.lines, 5);
        assert_eq!(ingested.stats.blank, 1);
        assert_eq!(ingested.stats.malformed, 2);
        assert_eq!(ingested.stats.parsed(), 2);
        assert_eq!(ingested.events[1].metric, "cache_misses");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ingested = ingest_file(&dir.path().join("nope.jsonl"), FallbackService::Unknown);
        assert!(ingested.is_empty());
        assert_eq!(ingested.stats, IngestStats::default());
    }

    #[test]
    fn test_file_stem_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "gateway.jsonl", "{\"metric\":\"requests\",\"value\":3}\n");

        let ingested = ingest_file(&path, FallbackService::FileStem);
        assert_eq!(ingested.events[0].service, "gateway");

        let ingested = ingest_file(&path, FallbackService::Unknown);
        assert_eq!(ingested.events[0].service, "unknown");
    }

    #[test]
    fn test_directory_source_reads_jsonl_only() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "b.jsonl", "{\"metric\":\"b\",\"value\":1}\n");
        write_file(dir.path(), "a.jsonl", "{\"metric\":\"a\",\"value\":1}\n");
        write_file(dir.path(), "notes.txt", "{\"metric\":\"txt\",\"value\":1}\n");

        let ingested = ingest_source(dir.path(), FallbackService::Unknown);
        let metrics: Vec<&str> = ingested.events.iter().map(|e| e.metric.as_str()).collect();
        assert_eq!(metrics, vec!["a", "b"]);
        assert_eq!(ingested.stats.files, 2);
    }

    #[test]
    fn test_wildcard_source() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "catalog-1.jsonl", "{\"metric\":\"x\",\"value\":1}\n");
        write_file(dir.path(), "catalog-2.jsonl", "{\"metric\":\"y\",\"value\":1}\n");
        write_file(dir.path(), "orders.jsonl", "{\"metric\":\"z\",\"value\":1}\n");

        let ingested = ingest_source(&dir.path().join("catalog-*.jsonl"), FallbackService::Unknown);
        assert_eq!(ingested.events.len(), 2);
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.jsonl", "catalog.jsonl"));
        assert!(wildcard_match("cat*log*", "catalog.jsonl"));
        assert!(wildcard_match("exact.jsonl", "exact.jsonl"));
        assert!(!wildcard_match("*.jsonl", "catalog.json"));
        assert!(!wildcard_match("a*a", "a"));
    }

    #[test]
    fn test_has_parsable_record() {
        let dir = TempDir::new().unwrap();
        let empty = write_file(dir.path(), "empty.jsonl", "");
        let junk = write_file(dir.path(), "junk.jsonl", "junk\n\n{broken\n");
        let good = write_file(dir.path(), "good.jsonl", "junk\n{\"metric\":\"x\",\"value\":1}\n");

        assert!(!has_parsable_record(&empty));
        assert!(!has_parsable_record(&junk));
        assert!(has_parsable_record(&good));
        assert!(!has_parsable_record(&dir.path().join("absent.jsonl")));
    }

    fn write_bytes(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reader_continues_after_invalid_utf8() {
        let mut data = Vec::new();
        data.extend_from_slice(b"{\"service\":\"catalog\",\"metric\":\"cache_hits\",\"value\":5}\n");
        data.extend_from_slice(b"{\"metric\":\"\xff\xfe\",\"value\":1}\n");
        data.extend_from_slice(b"{\"service\":\"catalog\",\"metric\":\"cache_misses\",\"value\":1}\r\n");
        let ingested = ingest_reader(Cursor::new(data), "unknown");

        assert_eq!(ingested.events.len(), 2);
        assert_eq!(ingested.stats.lines, 3);
        assert_eq!(ingested.stats.malformed, 1);
        assert_eq!(ingested.events[1].metric, "cache_misses");
    }

    #[test]
    fn test_has_parsable_record_after_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = write_bytes(
            dir.path(),
            "mixed.jsonl",
            b"\xff\xfe\n{\"metric\":\"x\",\"value\":1}\n",
        );
        assert!(has_parsable_record(&path));

        let only_bad = write_bytes(dir.path(), "bad.jsonl", b"\xff\n\xc3\x28\n");
        assert!(!has_parsable_record(&only_bad));
    }
}
