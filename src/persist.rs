// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Report persistence.

use crate::error::{CachelensError, Result};
use crate::report::Report;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Attempts before giving up on a unique file name.
const MAX_SUFFIX: u32 = 1000;

/// Writes rendered reports into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<slug>-<YYYYmmdd_HHMMSS>` for a report.
    pub fn base_name(report: &Report) -> String {
        format!(
            "{}-{}",
            report.kind.slug(),
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the report and return its path. Never overwrites: a taken name
    /// gets a `-<n>` suffix.
    pub fn persist(&self, report: &Report) -> Result<PathBuf> {
        let persistence = |path: &Path, source: std::io::Error| CachelensError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(|e| persistence(&self.dir, e))?;

        let base = Self::base_name(report);
        let mut contents = report.text();
        contents.push('\n');

        for n in 0..MAX_SUFFIX {
            let name = if n == 0 {
                format!("{}.txt", base)
            } else {
                format!("{}-{}.txt", base, n)
            };
            let path = self.dir.join(name);

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(persistence(&path, e)),
            };
            fill_or_remove(&path, file, contents.as_bytes())
                .map_err(|e| persistence(&path, e))?;

            info!("Report saved to {}", path.display());
            return Ok(path);
        }

        Err(persistence(
            &self.dir.join(format!("{}.txt", base)),
            std::io::Error::new(ErrorKind::AlreadyExists, "no free report file name"),
        ))
    }
}

/// Write `contents` into the freshly created `path`. A failed write removes
/// the file so no truncated report is left behind.
fn fill_or_remove<W: Write>(path: &Path, mut out: W, contents: &[u8]) -> std::io::Result<()> {
    let written = out.write_all(contents).and_then(|_| out.flush());
    if written.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove partial report {}: {}", path.display(), e);
        }
    }
    written
}
