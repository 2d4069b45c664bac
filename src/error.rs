// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for Cachelens
//!
//! Most of these never reach the caller of a full analysis pass: ingestion
//! absorbs malformed records and missing sources, and the publish step turns
//! persistence failures into warnings. They exist so the low-level readers
//! can say precisely what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cachelens operations
pub type Result<T> = std::result::Result<T, CachelensError>;

/// Main error type for Cachelens operations
#[derive(Error, Debug)]
pub enum CachelensError {
    /// One input line failed structural parsing
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Referenced file or directory does not exist
    #[error("Missing source: {}", .0.display())]
    MissingSource(PathBuf),

    /// A scenario or live source has no usable records
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Writing the rendered report failed
    #[error("Could not persist report to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (config files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CachelensError {
    /// Whether the error only degrades the current source rather than the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CachelensError::MalformedRecord { .. }
                | CachelensError::MissingSource(_)
                | CachelensError::EmptyDataset(_)
                | CachelensError::Persistence { .. }
        )
    }
}
