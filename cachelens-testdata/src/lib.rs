// Cachelens Testdata - Synthetic cache metric streams
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Cachelens Testdata
//!
//! Deterministic metric streams for the three cache configurations a result
//! store usually holds, and a writer that lays them out on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachelens_testdata::{generate_lines, GeneratorConfig, ScenarioProfile, StoreBuilder};
//!
//! let config = GeneratorConfig::new().with_seed(42);
//! let lines = generate_lines(&ScenarioProfile::ttl_invalidate(), &config).unwrap();
//!
//! let store = StoreBuilder::new("/tmp/eds-results");
//! store.write_scenario("20250114_093000", "C", &lines).unwrap();
//! ```
//!
//! ## Presets
//!
//! - [`ScenarioProfile::no_cache`] (A): every lookup misses, slow reads
//! - [`ScenarioProfile::ttl_only`] (B): high hit rate, noticeable stale reads
//! - [`ScenarioProfile::ttl_invalidate`] (C): high hit rate, near-zero stale reads

pub mod generator;
pub mod profile;
pub mod store;

use thiserror::Error;

// Re-exports for convenience
pub use generator::{generate_lines, to_jsonl, GeneratorConfig, MetricLine};
pub use profile::{DelayProfile, ScenarioProfile};
pub use store::StoreBuilder;

/// Testdata error types.
#[derive(Debug, Error)]
pub enum TestdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, TestdataError>;
