// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metric events and the JSONL record format.
//!
//! Each line of a metrics file is one JSON object:
//!
//! ```json
//! {"timestamp":"2025-01-10T12:00:05Z","service":"catalog","metric":"cache_hits","tags":"[]","value":42.0}
//! ```
//!
//! Every field may be absent. Defaults are applied once, here, so the rest of
//! the pipeline only ever sees a fully populated [`MetricEvent`].

use crate::error::{CachelensError, Result};
use serde::{Deserialize, Serialize};

/// Service name used when a record does not carry one.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// One observed measurement. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub service: String,
    pub metric: String,
    pub value: f64,
    /// Opaque tag text, kept as emitted.
    pub tags: String,
    /// Opaque timestamp text, kept as emitted.
    pub timestamp: String,
}

/// Wire shape of one record. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    metric: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    tags: Option<serde_json::Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl MetricEvent {
    /// Create an event with empty tags and timestamp.
    pub fn new(service: &str, metric: &str, value: f64) -> Self {
        Self {
            service: service.to_string(),
            metric: metric.to_string(),
            value,
            tags: String::new(),
            timestamp: String::new(),
        }
    }

    /// Builder: set tags.
    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    /// Builder: set timestamp.
    pub fn with_timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = timestamp.to_string();
        self
    }

    /// Parse one line, using [`UNKNOWN_SERVICE`] when `service` is absent.
    pub fn from_line(line: &str) -> Result<Self> {
        Self::from_line_with_service(line, UNKNOWN_SERVICE)
    }

    /// Parse one line, using `fallback_service` when `service` is absent.
    ///
    /// The returned error always carries `line: 0`; readers that know the
    /// position rewrite it.
    pub fn from_line_with_service(line: &str, fallback_service: &str) -> Result<Self> {
        let malformed = |reason: String| CachelensError::MalformedRecord { line: 0, reason };

        let value: serde_json::Value =
            serde_json::from_str(line.trim()).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("record is not a JSON object".to_string()));
        }
        let raw: RawRecord = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

        let tags = match raw.tags {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        };

        Ok(Self {
            service: raw
                .service
                .unwrap_or_else(|| fallback_service.to_string()),
            metric: raw.metric.unwrap_or_default(),
            value: raw.value.unwrap_or(0.0),
            tags,
            timestamp: raw.timestamp.unwrap_or_default(),
        })
    }

    /// Composite aggregation key: `service.metric`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.service, self.metric)
    }

    /// Serialize back to a single JSONL line.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
