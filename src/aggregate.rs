// Cachelens - Cache invalidation metrics analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Grouping of metric events into per-key series.
//!
//! Keys keep first-seen order and events keep insertion order within a key.
//! A store is built fresh for each analysis pass.

use crate::event::MetricEvent;
use std::collections::HashMap;

/// All events sharing one `service.metric` key, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub service: String,
    pub metric: String,
    events: Vec<MetricEvent>,
}

impl MetricSeries {
    fn new(service: &str, metric: &str) -> Self {
        Self {
            service: service.to_string(),
            metric: metric.to_string(),
            events: Vec::new(),
        }
    }

    /// Composite key `service.metric`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.service, self.metric)
    }

    pub fn events(&self) -> &[MetricEvent] {
        &self.events
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.events.iter().map(|e| e.value)
    }

    pub fn sum(&self) -> f64 {
        self.values().sum()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Ordered mapping from `service.metric` to [`MetricSeries`].
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    series: Vec<MetricSeries>,
    index: HashMap<String, usize>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from one batch of events.
    pub fn from_events<I: IntoIterator<Item = MetricEvent>>(events: I) -> Self {
        let mut store = Self::new();
        store.extend(events);
        store
    }

    /// Append one event to its series, creating the series on first sight.
    pub fn insert(&mut self, event: MetricEvent) {
        let key = event.key();
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.series
                    .push(MetricSeries::new(&event.service, &event.metric));
                self.index.insert(key, self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[idx].events.push(event);
    }

    pub fn extend<I: IntoIterator<Item = MetricEvent>>(&mut self, events: I) {
        for event in events {
            self.insert(event);
        }
    }

    /// Append every event of `other`; keys already present grow, new keys
    /// are added after existing ones.
    pub fn merge(&mut self, other: MetricStore) {
        for series in other.series {
            self.extend(series.events);
        }
    }

    pub fn get(&self, service: &str, metric: &str) -> Option<&MetricSeries> {
        self.get_key(&format!("{}.{}", service, metric))
    }

    pub fn get_key(&self, key: &str) -> Option<&MetricSeries> {
        self.index.get(key).map(|&idx| &self.series[idx])
    }

    /// Sum of a series, 0 when the key is absent.
    pub fn sum(&self, service: &str, metric: &str) -> f64 {
        self.get(service, metric).map(|s| s.sum()).unwrap_or(0.0)
    }

    /// Number of events under a key, 0 when absent.
    pub fn count(&self, service: &str, metric: &str) -> usize {
        self.get(service, metric).map(|s| s.len()).unwrap_or(0)
    }

    /// Series whose key contains `pattern`, case-insensitive, in key order.
    pub fn matching<'a>(&'a self, pattern: &str) -> impl Iterator<Item = &'a MetricSeries> + 'a {
        let needle = pattern.to_lowercase();
        self.series
            .iter()
            .filter(move |s| s.key().to_lowercase().contains(&needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSeries> {
        self.series.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.series.iter().map(|s| s.key()).collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total events across all keys.
    pub fn event_count(&self) -> usize {
        self.series.iter().map(|s| s.len()).sum()
    }
}
