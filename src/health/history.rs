//! # History Store
//!
//! Bounded per-probe retention of past evaluation results for trend display.
//! The backend is pluggable through [`HistoryStore`]; [`InMemoryHistoryStore`]
//! is the default.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use super::types::{AggregatedReport, EvaluationResult};

/// How many results are kept per probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRetention {
    /// Nothing is retained; the store is a no-op
    Disabled,
    /// At most N results per probe, oldest evicted first
    Bounded(usize),
    /// Every result is kept for the life of the process
    Unbounded,
}

impl HistoryRetention {
    /// Map `MaximumHistoryEntriesPerEndpoint` onto a retention policy:
    /// positive ⇒ bounded, zero ⇒ disabled, negative or unset ⇒ unbounded.
    pub fn from_configured(value: Option<i64>) -> Self {
        match value {
            Some(0) => Self::Disabled,
            Some(n) if n > 0 => Self::Bounded(n as usize),
            _ => Self::Unbounded,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Disabled => Some(0),
            Self::Bounded(n) => Some(*n),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for HistoryRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Bounded(n) => write!(f, "bounded({n})"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Storage backend for evaluation history
#[async_trait]
pub trait HistoryStore: Send + Sync + fmt::Debug {
    /// Append one result to the probe's sequence, evicting the oldest entry
    /// when the retention capacity is exceeded
    async fn record(&self, probe_name: &str, result: EvaluationResult);

    /// Record every entry of one cycle.
    ///
    /// Backends that can should make this all-or-nothing so a cycle is never
    /// half recorded.
    async fn record_report(&self, report: &AggregatedReport) {
        for entry in &report.entries {
            self.record(&entry.probe_name, entry.clone()).await;
        }
    }

    /// Retained results for one probe, oldest first
    async fn query(&self, probe_name: &str) -> Vec<EvaluationResult>;

    /// Probes with at least one retained result, sorted by name
    async fn probe_names(&self) -> Vec<String>;

    /// Every probe's retained results
    async fn snapshot(&self) -> BTreeMap<String, Vec<EvaluationResult>> {
        let mut snapshot = BTreeMap::new();
        for name in self.probe_names().await {
            let results = self.query(&name).await;
            snapshot.insert(name, results);
        }
        snapshot
    }

    fn retention(&self) -> HistoryRetention;
}

/// Process-local history backed by one ring buffer per probe
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    retention: HistoryRetention,
    entries: RwLock<HashMap<String, VecDeque<EvaluationResult>>>,
}

impl InMemoryHistoryStore {
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            retention,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn push_bounded(
        retention: HistoryRetention,
        buffer: &mut VecDeque<EvaluationResult>,
        result: EvaluationResult,
    ) {
        buffer.push_back(result);
        if let HistoryRetention::Bounded(capacity) = retention {
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn record(&self, probe_name: &str, result: EvaluationResult) {
        if self.retention.is_disabled() {
            return;
        }
        let mut entries = self.entries.write();
        let buffer = entries.entry(probe_name.to_string()).or_default();
        Self::push_bounded(self.retention, buffer, result);
    }

    async fn record_report(&self, report: &AggregatedReport) {
        if self.retention.is_disabled() {
            return;
        }
        // One write lock for the whole cycle
        let mut entries = self.entries.write();
        for entry in &report.entries {
            let buffer = entries.entry(entry.probe_name.clone()).or_default();
            Self::push_bounded(self.retention, buffer, entry.clone());
        }
    }

    async fn query(&self, probe_name: &str) -> Vec<EvaluationResult> {
        self.entries
            .read()
            .get(probe_name)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn probe_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn retention(&self) -> HistoryRetention {
        self.retention
    }
}
