//! # Health Types
//!
//! Status tri-state, per-probe evaluation results and the aggregated report
//! produced once per evaluation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Dependency health status
///
/// Ordered by severity: `Unhealthy > Degraded > Healthy`. The status of an
/// aggregated report is the maximum over its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    #[serde(alias = "healthy")]
    Healthy = 0,
    /// Impaired but still usable
    #[serde(alias = "degraded")]
    Degraded = 1,
    #[serde(alias = "unhealthy")]
    Unhealthy = 2,
}

impl PartialOrd for HealthStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl HealthStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Unhealthy => "Unhealthy",
        }
    }

    /// Degraded or Unhealthy
    #[must_use]
    pub const fn is_failing(&self) -> bool {
        matches!(self, Self::Degraded | Self::Unhealthy)
    }

    /// Worst status of a sequence; Healthy when empty
    pub fn worst<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        statuses.into_iter().max().unwrap_or_default()
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one probe once. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub probe_name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    /// Error text when the probe failed, timed out or panicked
    pub exception: Option<String>,
    pub duration: Duration,
    pub data: BTreeMap<String, serde_json::Value>,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn is_failing(&self) -> bool {
        self.status.is_failing()
    }
}

/// Combined result of all probes for one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub id: Uuid,
    pub status: HealthStatus,
    /// Entries in probe registration order
    pub entries: Vec<EvaluationResult>,
    pub total_duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl AggregatedReport {
    /// Build a report; the overall status is derived from the entries
    pub fn from_entries(entries: Vec<EvaluationResult>, total_duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: HealthStatus::worst(entries.iter().map(|e| e.status)),
            entries,
            total_duration,
            timestamp: Utc::now(),
        }
    }

    pub fn entry(&self, probe_name: &str) -> Option<&EvaluationResult> {
        self.entries.iter().find(|e| e.probe_name == probe_name)
    }

    pub fn failing_entries(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.entries.iter().filter(|e| e.is_failing())
    }
}

#[cfg(test)]
pub(crate) fn result_with_status(probe_name: &str, status: HealthStatus) -> EvaluationResult {
    EvaluationResult {
        probe_name: probe_name.to_string(),
        status,
        description: None,
        exception: None,
        duration: Duration::from_millis(3),
        data: BTreeMap::new(),
        tags: Vec::new(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = HealthStatus> {
        prop_oneof![
            Just(HealthStatus::Healthy),
            Just(HealthStatus::Degraded),
            Just(HealthStatus::Unhealthy),
        ]
    }

    #[test]
    fn test_severity_ordering() {
        assert!(HealthStatus::Unhealthy > HealthStatus::Degraded);
        assert!(HealthStatus::Degraded > HealthStatus::Healthy);
        assert!(!HealthStatus::Healthy.is_failing());
        assert!(HealthStatus::Degraded.is_failing());
    }

    #[test]
    fn test_empty_report_is_healthy() {
        let report = AggregatedReport::from_entries(Vec::new(), Duration::ZERO);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.entries.is_empty());
    }

    #[test]
    fn test_report_keeps_entry_order() {
        let report = AggregatedReport::from_entries(
            vec![
                result_with_status("SQLAzure-BD", HealthStatus::Healthy),
                result_with_status("CosmosDB-BD", HealthStatus::Degraded),
            ],
            Duration::from_millis(12),
        );
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.entries[0].probe_name, "SQLAzure-BD");
        assert_eq!(report.failing_entries().count(), 1);
        assert!(report.entry("CosmosDB-BD").is_some());
        assert!(report.entry("cacheRedis").is_none());
    }

    #[test]
    fn test_status_serializes_as_word() {
        let json = serde_json::to_string(&HealthStatus::Unhealthy).unwrap();
        assert_eq!(json, "\"Unhealthy\"");
        let parsed: HealthStatus = serde_json::from_str("\"degraded\"").unwrap();
        assert_eq!(parsed, HealthStatus::Degraded);
    }

    proptest! {
        #[test]
        fn prop_report_status_is_worst_entry(statuses in prop::collection::vec(status_strategy(), 0..16)) {
            let entries = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| result_with_status(&format!("probe-{i}"), *s))
                .collect::<Vec<_>>();
            let report = AggregatedReport::from_entries(entries, Duration::ZERO);

            let expected = statuses.iter().copied().max().unwrap_or(HealthStatus::Healthy);
            prop_assert_eq!(report.status, expected);
            for entry in &report.entries {
                prop_assert!(entry.status <= report.status);
            }
        }
    }
}
