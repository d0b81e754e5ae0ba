//! # Web Response Types
//!
//! JSON shapes served by the status endpoint, the dashboard API and the
//! dashboard event feed. Field names are camelCase; durations are rendered
//! both as `hh:mm:ss.fffffff` strings and as numeric milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::bootstrap::BuildInfo;
use crate::health::{AggregatedReport, EvaluationResult, HealthStatus};

/// Render a duration as `[d.]hh:mm:ss.fffffff` (seven fractional digits,
/// 100 ns resolution)
pub fn format_timespan(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    let ticks = duration.subsec_nanos() / 100;

    if days > 0 {
        format!("{days}.{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

/// One probe entry of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntryResponse {
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    pub exception: Option<String>,
    pub duration: String,
    pub duration_ms: f64,
    pub data: BTreeMap<String, serde_json::Value>,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&EvaluationResult> for HealthEntryResponse {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            name: result.probe_name.clone(),
            status: result.status,
            description: result.description.clone(),
            exception: result.exception.clone(),
            duration: format_timespan(result.duration),
            duration_ms: millis(result.duration),
            data: result.data.clone(),
            tags: result.tags.clone(),
            timestamp: result.timestamp,
        }
    }
}

/// Status endpoint body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReportResponse {
    pub status: HealthStatus,
    pub total_duration: String,
    pub total_duration_ms: f64,
    pub entries: Vec<HealthEntryResponse>,
}

impl From<&AggregatedReport> for HealthReportResponse {
    fn from(report: &AggregatedReport) -> Self {
        Self {
            status: report.status,
            total_duration: format_timespan(report.total_duration),
            total_duration_ms: millis(report.total_duration),
            entries: report.entries.iter().map(HealthEntryResponse::from).collect(),
        }
    }
}

/// One retained history point on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPointResponse {
    pub status: HealthStatus,
    pub description: Option<String>,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&EvaluationResult> for HistoryPointResponse {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            status: result.status,
            description: result.description.clone().or_else(|| result.exception.clone()),
            duration_ms: millis(result.duration),
            timestamp: result.timestamp,
        }
    }
}

/// Dashboard API body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub name: String,
    pub version: String,
    pub build_id: Option<String>,
    /// `None` until the first scheduled cycle completes
    pub status: Option<HealthStatus>,
    pub last_executed: Option<DateTime<Utc>>,
    pub entries: Vec<HealthEntryResponse>,
    pub history: BTreeMap<String, Vec<HistoryPointResponse>>,
}

impl DashboardResponse {
    pub fn new(
        build_info: &BuildInfo,
        latest: Option<&AggregatedReport>,
        history: &BTreeMap<String, Vec<EvaluationResult>>,
    ) -> Self {
        Self {
            name: build_info.name.clone(),
            version: build_info.version.clone(),
            build_id: build_info.build_id.clone(),
            status: latest.map(|r| r.status),
            last_executed: latest.map(|r| r.timestamp),
            entries: latest
                .map(|r| r.entries.iter().map(HealthEntryResponse::from).collect())
                .unwrap_or_default(),
            history: history
                .iter()
                .map(|(name, results)| {
                    (
                        name.clone(),
                        results.iter().map(HistoryPointResponse::from).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// `report` event of the dashboard feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEventResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub report: HealthReportResponse,
}

impl From<&AggregatedReport> for ReportEventResponse {
    fn from(report: &AggregatedReport) -> Self {
        Self {
            id: report.id,
            timestamp: report.timestamp,
            report: HealthReportResponse::from(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::types::result_with_status;

    #[test]
    fn test_format_timespan() {
        assert_eq!(format_timespan(Duration::ZERO), "00:00:00.0000000");
        assert_eq!(
            format_timespan(Duration::from_micros(1_234_567)),
            "00:00:01.2345670"
        );
        assert_eq!(
            format_timespan(Duration::from_secs(3_725) + Duration::from_nanos(150)),
            "01:02:05.0000001"
        );
        assert_eq!(
            format_timespan(Duration::from_secs(90_061)),
            "1.01:01:01.0000000"
        );
    }

    #[test]
    fn test_report_response_shape() {
        let mut cosmos = result_with_status("CosmosDB-BD", HealthStatus::Degraded);
        cosmos.tags = vec!["cosmosdb".to_string()];
        cosmos.exception = Some("timeout".to_string());
        let report = AggregatedReport::from_entries(
            vec![result_with_status("SQLAzure-BD", HealthStatus::Healthy), cosmos],
            Duration::from_millis(250),
        );

        let json = serde_json::to_value(HealthReportResponse::from(&report)).unwrap();

        assert_eq!(json["status"], "Degraded");
        assert_eq!(json["totalDuration"], "00:00:00.2500000");
        assert_eq!(json["totalDurationMs"], 250.0);
        assert_eq!(json["entries"][0]["name"], "SQLAzure-BD");
        assert_eq!(json["entries"][1]["tags"][0], "cosmosdb");
        assert_eq!(json["entries"][1]["exception"], "timeout");
        assert_eq!(json["entries"][0]["duration"], "00:00:00.0030000");
    }

    #[test]
    fn test_dashboard_before_first_cycle() {
        let response = DashboardResponse::new(&BuildInfo::default(), None, &BTreeMap::new());
        assert!(response.status.is_none());
        assert!(response.last_executed.is_none());
        assert!(response.entries.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("buildId").is_some());
        assert!(json.get("lastExecuted").is_some());
    }

    #[test]
    fn test_report_event_flattens_report() {
        let report = AggregatedReport::from_entries(
            vec![result_with_status("cacheRedis", HealthStatus::Unhealthy)],
            Duration::from_millis(2),
        );
        let json = serde_json::to_value(ReportEventResponse::from(&report)).unwrap();
        assert_eq!(json["id"], report.id.to_string());
        assert_eq!(json["status"], "Unhealthy");
        assert_eq!(json["entries"][0]["name"], "cacheRedis");
    }
}
