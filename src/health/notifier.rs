//! # Failure Notifier
//!
//! Decides, per probe, whether an evaluation result warrants an outbound
//! signal. Decisions compare the current status with the status consumers
//! last heard about (the last *signalled* status), not with the previous
//! evaluation:
//!
//! ```text
//!   signalled     current      signal
//!   ─────────     ─────────    ─────────────────────────────────────────
//!   Healthy   →   Degraded     Failure   (throttled)
//!   Healthy   →   Unhealthy    Failure   (throttled)
//!   Degraded  →   Unhealthy    Failure   (throttled, worsening)
//!   Unhealthy →   Degraded     none
//!   failing   →   same         none
//!   failing   →   Healthy      Recovery  (never throttled)
//!   Healthy   →   Healthy      none
//! ```
//!
//! A probe never seen before counts as signalled Healthy. The throttle window
//! is measured from the last Failure signal of the same probe; probes are
//! throttled independently. A suppressed failure leaves the signalled status
//! untouched, so a failure still present when the window closes is signalled
//! on the next evaluation.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::types::{EvaluationResult, HealthStatus};

/// Why a signal is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Failure,
    Recovery,
}

/// Outbound signal handed to notification sinks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureNotification {
    pub probe_name: String,
    pub kind: NotificationKind,
    pub status: HealthStatus,
    pub previous_status: HealthStatus,
    pub description: Option<String>,
    pub exception: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct ProbeNotificationState {
    /// Status of the most recent evaluation
    last_status: HealthStatus,
    /// Status carried by the most recent signal, Healthy before any
    last_signalled: HealthStatus,
    last_failure_signal: Option<Instant>,
}

/// Per-probe throttled transition detector
#[derive(Debug)]
pub struct FailureNotifier {
    throttle: Duration,
    states: DashMap<String, ProbeNotificationState>,
}

impl FailureNotifier {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            states: DashMap::new(),
        }
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Apply the transition rules using the current instant
    pub fn consider(&self, probe_name: &str, status: HealthStatus) -> Option<NotificationKind> {
        self.consider_at(probe_name, status, Instant::now())
    }

    /// Apply the transition rules as of `now`
    pub fn consider_at(
        &self,
        probe_name: &str,
        status: HealthStatus,
        now: Instant,
    ) -> Option<NotificationKind> {
        self.transition(probe_name, status, now).map(|(kind, _)| kind)
    }

    /// Apply the transition rules to a finished evaluation and build the
    /// outbound notification if one is due
    pub fn consider_result(&self, result: &EvaluationResult) -> Option<FailureNotification> {
        let (kind, previous) = self.transition(&result.probe_name, result.status, Instant::now())?;

        Some(FailureNotification {
            probe_name: result.probe_name.clone(),
            kind,
            status: result.status,
            previous_status: previous,
            description: result.description.clone(),
            exception: result.exception.clone(),
            timestamp: result.timestamp,
        })
    }

    /// Returns the signal kind and the status consumers heard before it
    fn transition(
        &self,
        probe_name: &str,
        status: HealthStatus,
        now: Instant,
    ) -> Option<(NotificationKind, HealthStatus)> {
        let mut state = self
            .states
            .entry(probe_name.to_string())
            .or_insert(ProbeNotificationState {
                last_status: HealthStatus::Healthy,
                last_signalled: HealthStatus::Healthy,
                last_failure_signal: None,
            });

        state.last_status = status;
        let signalled = state.last_signalled;

        if !status.is_failing() {
            if signalled.is_failing() {
                state.last_signalled = status;
                return Some((NotificationKind::Recovery, signalled));
            }
            return None;
        }

        if signalled.is_failing() && status <= signalled {
            return None;
        }

        let throttled = state
            .last_failure_signal
            .is_some_and(|at| now.saturating_duration_since(at) < self.throttle);
        if throttled {
            debug!(
                probe = %probe_name,
                status = %status,
                signalled = %signalled,
                "Failure notification suppressed by throttle"
            );
            return None;
        }

        state.last_signalled = status;
        state.last_failure_signal = Some(now);
        Some((NotificationKind::Failure, signalled))
    }

    /// Last status seen for a probe, if any
    pub fn last_status(&self, probe_name: &str) -> Option<HealthStatus> {
        self.states.get(probe_name).map(|state| state.last_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::types::result_with_status;

    const THROTTLE: Duration = Duration::from_secs(60);
    const INTERVAL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_sustained_failure_signals_once() {
        let notifier = FailureNotifier::new(THROTTLE);
        let start = Instant::now();
        let sequence = [
            HealthStatus::Healthy,
            HealthStatus::Healthy,
            HealthStatus::Healthy,
            HealthStatus::Unhealthy,
            HealthStatus::Unhealthy,
        ];

        let signals: Vec<_> = sequence
            .iter()
            .enumerate()
            .filter_map(|(i, status)| notifier.consider_at("SQL", *status, start + INTERVAL * i as u32))
            .collect();

        assert_eq!(signals, vec![NotificationKind::Failure]);
    }

    #[tokio::test]
    async fn test_unseen_probe_failing_immediately_signals() {
        let notifier = FailureNotifier::new(THROTTLE);
        assert_eq!(
            notifier.consider("CosmosDB-BD", HealthStatus::Degraded),
            Some(NotificationKind::Failure)
        );
    }

    #[tokio::test]
    async fn test_recovery_bypasses_throttle() {
        let notifier = FailureNotifier::new(THROTTLE);
        let start = Instant::now();

        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Unhealthy, start),
            Some(NotificationKind::Failure)
        );
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Healthy, start + INTERVAL),
            Some(NotificationKind::Recovery)
        );
    }

    #[tokio::test]
    async fn test_flapping_within_window_is_throttled() {
        let notifier = FailureNotifier::new(THROTTLE);
        let start = Instant::now();

        assert!(notifier.consider_at("SQL", HealthStatus::Unhealthy, start).is_some());
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Healthy, start + INTERVAL),
            Some(NotificationKind::Recovery)
        );
        // Re-failure 20s after the last failure signal
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Unhealthy, start + INTERVAL * 2),
            None
        );
        // Consumers last heard "Recovery", so nothing to recover from yet
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Healthy, start + INTERVAL * 5),
            None
        );
        // Once the window has passed a new transition signals again
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Unhealthy, start + INTERVAL * 7),
            Some(NotificationKind::Failure)
        );
    }

    #[tokio::test]
    async fn test_failure_outlasting_throttle_is_signalled_once_window_closes() {
        let notifier = FailureNotifier::new(THROTTLE);
        let start = Instant::now();
        let at = |seconds: u64| start + Duration::from_secs(seconds);

        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Unhealthy, at(0)),
            Some(NotificationKind::Failure)
        );
        assert_eq!(
            notifier.consider_at("SQL", HealthStatus::Healthy, at(10)),
            Some(NotificationKind::Recovery)
        );

        let signals: Vec<(u64, NotificationKind)> = (2..=60)
            .map(|step| step * 10)
            .filter_map(|t| {
                notifier
                    .consider_at("SQL", HealthStatus::Unhealthy, at(t))
                    .map(|kind| (t, kind))
            })
            .collect();

        assert_eq!(signals, vec![(60, NotificationKind::Failure)]);
        assert_eq!(notifier.last_status("SQL"), Some(HealthStatus::Unhealthy));
    }

    #[tokio::test]
    async fn test_throttled_worsening_is_signalled_after_window() {
        let notifier = FailureNotifier::new(THROTTLE);
        let start = Instant::now();

        assert!(notifier.consider_at("Cache", HealthStatus::Degraded, start).is_some());
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Unhealthy, start + INTERVAL),
            None
        );
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Unhealthy, start + INTERVAL * 6),
            Some(NotificationKind::Failure)
        );
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Unhealthy, start + INTERVAL * 7),
            None
        );
    }

    #[tokio::test]
    async fn test_recovery_reports_signalled_status() {
        let notifier = FailureNotifier::new(THROTTLE);

        let mut failing = result_with_status("SQLAzure-BD", HealthStatus::Unhealthy);
        failing.exception = Some("timeout".to_string());
        notifier.consider_result(&failing).unwrap();
        // Improvement inside the incident is not signalled
        assert!(notifier
            .consider_result(&result_with_status("SQLAzure-BD", HealthStatus::Degraded))
            .is_none());

        let recovery = notifier
            .consider_result(&result_with_status("SQLAzure-BD", HealthStatus::Healthy))
            .unwrap();
        assert_eq!(recovery.kind, NotificationKind::Recovery);
        assert_eq!(recovery.previous_status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_worsening_signals_but_improving_does_not() {
        let notifier = FailureNotifier::new(Duration::ZERO);
        let start = Instant::now();

        assert!(notifier.consider_at("Cache", HealthStatus::Degraded, start).is_some());
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Unhealthy, start + INTERVAL),
            Some(NotificationKind::Failure)
        );
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Degraded, start + INTERVAL * 2),
            None
        );
        assert_eq!(
            notifier.consider_at("Cache", HealthStatus::Degraded, start + INTERVAL * 3),
            None
        );
    }

    #[tokio::test]
    async fn test_probes_are_throttled_independently() {
        let notifier = FailureNotifier::new(THROTTLE);
        let now = Instant::now();

        assert!(notifier.consider_at("SQL", HealthStatus::Unhealthy, now).is_some());
        assert!(notifier.consider_at("Cache", HealthStatus::Unhealthy, now).is_some());
    }

    #[tokio::test]
    async fn test_healthy_steady_state_is_silent() {
        let notifier = FailureNotifier::new(THROTTLE);
        for _ in 0..5 {
            assert_eq!(notifier.consider("SQL", HealthStatus::Healthy), None);
        }
        assert_eq!(notifier.last_status("SQL"), Some(HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn test_consider_result_builds_notification() {
        let notifier = FailureNotifier::new(THROTTLE);
        let mut result = result_with_status("CosmosDB-BD", HealthStatus::Degraded);
        result.exception = Some("connection refused".to_string());

        let notification = notifier.consider_result(&result).unwrap();

        assert_eq!(notification.kind, NotificationKind::Failure);
        assert_eq!(notification.previous_status, HealthStatus::Healthy);
        assert_eq!(notification.status, HealthStatus::Degraded);
        assert_eq!(notification.exception.as_deref(), Some("connection refused"));

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["probeName"], "CosmosDB-BD");
        assert_eq!(json["kind"], "failure");
    }
}
