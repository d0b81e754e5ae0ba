//! # Health Evaluator
//!
//! Runs every registered probe under its own timeout and aggregates the results
//! into one [`AggregatedReport`]. Used in two ways:
//!
//! - push mode: the background [`HealthMonitor`](super::monitor::HealthMonitor)
//!   evaluates on a fixed interval and feeds history and notifications
//! - pull mode: the status endpoint evaluates on request
//!
//! An evaluation cannot fail as a whole. Probe errors, panics and timeouts are
//! captured into the probe's entry and never reach the caller.

use futures::stream::{self, StreamExt};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::registry::{ProbeRegistration, ProbeRegistry};
use super::types::{AggregatedReport, EvaluationResult, HealthStatus};
use crate::config::HealthCheckConfig;
use crate::error::HealthError;

/// Concurrent, timeout-bounded probe runner
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    registry: Arc<ProbeRegistry>,
    default_timeout: Duration,
    max_concurrency: usize,
}

impl HealthEvaluator {
    pub fn new(registry: Arc<ProbeRegistry>, default_timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            registry,
            default_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(registry: Arc<ProbeRegistry>, config: &HealthCheckConfig) -> Self {
        Self::new(
            registry,
            config.probe_timeout(),
            config.max_concurrent_probes,
        )
    }

    pub fn registry(&self) -> &Arc<ProbeRegistry> {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run all probes and aggregate.
    ///
    /// At most `max_concurrency` probes run at once; entries keep registration
    /// order regardless of completion order.
    pub async fn evaluate(&self) -> AggregatedReport {
        let started = Instant::now();
        let default_timeout = self.default_timeout;

        let entries = stream::iter(self.registry.list().iter().cloned())
            .map(|registration| run_probe(registration, default_timeout))
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;

        let report = AggregatedReport::from_entries(entries, started.elapsed());

        debug!(
            cycle_id = %report.id,
            status = %report.status,
            probes = report.entries.len(),
            total_duration_ms = report.total_duration.as_millis() as u64,
            "Health evaluation complete"
        );

        report
    }
}

/// Run one probe in its own task under a timeout.
///
/// The probe runs on a spawned task so a panic stays contained and a timeout
/// can cancel it without touching sibling probes.
pub async fn run_probe(registration: ProbeRegistration, default_timeout: Duration) -> EvaluationResult {
    let timeout = registration.timeout.unwrap_or(default_timeout);
    let started = Instant::now();

    let probe = Arc::clone(&registration.probe);
    let mut task = AbortOnDrop(tokio::spawn(async move { probe.check().await }));

    let (status, description, exception, data) =
        match tokio::time::timeout(timeout, &mut task.0).await {
            Ok(Ok(Ok(outcome))) => (outcome.status, outcome.description, None, outcome.data),
            Ok(Ok(Err(probe_error))) => {
                let error = HealthError::probe_execution(&registration.name, &probe_error);
                (
                    registration.failure_status,
                    Some(error.to_string()),
                    Some(probe_error.to_string()),
                    BTreeMap::new(),
                )
            }
            Ok(Err(join_error)) => {
                let reason = if join_error.is_panic() {
                    format!("probe panicked: {}", panic_message(join_error.into_panic()))
                } else {
                    "probe task was cancelled".to_string()
                };
                let error = HealthError::probe_execution(&registration.name, &reason);
                (
                    registration.failure_status,
                    Some(error.to_string()),
                    Some(reason),
                    BTreeMap::new(),
                )
            }
            Err(_elapsed) => {
                task.0.abort();
                let error = HealthError::probe_timeout(&registration.name, timeout);
                warn!(
                    probe = %registration.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Health probe timed out"
                );
                (
                    HealthStatus::Unhealthy,
                    Some(error.to_string()),
                    Some(error.to_string()),
                    BTreeMap::new(),
                )
            }
        };

    EvaluationResult {
        probe_name: registration.name,
        status,
        description,
        exception,
        duration: started.elapsed(),
        data,
        tags: registration.tags,
        timestamp: chrono::Utc::now(),
    }
}

/// Cancels the probe task if the evaluation is dropped mid-flight
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
