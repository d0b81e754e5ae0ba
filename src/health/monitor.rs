//! # Health Monitor
//!
//! Background task that evaluates all probes on a fixed interval and publishes
//! each report to the cache, the history store, the failure notifier and the
//! dashboard event feed.
//!
//! Cycles never overlap: the next tick is only awaited after the previous
//! cycle has been published, and missed ticks are delayed rather than burst.
//! On shutdown an in-flight cycle is abandoned and nothing from it is
//! published. Notification deliveries already started are awaited, for at
//! most `DELIVERY_DRAIN_TIMEOUT_SECONDS`, then aborted.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::cache::ReportCache;
use super::evaluator::HealthEvaluator;
use super::history::HistoryStore;
use super::notification::NotificationDispatcher;
use super::notifier::{FailureNotification, FailureNotifier};
use super::types::AggregatedReport;
use crate::constants::DELIVERY_DRAIN_TIMEOUT_SECONDS;
use crate::error::{HealthError, HealthResult};
use crate::logging::log_probe_result;

/// Update pushed to dashboard subscribers
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A scheduled cycle completed
    Report(Arc<AggregatedReport>),
    /// A probe changed state in a way that produced a notification
    Notification(FailureNotification),
}

/// What one published cycle produced
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: Arc<AggregatedReport>,
    pub notifications: Vec<FailureNotification>,
}

/// Scheduled evaluation loop
pub struct HealthMonitor {
    evaluator: HealthEvaluator,
    cache: ReportCache,
    history: Arc<dyn HistoryStore>,
    notifier: Arc<FailureNotifier>,
    dispatcher: Arc<NotificationDispatcher>,
    events: broadcast::Sender<DashboardEvent>,
    interval: Duration,
    /// Notification deliveries still running off the evaluation path
    deliveries: Mutex<JoinSet<()>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("interval", &self.interval)
            .field("probes", &self.evaluator.registry().len())
            .field("history_retention", &self.history.retention())
            .field("notification_throttle", &self.notifier.throttle())
            .finish()
    }
}

impl HealthMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        evaluator: HealthEvaluator,
        cache: ReportCache,
        history: Arc<dyn HistoryStore>,
        notifier: Arc<FailureNotifier>,
        dispatcher: Arc<NotificationDispatcher>,
        events: broadcast::Sender<DashboardEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            evaluator,
            cache,
            history,
            notifier,
            dispatcher,
            events,
            interval,
            deliveries: Mutex::new(JoinSet::new()),
        }
    }

    /// Spawn the evaluation loop.
    ///
    /// The first cycle runs immediately. Dropping the returned handle without
    /// calling [`MonitorHandle::shutdown`] also stops the loop.
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        info!(
            interval_ms = self.interval.as_millis() as u64,
            probes = self.evaluator.registry().len(),
            history_retention = %self.history.retention(),
            "Starting health monitor"
        );

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {}
                }

                let report = tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        debug!("Shutdown during evaluation, discarding partial cycle");
                        break;
                    }
                    report = self.evaluator.evaluate() => report,
                };

                let outcome = self.publish(report).await;
                self.spawn_delivery(outcome.notifications);
            }

            self.drain_deliveries().await;
            info!("Health monitor stopped");
        });

        MonitorHandle {
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Run one cycle outside the schedule and publish it
    pub async fn run_cycle(&self) -> CycleOutcome {
        let report = self.evaluator.evaluate().await;
        let outcome = self.publish(report).await;
        self.spawn_delivery(outcome.notifications.clone());
        outcome
    }

    /// Publish a completed report: cache, history, notifier, dashboard feed.
    ///
    /// Notifications are returned rather than delivered so delivery can run
    /// off the evaluation path.
    pub async fn publish(&self, report: AggregatedReport) -> CycleOutcome {
        let report = Arc::new(report);
        let cycle_id = report.id.to_string();

        for entry in &report.entries {
            log_probe_result(&cycle_id, entry);
        }

        self.cache.store(Arc::clone(&report)).await;
        self.history.record_report(&report).await;

        let notifications: Vec<FailureNotification> = report
            .entries
            .iter()
            .filter_map(|entry| self.notifier.consider_result(entry))
            .collect();

        // No subscribers is not an error
        for notification in &notifications {
            let _ = self
                .events
                .send(DashboardEvent::Notification(notification.clone()));
        }
        let _ = self.events.send(DashboardEvent::Report(Arc::clone(&report)));

        debug!(
            cycle_id = %cycle_id,
            status = %report.status,
            notifications = notifications.len(),
            "Health cycle published"
        );

        CycleOutcome {
            report,
            notifications,
        }
    }

    fn spawn_delivery(&self, notifications: Vec<FailureNotification>) {
        if notifications.is_empty() {
            return;
        }
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut deliveries = self.deliveries.lock();
        while deliveries.try_join_next().is_some() {}
        deliveries.spawn(async move {
            dispatcher.dispatch_all(&notifications).await;
        });
    }

    /// Wait for started deliveries, aborting whatever outlives the drain timeout
    async fn drain_deliveries(&self) {
        let mut pending = std::mem::take(&mut *self.deliveries.lock());
        if pending.is_empty() {
            return;
        }

        let drained = tokio::time::timeout(
            Duration::from_secs(DELIVERY_DRAIN_TIMEOUT_SECONDS),
            async {
                while pending.join_next().await.is_some() {}
            },
        )
        .await;

        if drained.is_err() {
            warn!(
                pending = pending.len(),
                "Notification deliveries still running at shutdown, aborting"
            );
            pending.abort_all();
        }
    }
}

/// Handle to a running [`HealthMonitor`]
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) -> HealthResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        (&mut self.handle)
            .await
            .map_err(|e| HealthError::ServerError(format!("Health monitor task failed: {e}")))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
