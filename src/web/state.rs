//! # Web Application State
//!
//! Shared state handed to the health-check handlers. Everything in here is
//! cheap to clone; the heavy parts sit behind `Arc`.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::bootstrap::BuildInfo;
use crate::config::{HealthCheckConfig, StatusMode};
use crate::health::{AggregatedReport, DashboardEvent, HealthEvaluator, HistoryStore, ReportCache};

#[derive(Clone, Debug)]
pub struct AppState {
    /// Frozen health-check options
    pub config: Arc<HealthCheckConfig>,

    /// Used directly by the status endpoint in pull mode
    pub evaluator: HealthEvaluator,

    /// Latest scheduled report
    pub cache: ReportCache,

    pub history: Arc<dyn HistoryStore>,

    /// Feed of scheduled reports and notifications for dashboard streams
    pub events: broadcast::Sender<DashboardEvent>,

    pub build_info: Arc<BuildInfo>,

    /// Flips to `true` when the subsystem shuts down so open streams end
    pub closed: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(
        config: Arc<HealthCheckConfig>,
        evaluator: HealthEvaluator,
        cache: ReportCache,
        history: Arc<dyn HistoryStore>,
        events: broadcast::Sender<DashboardEvent>,
        build_info: BuildInfo,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            config,
            evaluator,
            cache,
            history,
            events,
            build_info: Arc::new(build_info),
            closed: Arc::new(closed),
        }
    }

    /// Report served by the status endpoint.
    ///
    /// Pull mode always evaluates afresh. Cached mode serves the latest
    /// scheduled report and only evaluates when no cycle has completed yet.
    pub async fn current_report(&self) -> Arc<AggregatedReport> {
        if self.config.status_mode == StatusMode::Cached {
            if let Some(report) = self.cache.latest().await {
                return report;
            }
        }
        Arc::new(self.evaluator.evaluate().await)
    }

    /// End all open dashboard streams
    pub fn close_streams(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}
