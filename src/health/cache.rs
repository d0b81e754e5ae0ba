//! # Report Cache
//!
//! Holds the most recent aggregated report produced by the background monitor.
//! Only the monitor writes; the status endpoint (in cached mode) and the
//! dashboard read.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::AggregatedReport;

/// Thread-safe latest-report cache
///
/// ```ignore
/// let cache = ReportCache::new();
/// let api_cache = cache.clone();
///
/// cache.store(report).await;                 // monitor
/// let latest = api_cache.latest().await;     // handlers
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReportCache {
    latest: Arc<RwLock<Option<Arc<AggregatedReport>>>>,
}

impl ReportCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached report
    pub async fn store(&self, report: Arc<AggregatedReport>) {
        *self.latest.write().await = Some(report);
    }

    /// Latest report, `None` before the first completed cycle
    pub async fn latest(&self) -> Option<Arc<AggregatedReport>> {
        self.latest.read().await.clone()
    }
}
