//! # Health-Check System Bootstrap
//!
//! Builds the whole subsystem from configuration: probe registry, evaluator,
//! history store, notifier and sinks, the background monitor and the shared web
//! state. Applies the enable/valid gate:
//!
//! - flag off: subsystem not mounted, no background work
//! - flag on but options unusable (no probes, bad paths, malformed probe or
//!   webhook settings): subsystem disabled with a warning, host keeps running
//! - duplicate probe name: startup error
//!
//! ```rust,no_run
//! use healthwatch_core::bootstrap::{BuildInfo, HealthCheckSystem};
//! use healthwatch_core::config::ConfigManager;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let build_info = BuildInfo::from_config(&manager.config().application);
//!
//! if let Some(mut handle) = HealthCheckSystem::new(manager.shared(), build_info).start().await? {
//!     let _router = handle.router();
//!     handle.shutdown().await?;
//! }
//! # Ok(())
//! # }
//! ```

use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::{AppConfig, ApplicationConfig};
use crate::constants::{BUILD_ID, DASHBOARD_EVENT_CAPACITY};
use crate::error::HealthResult;
use crate::health::{
    FailureNotifier, HealthEvaluator, HealthMonitor, HistoryRetention, HistoryStore,
    InMemoryHistoryStore, MonitorHandle, NotificationDispatcher, NotificationSink, ProbeRegistry,
    ReportCache,
};
use crate::probes::build_registry;
use crate::web::routes::health_routes;
use crate::web::state::AppState;

/// Display identity of the monitored application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub name: String,
    pub version: String,
    pub build_id: Option<String>,
}

impl BuildInfo {
    /// Package name and version baked in at compile time
    pub fn from_package() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_id: BUILD_ID.map(str::to_string),
        }
    }

    /// Package metadata overridden by `[application]` settings
    pub fn from_config(application: &ApplicationConfig) -> Self {
        let package = Self::from_package();
        Self {
            name: application.name.clone().unwrap_or(package.name),
            version: package.version,
            build_id: application.build_id.clone().or(package.build_id),
        }
    }

    pub fn label(&self) -> String {
        match &self.build_id {
            Some(build_id) => format!("{} {} ({})", self.name, self.version, build_id),
            None => format!("{} {}", self.name, self.version),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::from_package()
    }
}

/// Assembles and starts the health-check subsystem
#[derive(Debug)]
pub struct HealthCheckSystem {
    config: Arc<AppConfig>,
    build_info: BuildInfo,
    registry: Option<ProbeRegistry>,
    history: Option<Arc<dyn HistoryStore>>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl HealthCheckSystem {
    pub fn new(config: Arc<AppConfig>, build_info: BuildInfo) -> Self {
        Self {
            config,
            build_info,
            registry: None,
            history: None,
            sinks: Vec::new(),
        }
    }

    /// Use a programmatically built registry instead of `[[probes]]`
    #[must_use]
    pub fn with_registry(mut self, registry: ProbeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the in-memory history backend
    #[must_use]
    pub fn with_history_store(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Add a notification sink next to the log and webhook sinks
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build everything and spawn the monitor.
    ///
    /// `Ok(None)` means the subsystem is disabled and nothing was started.
    pub async fn start(self) -> HealthResult<Option<HealthSystemHandle>> {
        let health_config = &self.config.health_check;

        if !health_config.is_valid() {
            info!("Health checks disabled (enable_checks_standard = false)");
            return Ok(None);
        }

        let registry = match self.registry {
            Some(registry) => registry,
            None => match build_registry(&self.config) {
                Ok(registry) => registry,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Health checks disabled: probe configuration is invalid");
                    return Ok(None);
                }
            },
        };

        match health_config.check_subsystem(registry.len()) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Health checks disabled: configuration is invalid");
                return Ok(None);
            }
        }

        let mut dispatcher = match NotificationDispatcher::from_webhooks(
            &health_config.webhooks,
            &self.build_info.name,
        ) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                warn!(error = %e, "Health checks disabled: webhook configuration is invalid");
                return Ok(None);
            }
        };
        for sink in self.sinks {
            dispatcher = dispatcher.with_sink(sink);
        }

        let history = match self.history {
            Some(history) => history,
            None => {
                let retention = health_config.history_retention();
                if retention == HistoryRetention::Unbounded {
                    warn!(
                        "MaximumHistoryEntriesPerEndpoint is unset or negative; history is unbounded and grows for the life of the process"
                    );
                }
                Arc::new(InMemoryHistoryStore::new(retention)) as Arc<dyn HistoryStore>
            }
        };

        let shared_config = Arc::new(health_config.clone());
        let evaluator = HealthEvaluator::from_config(registry.into_shared(), health_config);
        let cache = ReportCache::new();
        let notifier = Arc::new(FailureNotifier::new(health_config.notification_throttle()));
        let (events, _) = broadcast::channel(DASHBOARD_EVENT_CAPACITY);

        let monitor = HealthMonitor::new(
            evaluator.clone(),
            cache.clone(),
            Arc::clone(&history),
            notifier,
            Arc::new(dispatcher),
            events.clone(),
            health_config.evaluation_interval(),
        )
        .spawn();

        let state = AppState::new(
            shared_config,
            evaluator,
            cache,
            history,
            events,
            self.build_info,
        );

        info!(
            application = %state.build_info.label(),
            endpoint = %state.config.health_check_path(),
            ui = %state.config.ui_path,
            api = %state.config.api_path,
            status_mode = ?state.config.status_mode,
            probes = ?state.evaluator.registry().names(),
            "Health-check subsystem started"
        );

        Ok(Some(HealthSystemHandle {
            state,
            monitor: Some(monitor),
        }))
    }
}

/// Running health-check subsystem
#[derive(Debug)]
pub struct HealthSystemHandle {
    state: AppState,
    monitor: Option<MonitorHandle>,
}

impl HealthSystemHandle {
    pub fn app_state(&self) -> &AppState {
        &self.state
    }

    /// Health routes bound to this subsystem's state
    pub fn router(&self) -> Router {
        health_routes(&self.state.config).with_state(self.state.clone())
    }

    pub fn is_running(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| !m.is_finished())
    }

    /// Stop the monitor and end open dashboard streams; idempotent
    pub async fn shutdown(&mut self) -> HealthResult<()> {
        self.state.close_streams();
        match self.monitor.take() {
            Some(monitor) => {
                monitor.shutdown().await?;
                info!("Health-check subsystem stopped");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HealthCheckConfig, ProbeConfig, ProbeKind, WebhookConfig};
    use crate::error::HealthError;
    use crate::health::{FnProbe, ProbeOutcome, ProbeRegistration};

    fn enabled_config(probes: Vec<ProbeConfig>) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            health_check: HealthCheckConfig {
                enable_checks_standard: true,
                maximum_history_entries_per_endpoint: Some(5),
                ..Default::default()
            },
            probes,
            ..Default::default()
        })
    }

    fn cache_probe(name: &str) -> ProbeConfig {
        ProbeConfig {
            name: name.to_string(),
            tags: Vec::new(),
            failure_status: None,
            timeout_seconds: None,
            kind: ProbeKind::Cache {
                address: "127.0.0.1:6379".to_string(),
            },
        }
    }

    fn self_registry() -> ProbeRegistry {
        let mut registry = ProbeRegistry::new();
        registry
            .register(ProbeRegistration::new(
                "self",
                Arc::new(FnProbe::new("self", || async { Ok(ProbeOutcome::healthy()) })),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_build_info_from_config_overrides() {
        let info = BuildInfo::from_config(&ApplicationConfig {
            name: Some("orders-api".to_string()),
            build_id: Some("2024.07.1".to_string()),
        });
        assert_eq!(info.name, "orders-api");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.label(), format!("orders-api {} (2024.07.1)", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_disabled_flag_starts_nothing() {
        let config = Arc::new(AppConfig::default());
        let handle = HealthCheckSystem::new(config, BuildInfo::default())
            .start()
            .await
            .unwrap();
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_enabled_without_probes_is_disabled_not_fatal() {
        let handle = HealthCheckSystem::new(enabled_config(vec![]), BuildInfo::default())
            .start()
            .await
            .unwrap();
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_probe_name_is_fatal() {
        let config = enabled_config(vec![cache_probe("cacheRedis"), cache_probe("cacheRedis")]);
        let error = HealthCheckSystem::new(config, BuildInfo::default())
            .start()
            .await
            .unwrap_err();
        assert_eq!(error, HealthError::DuplicateName("cacheRedis".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_webhook_disables_subsystem() {
        let mut config = (*enabled_config(vec![])).clone();
        config.health_check.webhooks = vec![WebhookConfig {
            name: "ops".to_string(),
            uri: "not a url".to_string(),
        }];
        let handle = HealthCheckSystem::new(Arc::new(config), BuildInfo::default())
            .with_registry(self_registry())
            .start()
            .await
            .unwrap();
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut handle = HealthCheckSystem::new(enabled_config(vec![]), BuildInfo::default())
            .with_registry(self_registry())
            .start()
            .await
            .unwrap()
            .expect("subsystem should start");

        assert!(handle.is_running());
        assert_eq!(
            handle.app_state().history.retention(),
            HistoryRetention::Bounded(5)
        );

        handle.shutdown().await.unwrap();
        assert!(!handle.is_running());
        assert!(handle.app_state().is_closed());
        handle.shutdown().await.unwrap();
    }
}
