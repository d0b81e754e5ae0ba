//! # Health-Check Configuration
//!
//! Configuration is bound once at startup and then frozen behind an `Arc` in
//! [`ConfigManager`]. Nothing mutates it at runtime.
//!
//! ## Sources
//!
//! - A TOML file (`config/healthwatch.toml` by default, `HEALTHWATCH_CONFIG` to override)
//! - Environment variables prefixed with `HEALTHWATCH__`, using `__` as the
//!   nesting separator (`HEALTHWATCH__HEALTH_CHECK__ENABLE_CHECKS_STANDARD=true`)
//!
//! Keys accept snake_case as well as the PascalCase option names used by the
//! dashboard configuration section of earlier deployments (`UrlHealthCheck`,
//! `EnableChecksStandard`, ...).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use healthwatch_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let health = &manager.config().health_check;
//! println!("status endpoint: {}", health.health_check_path());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::{
    DEFAULT_API_PATH, DEFAULT_BIND_ADDRESS, DEFAULT_EVALUATION_SECONDS, DEFAULT_HEALTH_PATH,
    DEFAULT_MAX_CONCURRENT_PROBES, DEFAULT_NOTIFICATION_THROTTLE_SECONDS,
    DEFAULT_PROBE_TIMEOUT_SECONDS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_UI_PATH,
    MIN_EVALUATION_SECONDS, STREAM_PATH_SUFFIX,
};
use crate::health::history::HistoryRetention;
use crate::health::types::HealthStatus;

/// Root configuration structure mirroring `healthwatch.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Display identity of the monitored application
    #[serde(default)]
    pub application: ApplicationConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Health-check subsystem options
    #[serde(
        default,
        alias = "HealthCheckCustomConfiguration",
        alias = "healthcheckcustomconfiguration"
    )]
    pub health_check: HealthCheckConfig,

    /// Dependency probes to register at startup
    #[serde(default)]
    pub probes: Vec<ProbeConfig>,
}

impl AppConfig {
    /// Structural validation performed at load time.
    ///
    /// Failing here rejects the configuration outright. The enable/valid gate of
    /// the health-check subsystem is evaluated separately by
    /// [`HealthCheckConfig::check_subsystem`] and only disables the subsystem.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "server.bind_address",
                "server configuration",
            ));
        }

        if self.health_check.max_concurrent_probes == 0 {
            return Err(ConfigurationError::invalid_value(
                "health_check.max_concurrent_probes",
                "0",
                "at least one probe must be allowed to run",
            ));
        }

        if self.health_check.probe_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "health_check.probe_timeout_seconds",
                "0",
                "probe timeout must be greater than 0",
            ));
        }

        for probe in &self.probes {
            if probe.name.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "probes[].name",
                    "probe configuration",
                ));
            }
            if probe.timeout_seconds == Some(0) {
                return Err(ConfigurationError::invalid_probe_config(
                    &probe.name,
                    "timeout_seconds must be greater than 0",
                ));
            }
        }

        for webhook in &self.health_check.webhooks {
            if webhook.uri.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "webhooks[].uri",
                    format!("webhook '{}'", webhook.name),
                ));
            }
        }

        Ok(())
    }
}

/// Identity of the monitored application, shown on the dashboard
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub name: Option<String>,
    pub build_id: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// How the status endpoint obtains the report it serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// Run a fresh evaluation for every request
    #[default]
    Pull,
    /// Serve the latest scheduled report, pulling only if none exists yet
    Cached,
}

/// Webhook that receives failure and recovery notifications
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Uri")]
    pub uri: String,
}

/// Options of the health-check subsystem.
///
/// Field names are snake_case; aliases accept both the
/// PascalCase spelling and its lowercased form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthCheckConfig {
    #[serde(default, alias = "UrlHealthCheck", alias = "urlhealthcheck")]
    pub url_health_check: Option<String>,

    #[serde(default, alias = "EnableChecksStandard", alias = "enablechecksstandard")]
    pub enable_checks_standard: bool,

    #[serde(
        default = "default_evaluation_seconds",
        alias = "EvaluationTimeInSeconds",
        alias = "evaluationtimeinseconds"
    )]
    pub evaluation_time_in_seconds: i64,

    #[serde(
        default = "default_notification_throttle_seconds",
        alias = "MinimumSecondsBetweenFailureNotifications",
        alias = "minimumsecondsbetweenfailurenotifications"
    )]
    pub minimum_seconds_between_failure_notifications: i64,

    #[serde(
        default,
        alias = "MaximumHistoryEntriesPerEndpoint",
        alias = "maximumhistoryentriesperendpoint"
    )]
    pub maximum_history_entries_per_endpoint: Option<i64>,

    #[serde(default = "default_ui_path")]
    pub ui_path: String,

    #[serde(default = "default_api_path")]
    pub api_path: String,

    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    #[serde(default)]
    pub status_mode: StatusMode,

    #[serde(default, alias = "Webhooks")]
    pub webhooks: Vec<WebhookConfig>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            url_health_check: None,
            enable_checks_standard: false,
            evaluation_time_in_seconds: default_evaluation_seconds(),
            minimum_seconds_between_failure_notifications: default_notification_throttle_seconds(),
            maximum_history_entries_per_endpoint: None,
            ui_path: default_ui_path(),
            api_path: default_api_path(),
            probe_timeout_seconds: default_probe_timeout_seconds(),
            max_concurrent_probes: default_max_concurrent_probes(),
            status_mode: StatusMode::default(),
            webhooks: Vec::new(),
        }
    }
}

impl HealthCheckConfig {
    /// The single enable gate.
    ///
    /// "Enabled" and "valid" are one flag here, as they have always been for this
    /// options section. See [`Self::check_subsystem`] for the full startup decision.
    pub fn is_valid(&self) -> bool {
        self.enable_checks_standard
    }

    /// Status endpoint path, `/hc` when unset
    pub fn health_check_path(&self) -> &str {
        self.url_health_check
            .as_deref()
            .unwrap_or(DEFAULT_HEALTH_PATH)
    }

    /// Server-sent event feed path under the dashboard API
    pub fn stream_path(&self) -> String {
        format!("{}{}", self.api_path.trim_end_matches('/'), STREAM_PATH_SUFFIX)
    }

    /// Scheduled evaluation interval, never below one second
    pub fn evaluation_interval(&self) -> Duration {
        let seconds = self.evaluation_time_in_seconds.max(MIN_EVALUATION_SECONDS);
        Duration::from_secs(seconds as u64)
    }

    /// Minimum time between two failure notifications for the same probe
    pub fn notification_throttle(&self) -> Duration {
        Duration::from_secs(self.minimum_seconds_between_failure_notifications.max(0) as u64)
    }

    /// Default per-probe timeout
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Retention policy of the history store
    pub fn history_retention(&self) -> HistoryRetention {
        HistoryRetention::from_configured(self.maximum_history_entries_per_endpoint)
    }

    /// Decide whether the subsystem mounts.
    ///
    /// Returns `Ok(false)` when the enable flag is off, an error when the flag is
    /// on but the options cannot drive a working subsystem (empty endpoint URL,
    /// no probes, malformed paths), and `Ok(true)` otherwise. Callers treat the
    /// error case as "disabled", logging the reason.
    pub fn check_subsystem(&self, probe_count: usize) -> ConfigResult<bool> {
        if !self.is_valid() {
            return Ok(false);
        }

        let path = self.health_check_path();
        if path.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "health_check.url_health_check",
                "health-check endpoint",
            ));
        }

        for (field, value) in [
            ("health_check.url_health_check", path),
            ("health_check.ui_path", self.ui_path.as_str()),
            ("health_check.api_path", self.api_path.as_str()),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "route paths must start with '/'",
                ));
            }
            if !is_static_route(value) {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "route paths must be static; ':' and '*' are not allowed",
                ));
            }
        }

        let stream_path = self.stream_path();
        let mut routes = vec![path, self.ui_path.as_str(), self.api_path.as_str(), stream_path.as_str()];
        routes.sort_unstable();
        if let Some(window) = routes.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigurationError::invalid_value(
                "health_check",
                window[0],
                "status, dashboard and dashboard API paths must be distinct",
            ));
        }

        if probe_count == 0 {
            return Err(ConfigurationError::missing_required_field(
                "probes",
                "at least one probe is required when health checks are enabled",
            ));
        }

        Ok(true)
    }
}

/// A dependency probe declared in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Status recorded when the probe errors; defaults per probe kind
    #[serde(default)]
    pub failure_status: Option<HealthStatus>,

    /// Overrides `health_check.probe_timeout_seconds`
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    #[serde(flatten)]
    pub kind: ProbeKind,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Failure status to record when the probe errors
    pub fn effective_failure_status(&self) -> HealthStatus {
        self.failure_status
            .unwrap_or_else(|| self.kind.default_failure_status())
    }
}

/// Kind-specific probe settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    /// Relational database reachability (`SELECT 1`)
    Sql { connection_string: String },
    /// Document store account endpoint reachability
    DocumentStore { endpoint: String },
    /// Cache server `PING`
    Cache { address: String },
    /// Plain HTTP endpoint reachability
    Http { url: String },
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Sql { .. } => "sql",
            ProbeKind::DocumentStore { .. } => "document_store",
            ProbeKind::Cache { .. } => "cache",
            ProbeKind::Http { .. } => "http",
        }
    }

    /// The document store is registered as Degraded-on-failure; everything
    /// else fails as Unhealthy.
    pub fn default_failure_status(&self) -> HealthStatus {
        match self {
            ProbeKind::DocumentStore { .. } => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}

/// No `:` or `*`, which the router reads as parameter and wildcard markers
fn is_static_route(path: &str) -> bool {
    !path.contains([':', '*'])
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_evaluation_seconds() -> i64 {
    DEFAULT_EVALUATION_SECONDS
}

fn default_notification_throttle_seconds() -> i64 {
    DEFAULT_NOTIFICATION_THROTTLE_SECONDS
}

fn default_ui_path() -> String {
    DEFAULT_UI_PATH.to_string()
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_probe_timeout_seconds() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECONDS
}

fn default_max_concurrent_probes() -> usize {
    DEFAULT_MAX_CONCURRENT_PROBES
}
