//! # System Constants
//!
//! Defaults and fixed names shared by configuration, the engine and the web layer.

/// Default status endpoint path
pub const DEFAULT_HEALTH_PATH: &str = "/hc";

/// Default dashboard page path
pub const DEFAULT_UI_PATH: &str = "/hc-ui";

/// Default dashboard data API path
pub const DEFAULT_API_PATH: &str = "/hc-ui-api";

/// Suffix appended to the dashboard API path for the server-sent event feed
pub const STREAM_PATH_SUFFIX: &str = "/stream";

/// Default scheduled evaluation interval
pub const DEFAULT_EVALUATION_SECONDS: i64 = 10;

/// The scheduler never runs faster than this
pub const MIN_EVALUATION_SECONDS: i64 = 1;

/// Default minimum gap between failure notifications for one probe
pub const DEFAULT_NOTIFICATION_THROTTLE_SECONDS: i64 = 600;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 10;

/// Default number of probes evaluated at the same time
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 8;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Capacity of the dashboard broadcast channel
pub const DASHBOARD_EVENT_CAPACITY: usize = 64;

/// Timeout applied to each webhook delivery
pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;

/// How long monitor shutdown waits for in-flight notification deliveries;
/// longer than one webhook timeout
pub const DELIVERY_DRAIN_TIMEOUT_SECONDS: u64 = 15;

pub const DEFAULT_CONFIG_PATH: &str = "config/healthwatch.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "HEALTHWATCH_CONFIG";

/// Prefix of configuration override environment variables
pub const ENV_PREFIX: &str = "HEALTHWATCH";

/// Optional build identifier baked in at compile time
pub const BUILD_ID: Option<&str> = option_env!("HEALTHWATCH_BUILD_ID");
