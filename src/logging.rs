//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem.
//! Designed for containerized services where logs go to stdout.
//!
//! - Log level chosen by environment (`HEALTHWATCH_ENV`, `APP_ENV`), overridable with `RUST_LOG`
//! - JSON lines when `LOG_FORMAT=json`, human-readable otherwise
//! - ANSI colors only when stdout is a terminal
//!
//! Engine log lines carry structured fields (`probe`, `status`, `duration_ms`,
//! `cycle_id`) so they can be filtered without parsing messages.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::health::types::{EvaluationResult, HealthStatus};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| get_log_level(&environment).to_string());
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());

        let console_layer = if json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(false)
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                json_output = json,
                ansi_colors = use_ansi,
                "Structured logging initialized"
            );
        }
    });
}

/// Current environment from environment variables
fn get_environment() -> String {
    std::env::var("HEALTHWATCH_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "debug",
        _ => "debug",
    }
}

/// Log one probe result at a level matching its status
pub fn log_probe_result(cycle_id: &str, result: &EvaluationResult) {
    let duration_ms = result.duration.as_millis() as u64;
    match result.status {
        HealthStatus::Healthy => tracing::debug!(
            cycle_id = %cycle_id,
            probe = %result.probe_name,
            status = %result.status,
            duration_ms = duration_ms,
            "Probe evaluated"
        ),
        HealthStatus::Degraded | HealthStatus::Unhealthy => tracing::warn!(
            cycle_id = %cycle_id,
            probe = %result.probe_name,
            status = %result.status,
            duration_ms = duration_ms,
            description = result.description.as_deref(),
            exception = result.exception.as_deref(),
            "Probe reported a failing status"
        ),
    }
}
