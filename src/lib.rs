#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Healthwatch Core
//!
//! Dependency health-check engine for web services.
//!
//! ## Overview
//!
//! A set of dependency probes (SQL database, document store, cache, HTTP, custom
//! checks) is evaluated concurrently on a fixed interval. Each cycle produces an
//! aggregated report whose status is the worst status of its entries. Reports
//! feed a bounded per-probe history, a throttled failure notifier and the
//! reporting endpoints:
//!
//! - status endpoint (default `GET /hc`)
//! - dashboard page (default `GET /hc-ui`) and its data API (default `GET /hc-ui-api`)
//! - dashboard event feed (`GET /hc-ui-api/stream`)
//!
//! ## Module Organization
//!
//! - [`health`] - probes, registry, evaluator, history, notifier, monitor
//! - [`probes`] - built-in dependency probes and the configuration factory
//! - [`bootstrap`] - assembles and starts the subsystem from configuration
//! - [`web`] - axum routes and handlers
//! - [`config`] - configuration loading and validation
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthwatch_core::bootstrap::{BuildInfo, HealthCheckSystem};
//! use healthwatch_core::config::ConfigManager;
//! use healthwatch_core::web::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! healthwatch_core::logging::init_tracing();
//!
//! let manager = ConfigManager::load()?;
//! let build_info = BuildInfo::from_config(&manager.config().application);
//! let handle = HealthCheckSystem::new(manager.shared(), build_info).start().await?;
//!
//! let app = create_app(
//!     &manager.config().server,
//!     handle.as_ref().map(|h| h.app_state().clone()),
//! );
//! let listener = tokio::net::TcpListener::bind(&manager.config().server.bind_address).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod logging;
pub mod probes;
pub mod web;

pub use bootstrap::{BuildInfo, HealthCheckSystem, HealthSystemHandle};
pub use config::{AppConfig, ConfigManager, ConfigurationError, HealthCheckConfig};
pub use error::{HealthError, HealthResult};
pub use health::{
    AggregatedReport, EvaluationResult, FnProbe, HealthEvaluator, HealthProbe, HealthStatus,
    ProbeOutcome, ProbeRegistration, ProbeRegistry,
};
