//! # Health Module
//!
//! Dependency health-check engine: probes, the registry that holds them, the
//! evaluator that runs them and everything that consumes its reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    HEALTH ENGINE ARCHITECTURE                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//!   ┌─────────────────────┐
//!   │  ProbeRegistry      │ (frozen after bootstrap)
//!   │  - SQL              │
//!   │  - document store   │
//!   │  - cache            │
//!   └──────────┬──────────┘
//!              │
//!              ▼
//!   ┌─────────────────────┐        pull mode
//!   │  HealthEvaluator    │ ◄──────────────────── status endpoint
//!   │  - per-probe timeout│
//!   │  - bounded fan-out  │
//!   └──────────┬──────────┘
//!              │ every EvaluationTimeInSeconds
//!              ▼
//!   ┌─────────────────────┐
//!   │  HealthMonitor      │ (background task)
//!   └──┬──────┬──────┬────┘
//!      │      │      │
//!      ▼      ▼      ▼
//!   ReportCache  HistoryStore  FailureNotifier ──► NotificationDispatcher
//!      │            │                                 (log, webhooks)
//!      └─────┬──────┘
//!            ▼
//!      dashboard + cached status endpoint
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use healthwatch_core::health::{
//!     FnProbe, HealthEvaluator, HealthStatus, ProbeOutcome, ProbeRegistration, ProbeRegistry,
//! };
//!
//! # tokio_test::block_on(async {
//! let mut registry = ProbeRegistry::new();
//! registry
//!     .register(ProbeRegistration::new(
//!         "self",
//!         Arc::new(FnProbe::new("self", || async { Ok(ProbeOutcome::healthy()) })),
//!     ))
//!     .unwrap();
//!
//! let evaluator = HealthEvaluator::new(registry.into_shared(), Duration::from_secs(5), 4);
//! let report = evaluator.evaluate().await;
//! assert_eq!(report.status, HealthStatus::Healthy);
//! # });
//! ```

pub mod cache;
pub mod evaluator;
pub mod history;
pub mod monitor;
pub mod notification;
pub mod notifier;
pub mod probe;
pub mod registry;
pub mod types;

pub use cache::ReportCache;
pub use evaluator::HealthEvaluator;
pub use history::{HistoryRetention, HistoryStore, InMemoryHistoryStore};
pub use monitor::{CycleOutcome, DashboardEvent, HealthMonitor, MonitorHandle};
pub use notification::{LogSink, NotificationDispatcher, NotificationSink, WebhookSink};
pub use notifier::{FailureNotification, FailureNotifier, NotificationKind};
pub use probe::{FnProbe, HealthProbe, ProbeError, ProbeOutcome};
pub use registry::{ProbeRegistration, ProbeRegistry};
pub use types::{AggregatedReport, EvaluationResult, HealthStatus};
