//! # Route Definitions
//!
//! Health-check routes. Paths come from configuration and are validated as
//! absolute, static and distinct before the router is built.

use axum::routing::get;
use axum::Router;

use crate::config::HealthCheckConfig;
use crate::web::handlers;
use crate::web::state::AppState;

/// Status endpoint only.
///
/// Kept apart from the dashboard routes because a pull-mode request lasts as
/// long as one evaluation, which the per-probe timeouts already bound.
pub fn status_routes(config: &HealthCheckConfig) -> Router<AppState> {
    Router::new().route(
        config.health_check_path(),
        get(handlers::health::health_status),
    )
}

/// Dashboard page, dashboard API and dashboard feed
pub fn dashboard_routes(config: &HealthCheckConfig) -> Router<AppState> {
    Router::new()
        .route(&config.ui_path, get(handlers::dashboard::dashboard_ui))
        .route(&config.api_path, get(handlers::dashboard::dashboard_api))
        .route(
            &config.stream_path(),
            get(handlers::dashboard::dashboard_stream),
        )
}

/// Every health-check route
pub fn health_routes(config: &HealthCheckConfig) -> Router<AppState> {
    status_routes(config).merge(dashboard_routes(config))
}
