//! # Web Module
//!
//! Axum router hosting the health-check endpoints.
//!
//! - [`routes`] - route table built from the configured paths
//! - [`handlers`] - status endpoint and dashboard handlers
//! - [`middleware`] - request id tagging
//! - [`state`] - shared handler state
//! - [`response_types`] - JSON response shapes
//!
//! When the subsystem is disabled the router is built without health routes,
//! so requests to the status path fall through to 404.
//!
//! The request timeout applies to the dashboard routes only. The status
//! endpoint must answer 200 with the report even when probes are slow, and
//! its duration is already bounded by the per-probe timeouts.

pub mod handlers;
pub mod middleware;
pub mod response_types;
pub mod routes;
pub mod state;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::config::ServerConfig;
use state::AppState;

/// Build the application router with the middleware stack
pub fn create_app(server: &ServerConfig, health: Option<AppState>) -> Router {
    let mut app = Router::new();

    if let Some(state) = health {
        let dashboard = routes::dashboard_routes(&state.config)
            .layer(TimeoutLayer::new(server.request_timeout()));
        app = app.merge(
            routes::status_routes(&state.config)
                .merge(dashboard)
                .with_state(state),
        );
    }

    app.layer(axum::middleware::from_fn(
        middleware::request_id::add_request_id,
    ))
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }),
    )
}
