//! # Dashboard Handlers
//!
//! The dashboard page, its JSON data API and the server-sent event feed that
//! pushes each scheduled report and notification to open pages. All three read
//! the latest scheduled report and the history store; none triggers an
//! evaluation.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::Json;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::health::DashboardEvent;
use crate::web::response_types::{DashboardResponse, ReportEventResponse};
use crate::web::state::AppState;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Dashboard page: GET `<ui_path>` (default `/hc-ui`)
pub async fn dashboard_ui(State(state): State<AppState>) -> Html<String> {
    Html(
        DASHBOARD_HTML
            .replace("__APPLICATION__", &html_escape(&state.build_info.label()))
            .replace("__API_PATH__", &state.config.api_path)
            .replace("__STREAM_PATH__", &state.config.stream_path()),
    )
}

/// Dashboard data: GET `<api_path>` (default `/hc-ui-api`)
pub async fn dashboard_api(State(state): State<AppState>) -> Json<DashboardResponse> {
    let latest = state.cache.latest().await;
    let history = state.history.snapshot().await;

    Json(DashboardResponse::new(
        &state.build_info,
        latest.as_deref(),
        &history,
    ))
}

struct StreamState {
    events: broadcast::Receiver<DashboardEvent>,
    closed: watch::Receiver<bool>,
}

/// Dashboard feed: GET `<api_path>/stream`
///
/// Emits a `report` event per scheduled cycle and a `notification` event per
/// failure or recovery signal. A lagging client skips missed events.
pub async fn dashboard_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial = StreamState {
        events: state.events.subscribe(),
        closed: state.closed.subscribe(),
    };

    let stream = stream::unfold(initial, |mut s| async move {
        loop {
            if *s.closed.borrow() {
                return None;
            }
            tokio::select! {
                changed = s.closed.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                received = s.events.recv() => match received {
                    Ok(event) => return Some((Ok(to_sse_event(&event)), s)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped = skipped, "Dashboard stream lagged, skipping events");
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: &DashboardEvent) -> Event {
    let built = match event {
        DashboardEvent::Report(report) => Event::default()
            .event("report")
            .json_data(ReportEventResponse::from(report.as_ref())),
        DashboardEvent::Notification(notification) => {
            Event::default().event("notification").json_data(notification)
        }
    };
    built.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
