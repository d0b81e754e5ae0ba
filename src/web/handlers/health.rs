//! # Status Endpoint Handler
//!
//! Machine-readable health report. Always answers 200: the body carries the
//! status, so load balancers and monitors read the word, not the HTTP code.

use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::debug;

use crate::web::middleware::request_id::RequestId;
use crate::web::response_types::HealthReportResponse;
use crate::web::state::AppState;

/// Status endpoint: GET `<UrlHealthCheck>` (default `/hc`)
///
/// `Accept: text/plain` (without JSON) returns just the status word.
pub async fn health_status(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
) -> Response {
    let report = state.current_report().await;

    debug!(
        request_id = request_id.as_ref().map(|Extension(id)| id.as_str()),
        cycle_id = %report.id,
        status = %report.status,
        mode = ?state.config.status_mode,
        "Serving health report"
    );

    if prefers_plain_text(&headers) {
        return (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            report.status.as_str(),
        )
            .into_response();
    }

    (StatusCode::OK, Json(HealthReportResponse::from(report.as_ref()))).into_response()
}

fn prefers_plain_text(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let accept = accept.to_ascii_lowercase();
    accept.contains("text/plain") && !accept.contains("application/json")
}
