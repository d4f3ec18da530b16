//! Request logging and visitor tracking middleware.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::extractors::client_ip;
use crate::state::AppState;

/// Header carrying the per-request trace id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs method, path, status, and duration under a per-request span, and
/// records the client as an active visitor.
pub async fn request_logging(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = client_ip(request.headers(), request.extensions());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Some(ip) = ip.as_deref() {
        state.visitors.record(ip);
    }

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        client_ip = ip.as_deref().unwrap_or("-"),
    );

    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    let _entered = span.enter();
    if response.status().is_server_error() {
        error!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_agent = %user_agent,
            "HTTP request"
        );
    } else if response.status().is_client_error() {
        warn!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_agent = %user_agent,
            "HTTP request"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_agent = %user_agent,
            "HTTP request"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
