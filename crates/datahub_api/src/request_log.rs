//! Per-request access log.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;
use uuid::Uuid;

/// Logs one `event=http_request` line per request. Only the path is logged,
/// never the query string or body.
pub(crate) async fn log_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis();

    if status.is_success() {
        info!(
            "event=http_request module=api status=ok request_id={} method={} path={} http_status={} duration_ms={}",
            request_id,
            method,
            path,
            status.as_u16(),
            duration_ms
        );
    } else {
        warn!(
            "event=http_request module=api status=error request_id={} method={} path={} http_status={} duration_ms={}",
            request_id,
            method,
            path,
            status.as_u16(),
            duration_ms
        );
    }

    response
}
