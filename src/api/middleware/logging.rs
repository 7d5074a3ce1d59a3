//! Access logging for prediction traffic
//!
//! Only the headers listed in [`LOGGED_HEADERS`] reach the log. The API
//! takes no credentials, and an allowlist keeps any a proxy adds out.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, warn};

const LOGGED_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "user-agent",
    "x-forwarded-for",
    "x-real-ip",
];

/// Logs each request on arrival at debug and on completion at info.
///
/// Runs inside `TraceLayer`, which owns the request span. Server errors
/// are logged at warn.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = route_of(&request);
    let request_id = header_str(request.headers(), "x-request-id").unwrap_or("-").to_string();

    debug!(
        method = %method,
        route = %route,
        request_id = %request_id,
        headers = %loggable_headers(request.headers()),
        "Request received"
    );

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        warn!(method = %method, route = %route, status, elapsed_ms, request_id = %request_id, "Request failed");
    } else {
        info!(method = %method, route = %route, status, elapsed_ms, request_id = %request_id, "Request served");
    }

    response
}

/// Matched route template, so `/v1/predict` logs the same for every body
fn route_of(request: &Request<Body>) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn loggable_headers(headers: &HeaderMap) -> String {
    LOGGED_HEADERS
        .iter()
        .filter_map(|name| header_str(headers, name).map(|value| format!("{}={}", name, value)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_only_allowlisted_headers_are_logged() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7"));
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("cookie", HeaderValue::from_static("session=abc"));

        let logged = loggable_headers(&headers);

        assert_eq!(logged, "content-type=application/json, x-forwarded-for=10.0.0.7");
        assert!(!logged.contains("secret"));
    }

    #[test]
    fn test_non_utf8_header_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_bytes(b"\xffbot").unwrap());

        assert_eq!(loggable_headers(&headers), "");
    }

    #[tokio::test]
    async fn test_middleware_passes_response_through() {
        let app = Router::new()
            .route("/trips/{id}", get(|| async { StatusCode::ACCEPTED }))
            .layer(middleware::from_fn(logging_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trips/7")
                    .header("x-request-id", "req-9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
