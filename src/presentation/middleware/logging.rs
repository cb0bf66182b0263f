//! Request Logging and Metrics
//!
//! HTTP trace spans plus a middleware feeding the Prometheus request
//! counters.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http,
    middleware::Next,
    response::Response,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use crate::infrastructure::metrics;

/// Trace layer with one span per request carrying method, route and a
/// request id.
pub fn create_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&http::Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|request: &http::Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %route_label(request),
                %request_id,
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

/// Matched route template when available so ids don't explode label
/// cardinality.
fn route_label<B>(request: &http::Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned())
}

/// Records request count and latency for every response.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = route_label(&request);

    let response = next.run(request).await;

    metrics::record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_recorded_with_route_template() {
        let app = Router::new()
            .route("/api/v1/courses/{id}", get(|| async { "course" }))
            .layer(middleware::from_fn(metrics_middleware));

        let request = http::Request::builder()
            .uri("/api/v1/courses/42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);

        let output = metrics::gather_metrics();
        assert!(output.contains("/api/v1/courses/{id}"));
        assert!(!output.contains("/api/v1/courses/42"));
    }

    #[test]
    fn test_route_label_falls_back_to_uri() {
        let request = http::Request::builder()
            .uri("/unmatched/path")
            .body(())
            .unwrap();
        assert_eq!(route_label(&request), "/unmatched/path");
    }
}
