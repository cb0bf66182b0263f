//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Database connection pool gauges
//! - Domain counters: enrollments, lesson progress updates, course publications

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tracing::error;

const NAMESPACE: &str = "smart_courses";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Successful enrollments
pub static ENROLLMENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("enrollments_total", "Number of course enrollments").namespace(NAMESPACE),
    )
    .expect("Failed to create ENROLLMENTS_TOTAL metric")
});

/// Lesson progress writes, labelled by whether the enrollment completed
pub static LESSON_PROGRESS_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lesson_progress_updates_total",
            "Number of lesson progress updates",
        )
        .namespace(NAMESPACE),
        &["course_completed"],
    )
    .expect("Failed to create LESSON_PROGRESS_UPDATES_TOTAL metric")
});

/// Courses switched to published
pub static COURSES_PUBLISHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("courses_published_total", "Number of course publications")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create COURSES_PUBLISHED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(DB_POOL_CONNECTIONS.clone()))
        .expect("Failed to register DB_POOL_CONNECTIONS");
    registry
        .register(Box::new(ENROLLMENTS_TOTAL.clone()))
        .expect("Failed to register ENROLLMENTS_TOTAL");
    registry
        .register(Box::new(LESSON_PROGRESS_UPDATES_TOTAL.clone()))
        .expect("Failed to register LESSON_PROGRESS_UPDATES_TOTAL");
    registry
        .register(Box::new(COURSES_PUBLISHED_TOTAL.clone()))
        .expect("Failed to register COURSES_PUBLISHED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}

pub fn record_enrollment() {
    ENROLLMENTS_TOTAL.inc();
}

pub fn record_lesson_progress(course_completed: bool) {
    LESSON_PROGRESS_UPDATES_TOTAL
        .with_label_values(&[if course_completed { "true" } else { "false" }])
        .inc();
}

pub fn record_course_published() {
    COURSES_PUBLISHED_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = &*REGISTRY;
        let _ = &*HTTP_REQUESTS_TOTAL;
        let _ = &*ENROLLMENTS_TOTAL;
        let _ = &*LESSON_PROGRESS_UPDATES_TOTAL;
    }

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, 0.001);
        let metrics = gather_metrics();
        assert!(metrics.contains("smart_courses_http_requests_total"));
    }

    #[test]
    fn test_domain_counters_exported() {
        record_enrollment();
        record_lesson_progress(true);
        record_course_published();
        let metrics = gather_metrics();

        assert!(metrics.contains("smart_courses_enrollments_total"));
        assert!(metrics.contains("smart_courses_lesson_progress_updates_total"));
        assert!(metrics.contains("smart_courses_courses_published_total"));
    }
}
