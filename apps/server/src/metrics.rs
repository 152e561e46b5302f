//! Prometheus metrics for the FitTrack API.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

lazy_static! {
    // HTTP

    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fittrack_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "fittrack_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "fittrack_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // List queries

    /// List requests by collection and outcome
    pub static ref LIST_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fittrack_list_queries_total",
        "Total number of list queries",
        &["collection", "status"]
    )
    .expect("Failed to register LIST_QUERIES_TOTAL");

    /// Records returned per list page
    pub static ref LIST_PAGE_SIZE: HistogramVec = register_histogram_vec!(
        "fittrack_list_page_size",
        "Number of records returned in one list page",
        &["collection"],
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .expect("Failed to register LIST_PAGE_SIZE");

    // Store

    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "fittrack_store_operation_duration_seconds",
        "Document store operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to register STORE_OPERATION_DURATION_SECONDS");

    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fittrack_store_errors_total",
        "Total number of document store errors",
        &["operation", "code"]
    )
    .expect("Failed to register STORE_ERRORS_TOTAL");

    /// Documents created through the API or the seeder
    pub static ref DOCUMENTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fittrack_documents_created_total",
        "Total number of documents created",
        &["collection"]
    )
    .expect("Failed to register DOCUMENTS_CREATED_TOTAL");
}

/// Collapse document ids to `{id}` so paths stay low-cardinality labels.
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => "/".to_string(),
        ["api", collection] => format!("/api/{collection}"),
        ["api", collection, _id, ..] => format!("/api/{collection}/{{id}}"),
        [first, ..] => format!("/{first}"),
    }
}

/// Collection addressed by an `/api/...` path.
pub fn extract_collection(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("api"), Some(collection)) => Some(collection),
        _ => None,
    }
}
