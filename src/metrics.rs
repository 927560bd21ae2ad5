// =============================================================================
// METRICS MODULE
// =============================================================================
// Client-side Prometheus metrics: API round-trips, store fetch outcomes,
// write outcomes and debounced filter commits.
//
// The helpers below are no-ops until a recorder is installed, so library
// users and tests can ignore metrics entirely. The binary installs the
// Prometheus recorder via `setup_metrics`.
// =============================================================================

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// METRIC NAMES
// =============================================================================

/// API request counter
/// Labels: method, endpoint, status ("0" when no response arrived)
pub const API_REQUESTS_TOTAL: &str = "catalog_api_requests_total";

/// API request latency histogram
/// Labels: method, endpoint
pub const API_REQUEST_DURATION_SECONDS: &str = "catalog_api_request_duration_seconds";

/// Store fetch outcomes
/// Labels: resource, outcome (applied/superseded/failed)
pub const STORE_FETCHES_TOTAL: &str = "catalog_store_fetches_total";

/// Store write outcomes
/// Labels: resource, operation (create/update/delete), status (success/failed)
pub const STORE_WRITES_TOTAL: &str = "catalog_store_writes_total";

/// Items currently held by a store
/// Labels: resource
pub const STORE_ITEMS: &str = "catalog_store_items";

/// Debounced filter commits
/// Labels: scope
pub const FILTER_COMMITS_TOTAL: &str = "catalog_filter_commits_total";

// =============================================================================
// SETUP FUNCTION
// =============================================================================
/// Installs the Prometheus recorder globally and returns a render handle.
//
// LEARNING NOTE:
// The `metrics` crate is a facade: `counter!` and friends talk to whatever
// recorder is installed process-wide, and there can only be one. Installing
// it here, in the binary, leaves library tests free to run without one.
pub fn setup_metrics() -> Result<PrometheusHandle> {
    // Histogram buckets in seconds; client round-trips include network time,
    // so the upper end goes further than a server-side histogram would
    let latency_buckets = &[
        0.005, // 5ms
        0.01,  // 10ms
        0.025, // 25ms
        0.05,  // 50ms
        0.1,   // 100ms
        0.25,  // 250ms
        0.5,   // 500ms
        1.0,   // 1 second
        2.5,   // 2.5 seconds
        5.0,   // 5 seconds
        10.0,  // 10 seconds
        30.0,  // 30 seconds
    ];

    // Buckets only apply to the latency histogram; everything else uses defaults
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(API_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    // Descriptions become the # HELP lines of the rendered output
    describe_counter!(API_REQUESTS_TOTAL, "Total number of API requests issued");
    describe_histogram!(API_REQUEST_DURATION_SECONDS, "API request latency in seconds");
    describe_counter!(STORE_FETCHES_TOTAL, "Resource store fetches by outcome");
    describe_counter!(STORE_WRITES_TOTAL, "Resource store writes by outcome");
    describe_gauge!(STORE_ITEMS, "Entities currently held by each resource store");
    describe_counter!(FILTER_COMMITS_TOTAL, "Filter drafts committed after the debounce period");

    Ok(handle)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Record one API round-trip.
///
/// # Arguments
/// * `method` - HTTP method (GET, POST, ...)
/// * `endpoint` - Route template (/attributes/:id)
/// * `status` - Response status, 0 for transport failures
/// * `duration_secs` - Elapsed time in seconds
pub fn record_api_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    counter!(
        API_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        API_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

pub fn record_store_fetch(resource: &str, outcome: &str) {
    counter!(
        STORE_FETCHES_TOTAL,
        "resource" => resource.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_store_write(resource: &str, operation: &str, success: bool) {
    let status = if success { "success" } else { "failed" };
    counter!(
        STORE_WRITES_TOTAL,
        "resource" => resource.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn set_store_items(resource: &str, count: usize) {
    gauge!(STORE_ITEMS, "resource" => resource.to_string()).set(count as f64);
}

pub fn record_filter_commit(scope: &str) {
    counter!(FILTER_COMMITS_TOTAL, "scope" => scope.to_string()).increment(1);
}
