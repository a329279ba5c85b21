//! Metrics collection and exposition.
//!
//! # Metrics
//! - `asset_requests_total` (counter): intercepted requests by preprocessor, status
//! - `asset_request_duration_seconds` (histogram): intercepted request latency
//! - `asset_cache_total` (counter): cache hits and misses by preprocessor
//! - `asset_builds_total` (counter): compiler runs by preprocessor, outcome
//! - `asset_build_duration_seconds` (histogram): compiler run latency
//!
//! # Design Decisions
//! - Pass-through requests are not recorded
//! - Labels stay low-cardinality (no URLs or paths)

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::build::CacheStatus;

static DESCRIPTIONS: Once = Once::new();

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "asset_requests_total",
            Unit::Count,
            "Intercepted asset requests by preprocessor and status."
        );
        describe_histogram!(
            "asset_request_duration_seconds",
            Unit::Seconds,
            "Time to answer an intercepted asset request."
        );
        describe_counter!(
            "asset_cache_total",
            Unit::Count,
            "Compiled-output cache lookups by result."
        );
        describe_counter!(
            "asset_builds_total",
            Unit::Count,
            "Compiler runs by preprocessor and outcome."
        );
        describe_histogram!(
            "asset_build_duration_seconds",
            Unit::Seconds,
            "Compiler run latency."
        );
    });
}

/// Record an intercepted request.
pub fn record_asset_request(preprocessor: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "asset_requests_total",
        "preprocessor" => preprocessor.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "asset_request_duration_seconds",
        "preprocessor" => preprocessor.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a cache lookup.
pub fn record_cache(preprocessor: &str, status: CacheStatus) {
    counter!(
        "asset_cache_total",
        "preprocessor" => preprocessor.to_string(),
        "result" => status.as_str()
    )
    .increment(1);
}

/// Record a compiler run.
pub fn record_build(preprocessor: &str, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "asset_builds_total",
        "preprocessor" => preprocessor.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "asset_build_duration_seconds",
        "preprocessor" => preprocessor.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}
