//! Metrics collection and exposition.
//!
//! # Metrics
//! - `autoroute_routes_registered` (gauge): rows registered at startup
//! - `autoroute_request_errors_total` (counter): errors answered by the
//!   default handler, by status
//! - `autoroute_not_found_total` (counter): requests no route matched
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Status is the only label; paths would be unbounded

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const ROUTES_REGISTERED: &str = "autoroute_routes_registered";
pub const REQUEST_ERRORS: &str = "autoroute_request_errors_total";
pub const NOT_FOUND: &str = "autoroute_not_found_total";

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    metrics::describe_gauge!(ROUTES_REGISTERED, "Route rows registered at startup");
    metrics::describe_counter!(REQUEST_ERRORS, "Errors answered by the default error handler");
    metrics::describe_counter!(NOT_FOUND, "Requests that matched no route");
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_routes_registered(count: usize) {
    metrics::gauge!(ROUTES_REGISTERED).set(count as f64);
}

pub fn record_request_error(status: u16) {
    metrics::counter!(REQUEST_ERRORS, "status" => status.to_string()).increment(1);
}

pub fn record_not_found() {
    metrics::counter!(NOT_FOUND).increment(1);
}
