//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus exporter
//! - Record per-request counters and latency
//! - Provide the counting observer for intercepted operations
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency by method
//! - `account.fetch{type="fromAspect"}` (counter): "list all accounts" calls,
//!   exported as `account_fetch`
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed exporter is a no-op

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::observability::intercept::{Invocation, Observer, ObserverError};

/// Counter incremented on every "list all accounts" call.
pub const ACCOUNT_LIST_COUNTER: &str = "account.fetch";

/// `type` label carried by observer counters, kept stable for dashboards.
pub const OBSERVER_COUNTER_TYPE: &str = "fromAspect";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Increments a named counter once per observed call, before the call runs.
#[derive(Debug)]
pub struct MetricsObserver {
    counter: String,
    count: AtomicU64,
}

impl MetricsObserver {
    pub fn new(counter: impl Into<String>) -> Self {
        Self {
            counter: counter.into(),
            count: AtomicU64::new(0),
        }
    }

    pub fn counter_name(&self) -> &str {
        &self.counter
    }

    /// Increments seen by this observer.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Observer for MetricsObserver {
    fn name(&self) -> &str {
        &self.counter
    }

    fn before(&self, invocation: &Invocation<'_>) -> Result<(), ObserverError> {
        self.count.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            self.counter.clone(),
            "type" => OBSERVER_COUNTER_TYPE,
            "operation" => invocation.operation().to_string()
        )
        .increment(1);
        Ok(())
    }
}
