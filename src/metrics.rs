// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the DNS source controllers.
//!
//! All metrics carry the namespace prefix `dnsman`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconciliations per source controller and their outcome
//! - **Entry Metrics** - `DNSEntry` objects created, updated and deleted on behalf of sources
//! - **Event Metrics** - Events recorded on source objects
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsman::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("service-source", std::time::Duration::from_millis(20));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "dnsman";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by controller and status
///
/// Labels:
/// - `controller`: Name of the controller (e.g., `service-source`)
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by controller and status",
    );
    let counter = CounterVec::new(opts, &["controller", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `controller`: Name of the controller
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by controller",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["controller"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Entry Metrics
// ============================================================================

/// Total number of `DNSEntry` operations performed for source objects
///
/// Labels:
/// - `controller`: Name of the controller
/// - `operation`: `created`, `updated` or `deleted`
pub static ENTRY_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_entry_operations_total"),
        "Total number of DNSEntry operations by controller and operation",
    );
    let counter = CounterVec::new(opts, &["controller", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Event Metrics
// ============================================================================

/// Total number of events recorded on source objects
///
/// Labels:
/// - `type`: `Normal` or `Warning`
/// - `reason`: Event reason (e.g., `DNSEntryCreated`)
pub static EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_events_total"),
        "Total number of events recorded by type and reason",
    );
    let counter = CounterVec::new(opts, &["type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
///
/// # Arguments
/// * `controller` - Name of the controller
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(controller: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[controller, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[controller])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `controller` - Name of the controller
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(controller: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[controller, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[controller])
        .observe(duration.as_secs_f64());
}

/// Record a `DNSEntry` operation
///
/// # Arguments
/// * `controller` - Name of the controller
/// * `operation` - `created`, `updated` or `deleted`
pub fn record_entry_operation(controller: &str, operation: &str) {
    ENTRY_OPERATIONS_TOTAL
        .with_label_values(&[controller, operation])
        .inc();
}

/// Record an event
///
/// # Arguments
/// * `event_type` - `Normal` or `Warning`
/// * `reason` - Event reason
pub fn record_event(event_type: &str, reason: &str) {
    EVENTS_TOTAL.with_label_values(&[event_type, reason]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
