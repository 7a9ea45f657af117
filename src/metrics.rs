// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the `RayCluster` controller.

use std::sync::LazyLock;
use std::time::Duration;

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

const METRICS_NAMESPACE: &str = "raycluster_controller";

/// Process-wide metrics registry.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations, labeled by outcome (`success`, `error`).
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of RayCluster reconciliations by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Reconciliation duration in seconds.
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of RayCluster reconciliations in seconds",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

/// Total number of dependent objects created, labeled by kind.
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_created_total"),
        "Total number of dependent objects created, by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Total number of dependent objects deleted, labeled by kind.
pub static RESOURCES_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_deleted_total"),
        "Total number of dependent objects deleted, by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Total number of errors, labeled by error kind (see `errors::Error::kind_str`).
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of reconciliation errors by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Record a successful reconciliation and its duration.
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation and its duration.
pub fn record_reconciliation_error(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
}

/// Record creation of a dependent object of the given kind (e.g. "Pod", "Service").
pub fn record_resource_created(kind: &str) {
    RESOURCES_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record deletion of a dependent object of the given kind.
pub fn record_resource_deleted(kind: &str) {
    RESOURCES_DELETED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record an error of the given kind (see `errors::Error::kind_str`).
pub fn record_error(kind: &str) {
    ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Gather and encode all metrics in Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reconciliation_success_increments_counter() {
        record_reconciliation_success(Duration::from_millis(10));
        let counter = RECONCILIATION_TOTAL.with_label_values(&["success"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn gather_metrics_includes_namespace_prefix() {
        record_resource_created("Pod");
        let text = gather_metrics().unwrap();
        assert!(text.contains("raycluster_controller_resources_created_total"));
    }
}
