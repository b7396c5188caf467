//! Observability infrastructure for the exporter itself
//!
//! Provides:
//! - Prometheus self-metrics (per-collector scrape duration, success, skipped objects)
//! - Structured JSON logging with tracing, tagged per collector

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, GaugeVec, HistogramVec,
    IntCounterVec,
};
use std::fmt::Display;
use std::sync::OnceLock;
use tracing::{debug, error};

/// Histogram buckets for collector durations (in seconds)
const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ExporterMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ExporterMetricsInner {
    collector_duration_seconds: HistogramVec,
    collector_success: GaugeVec,
    collector_errors: IntCounterVec,
    objects_skipped: IntCounterVec,
}

impl ExporterMetricsInner {
    fn new() -> Self {
        Self {
            collector_duration_seconds: register_histogram_vec!(
                "nsxt_exporter_collector_duration_seconds",
                "Time spent by a collector during one scrape",
                &["collector"],
                DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register collector_duration_seconds"),

            collector_success: register_gauge_vec!(
                "nsxt_exporter_collector_success",
                "Whether the collector completed its last scrape (1) or failed (0)",
                &["collector"]
            )
            .expect("Failed to register collector_success"),

            collector_errors: register_int_counter_vec!(
                "nsxt_exporter_collector_errors_total",
                "Total number of scrapes in which the collector failed",
                &["collector"]
            )
            .expect("Failed to register collector_errors"),

            objects_skipped: register_int_counter_vec!(
                "nsxt_exporter_objects_skipped_total",
                "Total number of objects skipped because their detail call failed",
                &["collector"]
            )
            .expect("Failed to register objects_skipped"),
        }
    }
}

/// Exporter self-metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    _private: (),
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ExporterMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the outcome of one collector run
    pub fn observe_collector(&self, collector: &str, duration_secs: f64, success: bool) {
        let inner = self.inner();
        inner
            .collector_duration_seconds
            .with_label_values(&[collector])
            .observe(duration_secs);
        inner
            .collector_success
            .with_label_values(&[collector])
            .set(if success { 1.0 } else { 0.0 });
        if !success {
            inner.collector_errors.with_label_values(&[collector]).inc();
        }
    }

    /// Add objects skipped during one collector run
    pub fn add_objects_skipped(&self, collector: &str, count: usize) {
        if count > 0 {
            self.inner()
                .objects_skipped
                .with_label_values(&[collector])
                .inc_by(count as u64);
        }
    }
}

/// Structured logger for collector events
///
/// Every event carries the collector key so failures can be attributed to one
/// object family.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    collector: String,
}

impl StructuredLogger {
    pub fn new(collector: impl Into<String>) -> Self {
        Self {
            collector: collector.into(),
        }
    }

    pub fn collector(&self) -> &str {
        &self.collector
    }

    /// Log a failed list call; the family emits nothing this scrape
    pub fn log_list_failure(&self, object: &str, err: &dyn Display) {
        error!(
            event = "list_failed",
            collector = %self.collector,
            object = %object,
            error = %err,
            "Failed to list objects, skipping collector for this scrape"
        );
    }

    /// Log a failed per-object detail call; only that object is skipped
    pub fn log_status_failure(&self, object: &str, id: &str, err: &dyn Display) {
        error!(
            event = "status_failed",
            collector = %self.collector,
            object = %object,
            id = %id,
            error = %err,
            "Failed to fetch object status, skipping object"
        );
    }

    /// Log a failed independent sub-probe
    pub fn log_probe_failure(&self, probe: &str, err: &dyn Display) {
        error!(
            event = "probe_failed",
            collector = %self.collector,
            probe = %probe,
            error = %err,
            "Probe failed"
        );
    }

    /// Log a finished collector run
    pub fn log_collected(&self, objects: usize, skipped: usize, elapsed_ms: u128) {
        debug!(
            event = "collected",
            collector = %self.collector,
            objects = objects,
            skipped = skipped,
            elapsed_ms = elapsed_ms,
            "Collector finished"
        );
    }
}
