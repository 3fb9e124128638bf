//! Prometheus metrics for questline.
//!
//! All metrics follow the naming convention: `ql_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PROGRESSION METRICS (Crate 01)
    // =========================================================================

    /// Successful quest purchases
    pub static ref QUESTS_PURCHASED: Counter = Counter::new(
        "ql_progression_quests_purchased_total",
        "Total number of committed quest purchases"
    ).expect("metric creation failed");

    /// Currency spent on purchases
    pub static ref COINS_SPENT: Counter = Counter::new(
        "ql_progression_coins_spent_total",
        "Total currency debited by purchases"
    ).expect("metric creation failed");

    /// Task completions
    pub static ref TASKS_COMPLETED: Counter = Counter::new(
        "ql_progression_tasks_completed_total",
        "Total number of completed tasks"
    ).expect("metric creation failed");

    /// Quest completions, by solo/shared
    pub static ref QUESTS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("ql_progression_quests_completed_total", "Completed quests"),
        &["kind"]  // kind: solo/shared
    ).expect("metric creation failed");

    /// Level-ups granted by credits
    pub static ref LEVEL_UPS: Counter = Counter::new(
        "ql_progression_level_ups_total",
        "Total number of level thresholds crossed"
    ).expect("metric creation failed");

    /// Rejected or failed operations by operation and error kind
    pub static ref OPERATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new("ql_progression_failures_total", "Failed progression operations"),
        &["operation", "error_kind"]
    ).expect("metric creation failed");

    /// Time spent inside a progression transaction
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "ql_progression_operation_duration_seconds",
            "Time spent executing progression operations"
        ).buckets(exponential_buckets(0.00005, 2.0, 14).expect("bucket layout")),
        &["operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // RECOMMENDATION SYNC METRICS (Crate 02)
    // =========================================================================

    /// Recommendation sync attempts by outcome
    pub static ref RECOMMENDATION_SYNCS: CounterVec = CounterVec::new(
        Opts::new("ql_recommendation_syncs_total", "Recommendation sync attempts"),
        &["outcome"]  // outcome: ok/failed
    ).expect("metric creation failed");

    /// Recommendation request latency
    pub static ref RECOMMENDATION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ql_recommendation_request_duration_seconds",
            "Time spent posting user quest lists"
        ).buckets(exponential_buckets(0.001, 2.0, 12).expect("bucket layout"))
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Progression
        Box::new(QUESTS_PURCHASED.clone()),
        Box::new(COINS_SPENT.clone()),
        Box::new(TASKS_COMPLETED.clone()),
        Box::new(QUESTS_COMPLETED.clone()),
        Box::new(LEVEL_UPS.clone()),
        Box::new(OPERATION_FAILURES.clone()),
        Box::new(OPERATION_DURATION.clone()),
        // Recommendation sync
        Box::new(RECOMMENDATION_SYNCS.clone()),
        Box::new(RECOMMENDATION_LATENCY.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a timer for one label set of a histogram vector.
    pub fn labelled(histogram: &HistogramVec, labels: &[&str]) -> Self {
        Self::new(&histogram.with_label_values(labels))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
