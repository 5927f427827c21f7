//! Prometheus metrics for the cell monitor
//!
//! This module tracks:
//! - Change signals: received by kind, suppressed by the cooldown, emitted
//! - Reports: outcome by route, dropped reports, in-flight count, duration
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, or it is never called, every recorder is a no-op.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for change pipeline metrics
struct MonitorMetrics {
    signals: CounterVec,
    suppressed: Counter,
    emissions: Counter,
}

/// Container for report delivery metrics
struct ReportMetrics {
    reports: CounterVec,
    dropped: CounterVec,
    in_flight: Gauge,
    duration: HistogramVec,
}

static MONITOR_METRICS: OnceLock<MonitorMetrics> = OnceLock::new();

static REPORT_METRICS: OnceLock<ReportMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = cellwatch::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let monitor = MonitorMetrics {
        signals: register_counter_vec!(
            "cellwatch_signals_total",
            "Change signals received for watched cells by kind",
            &["kind"]
        )?,
        suppressed: register_counter!(
            "cellwatch_signals_suppressed_total",
            "Change signals suppressed by an active cooldown"
        )?,
        emissions: register_counter!(
            "cellwatch_emissions_total",
            "Debounced cell snapshots emitted"
        )?,
    };

    let report = ReportMetrics {
        reports: register_counter_vec!(
            "cellwatch_reports_total",
            "Reports delivered by route and outcome",
            &["route", "outcome"]
        )?,
        dropped: register_counter_vec!(
            "cellwatch_reports_dropped_total",
            "Reports dropped because the pending limit was reached",
            &["route"]
        )?,
        in_flight: register_gauge!(
            "cellwatch_reports_in_flight",
            "Reports currently being delivered"
        )?,
        duration: register_histogram_vec!(
            "cellwatch_report_duration_seconds",
            "Report delivery duration in seconds",
            &["route"],
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    MONITOR_METRICS
        .set(monitor)
        .map_err(|_| "Monitor metrics already initialized")?;
    REPORT_METRICS
        .set(report)
        .map_err(|_| "Report metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    MONITOR_METRICS.get().is_some() && REPORT_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a change signal for a watched cell
pub fn record_signal(kind: &str) {
    if let Some(m) = MONITOR_METRICS.get() {
        m.signals.with_label_values(&[kind]).inc();
    }
}

/// Record a signal dropped by the cooldown
pub fn record_suppressed() {
    if let Some(m) = MONITOR_METRICS.get() {
        m.suppressed.inc();
    }
}

/// Record a debounced emission
pub fn record_emission() {
    if let Some(m) = MONITOR_METRICS.get() {
        m.emissions.inc();
    }
}

/// Record the outcome of one delivery
pub fn record_report(route: &str, outcome: &str) {
    if let Some(m) = REPORT_METRICS.get() {
        m.reports.with_label_values(&[route, outcome]).inc();
    }
}

/// Record a report dropped at the pending limit
pub fn record_dropped(route: &str) {
    if let Some(m) = REPORT_METRICS.get() {
        m.dropped.with_label_values(&[route]).inc();
    }
}

/// Adjust the in-flight gauge
pub fn update_in_flight(delta: i64) {
    if let Some(m) = REPORT_METRICS.get() {
        if delta >= 0 {
            m.in_flight.add(delta as f64);
        } else {
            m.in_flight.sub(delta.unsigned_abs() as f64);
        }
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a delivery timer for a route
pub fn start_report_timer(route: &str) -> MetricsTimer {
    match REPORT_METRICS.get() {
        Some(m) => MetricsTimer::new(m.duration.with_label_values(&[route]).start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
