//! Prometheus metrics for the search service.
//!
//! Covers the HTTP surface, query execution and index synchronization.
//! Scheduler metrics live in `crate::scheduler` and are registered with the
//! default prometheus registry; `gather_metrics` exports both.
//!
//! # Example
//! ```no_run
//! use cms_search::metrics::SEARCH_QUERIES_TOTAL;
//!
//! SEARCH_QUERIES_TOTAL.with_label_values(&["success"]).inc();
//! ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
};

const NAMESPACE: &str = "cms_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Search Metrics
    // ============================================================================

    /// Labels: outcome (success, failure)
    pub static ref SEARCH_QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_queries_total", "Total number of faceted searches")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create SEARCH_QUERIES_TOTAL metric");

    /// Probe plus page round-trips. Labels: mode (search, browse)
    pub static ref SEARCH_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "search_duration_seconds",
            "Faceted search duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["mode"]
    ).expect("Failed to create SEARCH_DURATION_SECONDS metric");

    // ============================================================================
    // Indexing Metrics
    // ============================================================================

    /// Labels: mode (full, incremental), outcome (completed, failed)
    pub static ref INDEXING_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("indexing_runs_total", "Total number of indexing runs")
            .namespace(NAMESPACE),
        &["mode", "outcome"]
    ).expect("Failed to create INDEXING_RUNS_TOTAL metric");

    /// Labels: mode
    pub static ref INDEXING_RUN_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "indexing_run_duration_seconds",
            "Indexing run duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["mode"]
    ).expect("Failed to create INDEXING_RUN_DURATION_SECONDS metric");

    /// Labels: task (CREATE, MODIFY, DELETE), outcome (applied, failed, skipped)
    pub static ref INDEXING_ACTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("indexing_actions_total", "Total number of queued actions processed")
            .namespace(NAMESPACE),
        &["task", "outcome"]
    ).expect("Failed to create INDEXING_ACTIONS_TOTAL metric");

    pub static ref INDEXING_DOCUMENTS_WRITTEN_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("indexing_documents_written_total", "Total number of documents written to the engine")
            .namespace(NAMESPACE)
    ).expect("Failed to create INDEXING_DOCUMENTS_WRITTEN_TOTAL metric");

    /// 1 while an indexing run holds the guard
    pub static ref INDEXING_RUNNING: Gauge = Gauge::with_opts(
        Opts::new("indexing_running", "Whether an indexing run is in progress")
            .namespace(NAMESPACE)
    ).expect("Failed to create INDEXING_RUNNING metric");

    // ============================================================================
    // Error Metrics
    // ============================================================================

    /// Labels: component, error_type
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of errors")
            .namespace(NAMESPACE),
        &["component", "error_type"]
    ).expect("Failed to create ERRORS_TOTAL metric");

    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register every metric with the global registry.
///
/// Fails with `AlreadyReg` when called twice in one process.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_QUERIES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_DURATION_SECONDS.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_RUNS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_RUN_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_ACTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_DOCUMENTS_WRITTEN_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_RUNNING.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics for the /metrics endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut metric_families = PROMETHEUS_REGISTRY.gather();
    metric_families.extend(prometheus::gather());
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
