/// Prometheus metrics for the movie catalog.
///
/// Counters cover HTTP traffic, propagation of store mutations to the search
/// index, and backfill throughput. Propagation failures never reach API
/// callers, so `index_propagation_total{outcome="failed"}` is the signal to
/// alert on before running a backfill.
///
/// # Example
/// ```no_run
/// use movie_catalog::metrics::INDEX_PROPAGATION_TOTAL;
///
/// INDEX_PROPAGATION_TOTAL
///     .with_label_values(&["upsert", "applied"])
///     .inc();
/// ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
};

const NAMESPACE: &str = "movie_catalog";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
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
    // Index Synchronization Metrics
    // ============================================================================

    /// Propagations of store mutations to the search index
    ///
    /// Labels: operation (upsert, delete), outcome (applied, failed)
    pub static ref INDEX_PROPAGATION_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("index_propagation_total", "Store mutations propagated to the search index")
            .namespace(NAMESPACE),
        &["operation", "outcome"]
    ).expect("Failed to create INDEX_PROPAGATION_TOTAL metric");

    /// Documents processed by backfill runs
    ///
    /// Labels: outcome (indexed, failed, purged)
    pub static ref BACKFILL_DOCUMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("backfill_documents_total", "Documents processed by backfill")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create BACKFILL_DOCUMENTS_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Build information
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register a collector, treating a repeated registration as success
fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Initialize the Prometheus metrics registry
///
/// Safe to call more than once; tests and the CLI share the process-wide registry.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;

    register(Box::new(INDEX_PROPAGATION_TOTAL.clone()))?;
    register(Box::new(BACKFILL_DOCUMENTS_TOTAL.clone()))?;

    register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

/// Generate Prometheus text format metrics for the /metrics endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
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
