//! Prometheus metrics for the receipt routes.
//!
//! Collected into a single registry and served as text from `GET /metrics`.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    /// Route template, e.g. "/receipts/process"
    pub route: String,
    /// "success" or an error category
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LookupLabels {
    /// "found" or "missing"
    pub result: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectionLabels {
    pub reason: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Receipts accepted and stored
    pub receipts_processed: Counter,

    /// Receipts rejected, by reason ("decode" or "validation")
    pub receipts_rejected: Family<RejectionLabels, Counter>,

    /// Points lookups by result
    pub points_lookups: Family<LookupLabels, Counter>,

    /// Request latency by route and outcome
    pub http_request_duration_seconds: Family<RouteLabels, Histogram>,

    /// Records held in the store, sampled at scrape time
    pub receipts_stored: Gauge,

    /// Identifiers generated from the timestamp fallback
    pub id_fallbacks: Counter,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let receipts_processed = Counter::default();
        registry.register(
            "receipts_processed",
            "Receipts accepted, scored and stored",
            receipts_processed.clone(),
        );

        let receipts_rejected = Family::<RejectionLabels, Counter>::default();
        registry.register(
            "receipts_rejected",
            "Receipts rejected as malformed or invalid",
            receipts_rejected.clone(),
        );

        let points_lookups = Family::<LookupLabels, Counter>::default();
        registry.register(
            "points_lookups",
            "Points lookups by identifier",
            points_lookups.clone(),
        );

        let http_request_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                // 100us .. ~1.6s
                Histogram::new(exponential_buckets(0.0001, 2.5, 12))
            });
        registry.register(
            "http_request_duration_seconds",
            "Request latency histogram in seconds",
            http_request_duration_seconds.clone(),
        );

        let receipts_stored = Gauge::default();
        registry.register(
            "receipts_stored",
            "Number of receipt scores held in memory",
            receipts_stored.clone(),
        );

        let id_fallbacks = Counter::default();
        registry.register(
            "id_fallbacks",
            "Identifiers generated from the timestamp fallback",
            id_fallbacks.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            receipts_processed,
            receipts_rejected,
            points_lookups,
            http_request_duration_seconds,
            receipts_stored,
            id_fallbacks,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        Self::encode_registry(&registry)
    }

    /// Sets the store gauge to `stored` and encodes, holding the registry
    /// lock across both so concurrent scrapes cannot interleave.
    pub fn encode_with_stored(&self, stored: usize) -> String {
        let registry = self.registry.write();
        self.receipts_stored.set(stored as i64);
        Self::encode_registry(&registry)
    }

    fn encode_registry(registry: &Registry) -> String {
        let mut buffer = String::new();
        if let Err(error) = encode(&mut buffer, registry) {
            tracing::error!(%error, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_processed(&self) {
        self.receipts_processed.inc();
    }

    pub fn record_rejected(&self, reason: &str) {
        self.receipts_rejected
            .get_or_create(&RejectionLabels {
                reason: reason.to_string(),
            })
            .inc();
    }

    pub fn record_lookup(&self, found: bool) {
        let result = if found { "found" } else { "missing" };
        self.points_lookups
            .get_or_create(&LookupLabels {
                result: result.to_string(),
            })
            .inc();
    }

    pub fn record_id_fallback(&self) {
        self.id_fallbacks.inc();
    }

    pub fn record_request(&self, route: &str, outcome: &str, duration: Duration) {
        self.http_request_duration_seconds
            .get_or_create(&RouteLabels {
                route: route.to_string(),
                outcome: outcome.to_string(),
            })
            .observe(duration.as_secs_f64());
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Times a request and records it on drop.
///
/// Outcome defaults to "dropped" unless [`RequestTimer::finish`] is called,
/// which covers handlers that are cancelled mid-flight.
pub struct RequestTimer {
    route: &'static str,
    start: Instant,
    outcome: Option<&'static str>,
}

impl RequestTimer {
    pub fn start(route: &'static str) -> Self {
        Self {
            route,
            start: Instant::now(),
            outcome: None,
        }
    }

    pub fn finish(mut self, outcome: &'static str) {
        self.outcome = Some(outcome);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or("dropped");
        METRICS.record_request(self.route, outcome, self.start.elapsed());
    }
}
