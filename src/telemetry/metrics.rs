use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

const METRICS_NAMESPACE: &str = "herald";
const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

static GLOBAL_METRICS: OnceLock<Arc<Metrics>> = OnceLock::new();

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct InfoLabels {
    version: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct TargetSendLabels {
    target: String,
    outcome: String,
}

/// Result of a single target invocation, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Success,
    Failure,
    Panic,
}

impl SendOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Panic => "panic",
        }
    }
}

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Mutex<Registry>>,
    info: Family<InfoLabels, Gauge>,
    dispatches_total: Counter,
    dispatch_failures_total: Counter,
    target_sends_total: Family<TargetSendLabels, Counter>,
    dispatch_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let info = Family::<InfoLabels, Gauge>::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_info"),
            "Information about the herald library",
            info.clone(),
        );

        let dispatches_total = Counter::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_dispatches"),
            "Total number of fan-out sends performed",
            dispatches_total.clone(),
        );

        let dispatch_failures_total = Counter::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_dispatch_failures"),
            "Total number of fan-out sends where at least one target failed",
            dispatch_failures_total.clone(),
        );

        let target_sends_total = Family::<TargetSendLabels, Counter>::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_target_sends"),
            "Total number of individual target send attempts",
            target_sends_total.clone(),
        );

        let dispatch_duration_seconds =
            Histogram::new([0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
        registry.register(
            format!("{METRICS_NAMESPACE}_dispatch_duration_seconds"),
            "Time from fan-out start until every target finished",
            dispatch_duration_seconds.clone(),
        );

        let metrics = Self {
            registry: Arc::new(Mutex::new(registry)),
            info,
            dispatches_total,
            dispatch_failures_total,
            target_sends_total,
            dispatch_duration_seconds,
        };

        metrics
            .info
            .get_or_create(&InfoLabels {
                version: BUILD_VERSION.to_string(),
            })
            .set(1);
        metrics
    }

    pub fn set_global(metrics: Arc<Metrics>) -> bool {
        GLOBAL_METRICS.set(metrics).is_ok()
    }

    pub fn global() -> Option<Arc<Metrics>> {
        GLOBAL_METRICS.get().cloned()
    }

    pub fn record_target_send(&self, target: &str, outcome: SendOutcome) {
        self.target_sends_total
            .get_or_create(&TargetSendLabels {
                target: target.to_string(),
                outcome: outcome.as_str().to_string(),
            })
            .inc();
    }

    /// Records a completed fan-out.
    ///
    /// # Arguments
    /// * `duration` - Time until the last target finished
    /// * `success` - Whether every target succeeded
    pub fn record_dispatch(&self, duration: Duration, success: bool) {
        self.dispatches_total.inc();
        self.dispatch_duration_seconds
            .observe(duration.as_secs_f64());
        if !success {
            self.dispatch_failures_total.inc();
        }
    }

    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let registry = self.registry.lock().map_err(|_| std::fmt::Error)?;
        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
