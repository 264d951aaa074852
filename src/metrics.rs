use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const CLASSIFIER_REQUESTS: &str = "classifier_requests_total";
pub const CLASSIFIER_IGNORED: &str = "classifier_ignored_total";
pub const CLASSIFIER_ERRORS: &str = "classifier_errors_total";
pub const CLASSIFIER_FLAGGED: &str = "classifier_flagged_total";
pub const CLASSIFIER_SECONDS: &str = "classifier_inference_seconds";
pub const VERDICT_REQUESTS: &str = "verdict_requests_total";
pub const VERDICT_SECONDS: &str = "verdict_duration_seconds";

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls share the handle.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
            describe_all();
            Ok::<_, anyhow::Error>(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!(CLASSIFIER_REQUESTS, "Messages submitted to the zero-shot classifier.");
    describe_counter!(CLASSIFIER_IGNORED, "Empty messages skipped without classification.");
    describe_counter!(CLASSIFIER_ERRORS, "Classifier calls that failed.");
    describe_counter!(CLASSIFIER_FLAGGED, "Flagged scam signals, by category.");
    describe_histogram!(CLASSIFIER_SECONDS, "Zero-shot inference latency in seconds.");
    describe_counter!(VERDICT_REQUESTS, "Conversation verdicts, by outcome.");
    describe_histogram!(VERDICT_SECONDS, "LLM verdict latency in seconds.");
}
