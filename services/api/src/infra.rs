use metrics_exporter_prometheus::PrometheusHandle;
use portfolio_insights::pipeline::PortfolioPipeline;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Shared by every handler. The pipeline only holds configuration; each
/// request performs its own run.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) pipeline: Arc<PortfolioPipeline>,
}
