use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::portfolio_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use portfolio_insights::config::AppConfig;
use portfolio_insights::error::AppError;
use portfolio_insights::pipeline::PortfolioPipeline;
use portfolio_insights::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    args.data.apply(&mut config.data);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let data_dir = config.data.data_dir.clone();
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        pipeline: Arc::new(PortfolioPipeline::new(config.data)),
    };

    let app = portfolio_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, data_dir = %data_dir.display(), "portfolio insights service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
