use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use portfolio_insights::error::AppError;
use portfolio_insights::export::ExportRecord;
use portfolio_insights::metrics::GroupAggregates;
use portfolio_insights::pipeline::{PipelineIssue, PipelineRun};
use portfolio_insights::snapshots::Category;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct PortfolioMetricsResponse {
    #[serde(flatten)]
    pub(crate) record: ExportRecord,
    pub(crate) issues: Vec<PipelineIssue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PortfolioAggregatesResponse {
    pub(crate) sources: BTreeMap<Category, Option<String>>,
    pub(crate) aggregates: GroupAggregates,
    pub(crate) issues: Vec<PipelineIssue>,
}

pub(crate) fn portfolio_routes() -> axum::Router {
    axum::Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/portfolio/metrics", get(portfolio_metrics_endpoint))
        .route(
            "/api/v1/portfolio/aggregates",
            get(portfolio_aggregates_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Runs the pipeline on the blocking pool; it reads the data directory with std I/O.
async fn fresh_run(state: &AppState) -> Result<PipelineRun, AppError> {
    let pipeline = Arc::clone(&state.pipeline);
    let run = tokio::task::spawn_blocking(move || pipeline.run())
        .await
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))??;
    Ok(run)
}

pub(crate) async fn portfolio_metrics_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<PortfolioMetricsResponse>, AppError> {
    let run = fresh_run(&state).await?;

    Ok(Json(PortfolioMetricsResponse {
        record: run.export_record(),
        issues: run.issues,
    }))
}

pub(crate) async fn portfolio_aggregates_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<PortfolioAggregatesResponse>, AppError> {
    let run = fresh_run(&state).await?;

    Ok(Json(PortfolioAggregatesResponse {
        sources: run.snapshots.file_names(),
        aggregates: run.metrics.aggregates,
        issues: run.issues,
    }))
}
