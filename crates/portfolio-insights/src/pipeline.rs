use crate::config::DataConfig;
use crate::export::ExportRecord;
use crate::ingest::{self, ColumnNormalizer};
use crate::metrics::{MetricsEngine, PortfolioMetrics, PortfolioTables};
use crate::snapshots::{Category, ResolveError, SnapshotResolver, SnapshotSet};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// A category-scoped problem found during a run. None of these stop the run;
/// the affected metrics surface as unavailable instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineIssue {
    MissingSnapshot {
        category: Category,
    },
    Unreadable {
        category: Category,
        file: String,
        error: String,
    },
    SchemaMismatch {
        category: Category,
        missing_columns: Vec<String>,
    },
    CoercionFailures {
        category: Category,
        column: String,
        failed: usize,
    },
}

impl PipelineIssue {
    pub fn category(&self) -> Category {
        match self {
            PipelineIssue::MissingSnapshot { category }
            | PipelineIssue::Unreadable { category, .. }
            | PipelineIssue::SchemaMismatch { category, .. }
            | PipelineIssue::CoercionFailures { category, .. } => *category,
        }
    }
}

impl fmt::Display for PipelineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineIssue::MissingSnapshot { category } => {
                write!(f, "no dated {} snapshot found", category)
            }
            PipelineIssue::Unreadable {
                category,
                file,
                error,
            } => write!(f, "{} snapshot {} could not be read: {}", category, file, error),
            PipelineIssue::SchemaMismatch {
                category,
                missing_columns,
            } => write!(
                f,
                "{} export is missing columns: {}",
                category,
                missing_columns.join(", ")
            ),
            PipelineIssue::CoercionFailures {
                category,
                column,
                failed,
            } => write!(
                f,
                "{} column `{}` had {} unparsable values",
                category, column, failed
            ),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub snapshots: SnapshotSet,
    pub tables: PortfolioTables,
    pub issues: Vec<PipelineIssue>,
    pub metrics: PortfolioMetrics,
}

impl PipelineRun {
    pub fn export_record(&self) -> ExportRecord {
        ExportRecord::new(&self.metrics, &self.snapshots)
    }
}

/// Resolve, load, normalize and compute for one data directory.
#[derive(Debug, Clone)]
pub struct PortfolioPipeline {
    config: DataConfig,
    resolver: SnapshotResolver,
}

impl PortfolioPipeline {
    pub fn new(config: DataConfig) -> Self {
        let resolver = config.resolver();
        Self { config, resolver }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Runs from scratch; nothing is cached between calls.
    pub fn run(&self) -> Result<PipelineRun, ResolveError> {
        let snapshots = self.resolver.resolve(&self.config.data_dir)?;
        let mut issues: Vec<PipelineIssue> = snapshots
            .missing()
            .iter()
            .map(|&category| PipelineIssue::MissingSnapshot { category })
            .collect();
        let mut tables = PortfolioTables::new();

        for snapshot in snapshots.iter() {
            let category = snapshot.category;
            let raw = match ingest::load_snapshot(snapshot) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!(%category, file = %snapshot.path.display(), %error, "snapshot unreadable");
                    issues.push(PipelineIssue::Unreadable {
                        category,
                        file: snapshot.file_name(),
                        error: error.to_string(),
                    });
                    tables.mark_unreadable(category, snapshot.file_name());
                    continue;
                }
            };

            let normalized = ColumnNormalizer::for_category(category).normalize(&raw);
            if !normalized.report.missing_columns.is_empty() {
                issues.push(PipelineIssue::SchemaMismatch {
                    category,
                    missing_columns: normalized.report.missing_columns.clone(),
                });
            }
            for (column, report) in &normalized.report.columns {
                if report.failed > 0 {
                    issues.push(PipelineIssue::CoercionFailures {
                        category,
                        column: column.clone(),
                        failed: report.failed,
                    });
                }
            }
            tables.insert(normalized.table);
        }

        let metrics = MetricsEngine::compute(&tables);
        info!(
            data_dir = %self.config.data_dir.display(),
            snapshots = snapshots.iter().count(),
            issues = issues.len(),
            "pipeline run complete"
        );

        Ok(PipelineRun {
            snapshots,
            tables,
            issues,
            metrics,
        })
    }
}
