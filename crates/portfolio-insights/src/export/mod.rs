use crate::metrics::{MetricGroup, MetricSet, MetricStatus, PortfolioMetrics};
use crate::snapshots::{Category, SnapshotSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to access metric record {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("metric record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One metric with its value already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMetric {
    pub key: String,
    pub label: String,
    pub value: String,
    pub status: MetricStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSet {
    pub group: MetricGroup,
    pub title: String,
    pub metrics: Vec<ExportedMetric>,
}

impl ExportedSet {
    fn from_set(set: &MetricSet) -> Self {
        Self {
            group: set.group,
            title: set.group.title().to_string(),
            metrics: set
                .records
                .iter()
                .map(|record| ExportedMetric {
                    key: record.key.to_string(),
                    label: record.label.to_string(),
                    value: record.value.to_string(),
                    status: record.value.status(),
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExportedMetric> {
        self.metrics.iter().find(|metric| metric.key == key)
    }
}

/// The persisted form of a run: every metric set plus the snapshot file each
/// category was read from. Carries no timestamps so unchanged inputs
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub sources: BTreeMap<Category, Option<String>>,
    pub sets: Vec<ExportedSet>,
}

impl ExportRecord {
    pub fn new(metrics: &PortfolioMetrics, snapshots: &SnapshotSet) -> Self {
        Self {
            sources: snapshots.file_names(),
            sets: metrics.sets().into_iter().map(ExportedSet::from_set).collect(),
        }
    }

    pub fn set(&self, group: MetricGroup) -> Option<&ExportedSet> {
        self.sets.iter().find(|set| set.group == group)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reads and writes the metric record at a fixed location, replacing any
/// previous record.
#[derive(Debug, Clone)]
pub struct MetricsExporter {
    path: PathBuf,
}

impl MetricsExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, record: &ExportRecord) -> Result<(), ExportError> {
        let json = record.to_json()?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| self.io(source))?;
        }
        std::fs::write(&self.path, json).map_err(|source| self.io(source))?;

        info!(path = %self.path.display(), sets = record.sets.len(), "metric record written");
        Ok(())
    }

    pub fn read(&self) -> Result<ExportRecord, ExportError> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| self.io(source))?;
        ExportRecord::from_json(&json)
    }

    fn io(&self, source: std::io::Error) -> ExportError {
        ExportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
