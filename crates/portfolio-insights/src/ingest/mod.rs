mod coerce;
mod parser;
pub mod schema;

pub use parser::RawTable;
pub use schema::{columns, schema_for, ColumnKind, ColumnSpec};

use crate::snapshots::{Category, Snapshot};
use chrono::NaiveDate;
use coerce::Coerced;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads a snapshot file into a [`RawTable`].
pub fn load_snapshot(snapshot: &Snapshot) -> Result<RawTable, LoadError> {
    load_path(&snapshot.path)
}

pub fn load_path(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(file)
}

pub fn load_reader<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    Ok(parser::read_table(reader)?)
}

/// Typed column storage; every cell may be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
    Text(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{category} export has no {kind} column `{column}`")]
pub struct MissingColumn {
    pub category: Category,
    pub column: String,
    pub kind: ColumnKind,
}

/// A category table after coercion. Built once per run and only read afterwards.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    category: Category,
    row_count: usize,
    columns: BTreeMap<String, Column>,
}

impl NormalizedTable {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn numbers(&self, name: &str) -> Result<&[Option<f64>], MissingColumn> {
        match self.columns.get(name) {
            Some(Column::Number(values)) => Ok(values),
            _ => Err(self.missing(name, ColumnKind::Number)),
        }
    }

    pub fn dates(&self, name: &str) -> Result<&[Option<NaiveDate>], MissingColumn> {
        match self.columns.get(name) {
            Some(Column::Date(values)) => Ok(values),
            _ => Err(self.missing(name, ColumnKind::Date)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&[Option<String>], MissingColumn> {
        match self.columns.get(name) {
            Some(Column::Text(values)) => Ok(values),
            _ => Err(self.missing(name, ColumnKind::Categorical)),
        }
    }

    fn missing(&self, name: &str, kind: ColumnKind) -> MissingColumn {
        MissingColumn {
            category: self.category,
            column: name.to_string(),
            kind,
        }
    }
}

/// Per-column coercion tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub parsed: usize,
    pub blank: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    pub columns: BTreeMap<String, ColumnReport>,
    pub missing_columns: Vec<String>,
}

impl CoercionReport {
    pub fn failures(&self, column: &str) -> usize {
        self.columns.get(column).map_or(0, |report| report.failed)
    }

    pub fn total_failures(&self) -> usize {
        self.columns.values().map(|report| report.failed).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub table: NormalizedTable,
    pub report: CoercionReport,
}

/// Coerces a raw export into its category's declared column types.
#[derive(Debug, Clone, Copy)]
pub struct ColumnNormalizer {
    category: Category,
    schema: &'static [ColumnSpec],
}

impl ColumnNormalizer {
    pub fn for_category(category: Category) -> Self {
        Self {
            category,
            schema: schema_for(category),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn normalize(&self, raw: &RawTable) -> Normalized {
        let row_count = raw.rows.len();
        let mut typed = BTreeMap::new();
        let mut report = CoercionReport::default();

        for spec in self.schema {
            let Some(index) = raw.column_index(spec.name) else {
                warn!(
                    category = %self.category,
                    column = spec.name,
                    "expected column absent from export"
                );
                report.missing_columns.push(spec.name.to_string());
                continue;
            };

            let cells = (0..row_count).map(|row| raw.cell(row, index));
            let mut tally = ColumnReport::default();
            let column = match spec.kind {
                ColumnKind::Currency => {
                    Column::Number(collect(cells.map(coerce::coerce_currency), &mut tally))
                }
                ColumnKind::Number => {
                    Column::Number(collect(cells.map(coerce::coerce_number), &mut tally))
                }
                ColumnKind::Date => {
                    Column::Date(collect(cells.map(coerce::coerce_date), &mut tally))
                }
                ColumnKind::Categorical => {
                    Column::Text(collect(cells.map(coerce::coerce_text), &mut tally))
                }
            };

            if tally.failed > 0 {
                warn!(
                    category = %self.category,
                    column = spec.name,
                    failed = tally.failed,
                    "values failed coercion and were treated as missing"
                );
            }

            typed.insert(spec.name.to_string(), column);
            report.columns.insert(spec.name.to_string(), tally);
        }

        if self.category == Category::TenantRoll {
            if let Some(lease_days) = derive_lease_days(&typed) {
                typed.insert(columns::LEASE_DAYS.to_string(), lease_days);
            }
        }

        Normalized {
            table: NormalizedTable {
                category: self.category,
                row_count,
                columns: typed,
            },
            report,
        }
    }
}

fn collect<T>(cells: impl Iterator<Item = Coerced<T>>, tally: &mut ColumnReport) -> Vec<Option<T>> {
    cells
        .map(|cell| {
            match &cell {
                Coerced::Value(_) => tally.parsed += 1,
                Coerced::Blank => tally.blank += 1,
                Coerced::Invalid => tally.failed += 1,
            }
            cell.into_option()
        })
        .collect()
}

/// Lease length in days where both lease dates parse and the span is positive.
fn derive_lease_days(typed: &BTreeMap<String, Column>) -> Option<Column> {
    let (Some(Column::Date(from)), Some(Column::Date(to))) = (
        typed.get(columns::LEASE_FROM),
        typed.get(columns::LEASE_TO),
    ) else {
        return None;
    };

    let days = from
        .iter()
        .zip(to)
        .map(|pair| match pair {
            (Some(start), Some(end)) => {
                let span = (*end - *start).num_days();
                (span > 0).then_some(span as f64)
            }
            _ => None,
        })
        .collect();

    Some(Column::Number(days))
}
