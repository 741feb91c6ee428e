use crate::ingest::MissingColumn;
use crate::snapshots::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a metric or aggregate could not be computed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailability {
    MissingSnapshot { category: Category },
    Unreadable { category: Category, file: String },
    MissingColumn(MissingColumn),
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailability::MissingSnapshot { category } => {
                write!(f, "no current {} snapshot", category)
            }
            Unavailability::Unreadable { category, file } => {
                write!(f, "{} snapshot {} could not be read", category, file)
            }
            Unavailability::MissingColumn(missing) => write!(f, "{}", missing),
        }
    }
}

impl From<MissingColumn> for Unavailability {
    fn from(value: MissingColumn) -> Self {
        Self::MissingColumn(value)
    }
}

/// Why a computable metric has no numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    ZeroDenominator,
    NoValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Count(u64),
    Percent(f64),
    Currency(f64),
    Days(f64),
    Undefined(UndefinedReason),
    Unavailable(Unavailability),
}

impl MetricValue {
    pub fn status(&self) -> MetricStatus {
        match self {
            MetricValue::Undefined(_) => MetricStatus::Undefined,
            MetricValue::Unavailable(_) => MetricStatus::Unavailable,
            _ => MetricStatus::Ok,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(count) => Some(*count as f64),
            MetricValue::Percent(value) | MetricValue::Currency(value) | MetricValue::Days(value) => {
                Some(*value)
            }
            MetricValue::Undefined(_) | MetricValue::Unavailable(_) => None,
        }
    }
}

/// Display rules shared by every rendering of a metric.
impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(count) => write!(f, "{count}"),
            MetricValue::Percent(value) => write!(f, "{value:.2}%"),
            MetricValue::Currency(value) if *value < 0.0 => write!(f, "-${:.2}", value.abs()),
            MetricValue::Currency(value) => write!(f, "${value:.2}"),
            MetricValue::Days(value) => write!(f, "{value:.1} days"),
            MetricValue::Undefined(_) => f.write_str("N/A"),
            MetricValue::Unavailable(_) => f.write_str("Unavailable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Ok,
    Undefined,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub key: &'static str,
    pub label: &'static str,
    pub value: MetricValue,
}

impl MetricRecord {
    pub(crate) fn new(key: &'static str, label: &'static str, value: MetricValue) -> Self {
        Self { key, label, value }
    }
}

/// The three metric sets presentation layers look up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroup {
    Tenant,
    Vacancy,
    WorkOrders,
}

impl MetricGroup {
    pub const fn ordered() -> [Self; 3] {
        [Self::Tenant, Self::Vacancy, Self::WorkOrders]
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Tenant => "Tenant Analysis",
            Self::Vacancy => "Vacant Analysis",
            Self::WorkOrders => "Work Order Analysis",
        }
    }

    pub const fn source(self) -> Category {
        match self {
            Self::Tenant => Category::TenantRoll,
            Self::Vacancy => Category::VacancyDetail,
            Self::WorkOrders => Category::WorkOrders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    pub group: MetricGroup,
    pub records: Vec<MetricRecord>,
}

impl MetricSet {
    pub fn get(&self, key: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|record| record.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&MetricValue> {
        self.get(key).map(|record| &record.value)
    }
}

/// Chart data that may be missing when its inputs are.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable(Unavailability),
}

impl<T> Availability<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Availability::Available(data) => Some(data),
            Availability::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}
