pub mod aggregates;
pub mod domain;
mod tenant;
mod vacancy;
mod work_orders;

pub use aggregates::{
    CountEntry, GroupSummary, LatePayment, MonthlyCount, MoveTrendPoint, RentTrendPoint,
    SizeBin, SizePoint, TurnoverEntry,
};
pub use domain::{
    Availability, MetricGroup, MetricRecord, MetricSet, MetricStatus, MetricValue,
    Unavailability, UndefinedReason,
};
pub use tenant::{keys as tenant_keys, TenantAggregates};
pub use vacancy::{keys as vacancy_keys, VacancyAggregates};
pub use work_orders::{keys as work_order_keys, WorkOrderAggregates};

use crate::ingest::{MissingColumn, NormalizedTable};
use crate::snapshots::Category;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Normalized tables for one run; absent categories are simply not present.
/// A category whose current snapshot failed to decode keeps its file name.
#[derive(Debug, Clone, Default)]
pub struct PortfolioTables {
    tables: BTreeMap<Category, NormalizedTable>,
    unreadable: BTreeMap<Category, String>,
}

impl PortfolioTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: NormalizedTable) {
        self.unreadable.remove(&table.category());
        self.tables.insert(table.category(), table);
    }

    pub fn mark_unreadable(&mut self, category: Category, file: impl Into<String>) {
        self.tables.remove(&category);
        self.unreadable.insert(category, file.into());
    }

    pub fn with(mut self, table: NormalizedTable) -> Self {
        self.insert(table);
        self
    }

    pub fn get(&self, category: Category) -> Option<&NormalizedTable> {
        self.tables.get(&category)
    }

    fn source(&self, category: Category) -> Source<'_> {
        Source {
            category,
            table: self.get(category),
            unreadable: self.unreadable.get(&category).map(String::as_str),
        }
    }
}

/// A category's table, or the reason every metric drawn from it is unavailable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source<'a> {
    category: Category,
    table: Option<&'a NormalizedTable>,
    unreadable: Option<&'a str>,
}

impl<'a> Source<'a> {
    fn absent(&self) -> Unavailability {
        match self.unreadable {
            Some(file) => Unavailability::Unreadable {
                category: self.category,
                file: file.to_string(),
            },
            None => Unavailability::MissingSnapshot {
                category: self.category,
            },
        }
    }

    pub(crate) fn metric<F>(&self, compute: F) -> MetricValue
    where
        F: FnOnce(&'a NormalizedTable) -> Result<MetricValue, MissingColumn>,
    {
        match self.table {
            Some(table) => compute(table)
                .unwrap_or_else(|missing| MetricValue::Unavailable(missing.into())),
            None => MetricValue::Unavailable(self.absent()),
        }
    }

    pub(crate) fn aggregate<T, F>(&self, compute: F) -> Availability<T>
    where
        F: FnOnce(&'a NormalizedTable) -> Result<T, MissingColumn>,
    {
        match self.table {
            Some(table) => match compute(table) {
                Ok(data) => Availability::Available(data),
                Err(missing) => Availability::Unavailable(missing.into()),
            },
            None => Availability::Unavailable(self.absent()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregates {
    pub tenant: TenantAggregates,
    pub vacancy: VacancyAggregates,
    pub work_orders: WorkOrderAggregates,
}

/// Everything presentation layers read: three metric sets plus chart data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub tenant: MetricSet,
    pub vacancy: MetricSet,
    pub work_orders: MetricSet,
    pub aggregates: GroupAggregates,
}

impl PortfolioMetrics {
    pub fn set(&self, group: MetricGroup) -> &MetricSet {
        match group {
            MetricGroup::Tenant => &self.tenant,
            MetricGroup::Vacancy => &self.vacancy,
            MetricGroup::WorkOrders => &self.work_orders,
        }
    }

    pub fn sets(&self) -> [&MetricSet; 3] {
        [&self.tenant, &self.vacancy, &self.work_orders]
    }
}

pub struct MetricsEngine;

impl MetricsEngine {
    pub fn compute(tables: &PortfolioTables) -> PortfolioMetrics {
        let tenant_source = tables.source(Category::TenantRoll);
        let vacancy_source = tables.source(Category::VacancyDetail);
        let work_order_source = tables.source(Category::WorkOrders);

        let metrics = PortfolioMetrics {
            tenant: tenant::metric_set(tenant_source),
            vacancy: vacancy::metric_set(vacancy_source),
            work_orders: work_orders::metric_set(work_order_source),
            aggregates: GroupAggregates {
                tenant: tenant::aggregates(tenant_source),
                vacancy: vacancy::aggregates(vacancy_source),
                work_orders: work_orders::aggregates(work_order_source),
            },
        };

        for set in metrics.sets() {
            let without_value = set
                .records
                .iter()
                .filter(|record| record.value.status() != MetricStatus::Ok)
                .count();
            info!(
                group = ?set.group,
                metrics = set.records.len(),
                without_value,
                "computed metric set"
            );
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_category_names_its_file_in_every_reason() {
        let mut tables = PortfolioTables::new();
        tables.mark_unreadable(Category::WorkOrders, "work_order-20250318.csv");

        let metrics = MetricsEngine::compute(&tables);
        let expected = Unavailability::Unreadable {
            category: Category::WorkOrders,
            file: "work_order-20250318.csv".to_string(),
        };
        for record in &metrics.work_orders.records {
            assert_eq!(record.value, MetricValue::Unavailable(expected.clone()));
        }
        assert_eq!(
            metrics.aggregates.work_orders.top_issues,
            Availability::Unavailable(expected.clone())
        );
        assert_eq!(
            expected.to_string(),
            "Work Orders snapshot work_order-20250318.csv could not be read"
        );

        for record in &metrics.tenant.records {
            assert_eq!(
                record.value,
                MetricValue::Unavailable(Unavailability::MissingSnapshot {
                    category: Category::TenantRoll
                })
            );
        }
    }
}
