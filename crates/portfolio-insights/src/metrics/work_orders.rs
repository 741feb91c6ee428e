use super::aggregates::{count_by, count_matching, sum, CountEntry};
use super::domain::{Availability, MetricGroup, MetricRecord, MetricSet, MetricValue};
use super::Source;
use crate::ingest::columns;
use serde::Serialize;

pub mod keys {
    pub const TOTAL_WORK_ORDERS: &str = "total_work_orders";
    pub const NEW_WORK_ORDERS: &str = "new_work_orders";
    pub const URGENT_WORK_ORDERS: &str = "urgent_work_orders";
    pub const TOTAL_AMOUNT: &str = "total_amount";
}

/// Most frequent issues kept for the issue chart.
const TOP_ISSUES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkOrderAggregates {
    pub type_distribution: Availability<Vec<CountEntry>>,
    pub priority_distribution: Availability<Vec<CountEntry>>,
    pub top_issues: Availability<Vec<CountEntry>>,
}

pub(super) fn metric_set(source: Source<'_>) -> MetricSet {
    MetricSet {
        group: MetricGroup::WorkOrders,
        records: vec![
            MetricRecord::new(
                keys::TOTAL_WORK_ORDERS,
                "Total Work Orders",
                source.metric(|table| Ok(MetricValue::Count(table.row_count() as u64))),
            ),
            MetricRecord::new(
                keys::NEW_WORK_ORDERS,
                "New Work Orders",
                source.metric(|table| {
                    let new = count_matching(table.text(columns::STATUS)?, &["New"]);
                    Ok(MetricValue::Count(new as u64))
                }),
            ),
            MetricRecord::new(
                keys::URGENT_WORK_ORDERS,
                "Urgent Work Orders",
                source.metric(|table| {
                    let urgent = count_matching(table.text(columns::PRIORITY)?, &["Urgent"]);
                    Ok(MetricValue::Count(urgent as u64))
                }),
            ),
            MetricRecord::new(
                keys::TOTAL_AMOUNT,
                "Total Amount",
                source.metric(|table| Ok(MetricValue::Currency(sum(table.numbers(columns::AMOUNT)?)))),
            ),
        ],
    }
}

pub(super) fn aggregates(source: Source<'_>) -> WorkOrderAggregates {
    WorkOrderAggregates {
        type_distribution: source
            .aggregate(|table| Ok(count_by(table.text(columns::WORK_ORDER_TYPE)?))),
        priority_distribution: source
            .aggregate(|table| Ok(count_by(table.text(columns::PRIORITY)?))),
        top_issues: source.aggregate(|table| {
            let mut issues = count_by(table.text(columns::WORK_ORDER_ISSUE)?);
            issues.truncate(TOP_ISSUES);
            Ok(issues)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{load_reader, ColumnNormalizer};
    use crate::metrics::{PortfolioTables, Unavailability};
    use crate::snapshots::Category;
    use std::io::Cursor;

    fn work_order_tables(csv: &str) -> PortfolioTables {
        let raw = load_reader(Cursor::new(csv.to_string())).expect("csv parses");
        let normalized = ColumnNormalizer::for_category(Category::WorkOrders).normalize(&raw);
        PortfolioTables::new().with(normalized.table)
    }

    #[test]
    fn unparsable_amounts_are_left_out_of_the_total() {
        let tables = work_order_tables(
            "Status,Priority,Work Order Type,Work Order Issue,Amount\n\
New,Urgent,Repair,Leak,$100\n\
New,Normal,Repair,Leak,bad\n\
Completed,Normal,Turn,Paint,$50\n",
        );
        let set = metric_set(tables.source(Category::WorkOrders));

        assert_eq!(set.value(keys::TOTAL_WORK_ORDERS), Some(&MetricValue::Count(3)));
        assert_eq!(set.value(keys::NEW_WORK_ORDERS), Some(&MetricValue::Count(2)));
        assert_eq!(set.value(keys::URGENT_WORK_ORDERS), Some(&MetricValue::Count(1)));
        assert_eq!(set.value(keys::TOTAL_AMOUNT), Some(&MetricValue::Currency(150.0)));
        assert_eq!(
            set.get(keys::TOTAL_AMOUNT).expect("present").value.to_string(),
            "$150.00"
        );
    }

    #[test]
    fn status_and_priority_matches_are_exact() {
        let tables = work_order_tables(
            "Status,Priority,Amount\nnew,urgent,$1\nNew ,Urgent,$2\nNEW,High,\n",
        );
        let set = metric_set(tables.source(Category::WorkOrders));

        // Cells are trimmed on read, so only the second row matches.
        assert_eq!(set.value(keys::NEW_WORK_ORDERS), Some(&MetricValue::Count(1)));
        assert_eq!(set.value(keys::URGENT_WORK_ORDERS), Some(&MetricValue::Count(1)));
        assert_eq!(set.value(keys::TOTAL_AMOUNT), Some(&MetricValue::Currency(3.0)));
    }

    #[test]
    fn empty_export_totals_zero() {
        let tables = work_order_tables("Status,Priority,Work Order Type,Work Order Issue,Amount\n");
        let set = metric_set(tables.source(Category::WorkOrders));

        assert_eq!(set.value(keys::TOTAL_WORK_ORDERS), Some(&MetricValue::Count(0)));
        assert_eq!(set.value(keys::TOTAL_AMOUNT), Some(&MetricValue::Currency(0.0)));
    }

    #[test]
    fn top_issues_keep_the_twenty_most_frequent() {
        let mut csv = String::from("Work Order Issue,Work Order Type\n");
        for issue in 0..25 {
            for _ in 0..=issue {
                csv.push_str(&format!("Issue {issue:02},Repair\n"));
            }
        }
        let tables = work_order_tables(&csv);
        let aggregates = aggregates(tables.source(Category::WorkOrders));

        let issues = aggregates.top_issues.available().expect("issues");
        assert_eq!(issues.len(), 20);
        assert_eq!(issues[0].key, "Issue 24");
        assert_eq!(issues[0].count, 25);
        assert_eq!(issues[19].key, "Issue 05");

        let types = aggregates.type_distribution.available().expect("types");
        assert_eq!(types.len(), 1);
        match &aggregates.priority_distribution {
            Availability::Unavailable(Unavailability::MissingColumn(missing)) => {
                assert_eq!(missing.column, "Priority");
            }
            other => panic!("expected missing priority column, got {other:?}"),
        }
    }
}
