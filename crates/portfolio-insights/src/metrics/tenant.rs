use super::aggregates::{
    count_by, count_matching, equal_width_bins, CountEntry, LatePayment, RentTrendPoint,
    SizeBin,
};
use super::domain::{Availability, MetricGroup, MetricRecord, MetricSet, MetricValue, UndefinedReason};
use super::Source;
use crate::ingest::{columns, MissingColumn, NormalizedTable};
use serde::Serialize;

pub mod keys {
    pub const TOTAL_UNITS: &str = "total_units";
    pub const OCCUPANCY_RATE: &str = "occupancy_rate";
    pub const RENT_COLLECTED: &str = "rent_collected";
    pub const MOVE_OUTS: &str = "move_outs";
}

/// Statuses that count a unit as occupied.
const OCCUPIED_STATUSES: [&str; 2] = ["Current", "Notice-Unrented"];
/// Tenants above this many late payments are ranked.
const LATE_COUNT_THRESHOLD: f64 = 2.0;
const SQFT_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantAggregates {
    pub late_payments: Availability<Vec<LatePayment>>,
    pub rent_trend: Availability<Vec<RentTrendPoint>>,
    pub lease_days_by_size: Availability<Vec<SizeBin>>,
    pub status_distribution: Availability<Vec<CountEntry>>,
}

pub(super) fn metric_set(source: Source<'_>) -> MetricSet {
    MetricSet {
        group: MetricGroup::Tenant,
        records: vec![
            MetricRecord::new(
                keys::TOTAL_UNITS,
                "Total Units",
                source.metric(|table| Ok(MetricValue::Count(table.row_count() as u64))),
            ),
            MetricRecord::new(keys::OCCUPANCY_RATE, "Occupancy Rate", source.metric(occupancy_rate)),
            MetricRecord::new(
                keys::RENT_COLLECTED,
                "Total Rent Collected %",
                source.metric(rent_collected),
            ),
            MetricRecord::new(keys::MOVE_OUTS, "Total Move-outs", source.metric(move_outs)),
        ],
    }
}

pub(super) fn aggregates(source: Source<'_>) -> TenantAggregates {
    TenantAggregates {
        late_payments: source.aggregate(late_payments),
        rent_trend: source.aggregate(rent_trend),
        lease_days_by_size: source.aggregate(lease_days_by_size),
        status_distribution: source.aggregate(|table| Ok(count_by(table.text(columns::STATUS)?))),
    }
}

fn occupancy_rate(table: &NormalizedTable) -> Result<MetricValue, MissingColumn> {
    let statuses = table.text(columns::STATUS)?;
    let total = table.row_count();
    if total == 0 {
        return Ok(MetricValue::Undefined(UndefinedReason::ZeroDenominator));
    }

    let occupied = count_matching(statuses, &OCCUPIED_STATUSES);
    Ok(MetricValue::Percent(100.0 * occupied as f64 / total as f64))
}

/// Collected rent against market rent over rows where both Rent and Market
/// Rent parsed. Any other row contributes to neither sum.
fn rent_collected(table: &NormalizedTable) -> Result<MetricValue, MissingColumn> {
    let rent = table.numbers(columns::RENT)?;
    let market_rent = table.numbers(columns::MARKET_RENT)?;

    let (collected, market) = rent
        .iter()
        .zip(market_rent)
        .filter_map(|pair| match pair {
            (Some(rent), Some(market)) => Some((*rent, *market)),
            _ => None,
        })
        .fold((0.0, 0.0), |(collected, market), (rent, listed)| {
            (collected + rent, market + listed)
        });

    if market == 0.0 {
        return Ok(MetricValue::Undefined(UndefinedReason::ZeroDenominator));
    }

    Ok(MetricValue::Percent(100.0 * collected / market))
}

fn move_outs(table: &NormalizedTable) -> Result<MetricValue, MissingColumn> {
    let move_outs = table.dates(columns::MOVE_OUT)?.iter().flatten().count();
    Ok(MetricValue::Count(move_outs as u64))
}

fn late_payments(table: &NormalizedTable) -> Result<Vec<LatePayment>, MissingColumn> {
    let tenants = table.text(columns::TENANT)?;
    let late_counts = table.numbers(columns::LATE_COUNT)?;

    let mut ranking: Vec<LatePayment> = tenants
        .iter()
        .zip(late_counts)
        .filter_map(|pair| match pair {
            (Some(tenant), Some(late_count)) if *late_count > LATE_COUNT_THRESHOLD => {
                Some(LatePayment {
                    tenant: tenant.clone(),
                    late_count: *late_count,
                })
            }
            _ => None,
        })
        .collect();
    ranking.sort_by(|a, b| b.late_count.total_cmp(&a.late_count));
    Ok(ranking)
}

fn rent_trend(table: &NormalizedTable) -> Result<Vec<RentTrendPoint>, MissingColumn> {
    let move_ins = table.dates(columns::MOVE_IN)?;
    let rent = table.numbers(columns::RENT)?;
    let market_rent = table.numbers(columns::MARKET_RENT)?;

    let mut points: Vec<RentTrendPoint> = move_ins
        .iter()
        .zip(rent.iter().zip(market_rent))
        .filter_map(|(move_in, (rent, market_rent))| {
            move_in.map(|move_in| RentTrendPoint {
                move_in,
                rent: *rent,
                market_rent: *market_rent,
            })
        })
        .collect();
    points.sort_by_key(|point| point.move_in);
    Ok(points)
}

fn lease_days_by_size(table: &NormalizedTable) -> Result<Vec<SizeBin>, MissingColumn> {
    table.dates(columns::LEASE_FROM)?;
    table.dates(columns::LEASE_TO)?;
    let lease_days = table.numbers(columns::LEASE_DAYS)?;
    let sqft = table.numbers(columns::SQFT)?;

    let points: Vec<(f64, f64)> = sqft
        .iter()
        .zip(lease_days)
        .filter_map(|pair| match pair {
            (Some(sqft), Some(days)) => Some((*sqft, *days)),
            _ => None,
        })
        .collect();
    Ok(equal_width_bins(&points, SQFT_BINS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{load_reader, ColumnNormalizer};
    use crate::metrics::{PortfolioTables, Unavailability};
    use crate::snapshots::Category;
    use std::io::Cursor;

    fn tenant_table(csv: &str) -> PortfolioTables {
        let raw = load_reader(Cursor::new(csv.to_string())).expect("csv parses");
        let normalized = ColumnNormalizer::for_category(Category::TenantRoll).normalize(&raw);
        PortfolioTables::new().with(normalized.table)
    }

    fn metrics(csv: &str) -> MetricSet {
        let tables = tenant_table(csv);
        metric_set(tables.source(Category::TenantRoll))
    }

    #[test]
    fn rent_ratio_skips_rows_missing_either_figure() {
        let set = metrics(
            "Status,Rent,Market Rent\n\
Current,$1000,$1200\n\
Current,$500,bad\n\
Current,,$800\n",
        );

        let ratio = set.get(keys::RENT_COLLECTED).expect("present");
        assert_eq!(ratio.value, MetricValue::Percent(100.0 * 1000.0 / 1200.0));
        assert_eq!(ratio.value.to_string(), "83.33%");
    }

    #[test]
    fn occupancy_and_rent_ratio_match_reference_figures() {
        let set = metrics(
            "Status,Rent,Market Rent\nCurrent,\"$1,000\",\"$1,200\"\nVacant-Rented,,$900\n",
        );

        assert_eq!(set.value(keys::OCCUPANCY_RATE), Some(&MetricValue::Percent(50.0)));
        assert_eq!(set.get(keys::OCCUPANCY_RATE).expect("present").value.to_string(), "50.00%");
        let ratio = set.get(keys::RENT_COLLECTED).expect("present");
        assert_eq!(ratio.value, MetricValue::Percent(100.0 * 1000.0 / 1200.0));
        assert_eq!(ratio.value.to_string(), "83.33%");
    }

    #[test]
    fn notice_unrented_counts_as_occupied() {
        let set = metrics("Status\nCurrent\nNotice-Unrented\nVacant-Unrented\nEvict\n");
        assert_eq!(set.value(keys::OCCUPANCY_RATE), Some(&MetricValue::Percent(50.0)));
        assert_eq!(set.value(keys::TOTAL_UNITS), Some(&MetricValue::Count(4)));
    }

    #[test]
    fn empty_roll_has_undefined_occupancy() {
        let set = metrics("Status,Rent,Market Rent,Move-out\n");
        assert_eq!(
            set.value(keys::OCCUPANCY_RATE),
            Some(&MetricValue::Undefined(UndefinedReason::ZeroDenominator))
        );
        assert_eq!(
            set.value(keys::RENT_COLLECTED),
            Some(&MetricValue::Undefined(UndefinedReason::ZeroDenominator))
        );
        assert_eq!(set.value(keys::MOVE_OUTS), Some(&MetricValue::Count(0)));
    }

    #[test]
    fn missing_column_only_disables_dependent_metrics() {
        let set = metrics("Status,Move-out\nCurrent,03/01/2025\nCurrent,\n");

        assert_eq!(set.value(keys::MOVE_OUTS), Some(&MetricValue::Count(1)));
        assert_eq!(set.value(keys::OCCUPANCY_RATE), Some(&MetricValue::Percent(100.0)));
        match set.value(keys::RENT_COLLECTED) {
            Some(MetricValue::Unavailable(Unavailability::MissingColumn(missing))) => {
                assert_eq!(missing.column, "Rent");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn late_payments_rank_tenants_above_threshold() {
        let tables = tenant_table(
            "Tenant,Late Count\nAda,3\nBo,2\nCy,7\n,9\nDee,n/a\nEd,3\n",
        );
        let aggregates = aggregates(tables.source(Category::TenantRoll));
        let ranking = aggregates.late_payments.available().expect("available");

        let names: Vec<&str> = ranking.iter().map(|entry| entry.tenant.as_str()).collect();
        assert_eq!(names, vec!["Cy", "Ada", "Ed"]);
    }

    #[test]
    fn rent_trend_sorts_by_move_in_and_skips_undated_rows() {
        let tables = tenant_table(
            "Move-in,Rent,Market Rent\n03/01/2024,$900,$950\n,$800,$800\n01/15/2023,bad,$700\n",
        );
        let aggregates = aggregates(tables.source(Category::TenantRoll));
        let trend = aggregates.rent_trend.available().expect("available");

        assert_eq!(trend.len(), 2);
        assert!(trend[0].move_in < trend[1].move_in);
        assert_eq!(trend[0].rent, None);
        assert_eq!(trend[0].market_rent, Some(700.0));
    }

    #[test]
    fn lease_days_by_size_uses_ten_bins() {
        let tables = tenant_table(
            "Sqft,Lease From,Lease To\n\
600,01/01/2024,12/31/2024\n\
1200,01/01/2024,07/01/2024\n\
900,01/01/2024,01/01/2024\n\
,01/01/2024,12/31/2024\n",
        );
        let aggregates = aggregates(tables.source(Category::TenantRoll));
        let bins = aggregates.lease_days_by_size.available().expect("available");

        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 2);
        assert_eq!(bins[0].mean, Some(365.0));
        assert_eq!(bins[9].mean, Some(182.0));
    }

    #[test]
    fn status_distribution_sums_to_rows_with_status() {
        let tables = tenant_table("Unit,Status\n1,Current\n2,Current\n3,\n4,Vacant-Rented\n");
        let aggregates = aggregates(tables.source(Category::TenantRoll));
        let distribution = aggregates.status_distribution.available().expect("available");

        assert_eq!(distribution.iter().map(|entry| entry.count).sum::<usize>(), 3);
        assert_eq!(distribution[0].key, "Current");
    }
}
