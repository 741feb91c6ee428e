use super::aggregates::{
    aligned_monthly, count_by, count_matching, mean, monthly_counts, round_to, summarize_by,
    CountEntry, GroupSummary, MonthlyCount, MoveTrendPoint, SizePoint, TurnoverEntry,
};
use super::domain::{Availability, MetricGroup, MetricRecord, MetricSet, MetricValue, UndefinedReason};
use super::Source;
use crate::ingest::{columns, MissingColumn, NormalizedTable};
use serde::Serialize;

pub mod keys {
    pub const TOTAL_VACANCIES: &str = "total_vacancies";
    pub const RENT_READY: &str = "rent_ready";
    pub const UPCOMING_MOVE_INS: &str = "upcoming_move_ins";
    pub const AVG_DAYS_VACANT: &str = "avg_days_vacant";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyAggregates {
    pub unit_status_distribution: Availability<Vec<CountEntry>>,
    pub bed_bath_distribution: Availability<Vec<CountEntry>>,
    pub unit_type_summary: Availability<Vec<GroupSummary>>,
    pub monthly_move_ins: Availability<Vec<MonthlyCount>>,
    pub monthly_move_outs: Availability<Vec<MonthlyCount>>,
    pub move_trend: Availability<Vec<MoveTrendPoint>>,
    pub size_vs_days_vacant: Availability<Vec<SizePoint>>,
    pub turnover_timeline: Availability<Vec<TurnoverEntry>>,
}

pub(super) fn metric_set(source: Source<'_>) -> MetricSet {
    MetricSet {
        group: MetricGroup::Vacancy,
        records: vec![
            MetricRecord::new(
                keys::TOTAL_VACANCIES,
                "Total Vacancies",
                source.metric(|table| Ok(MetricValue::Count(table.row_count() as u64))),
            ),
            MetricRecord::new(
                keys::RENT_READY,
                "Rent Ready Units",
                source.metric(|table| {
                    let ready = count_matching(table.text(columns::RENT_READY)?, &["Yes"]);
                    Ok(MetricValue::Count(ready as u64))
                }),
            ),
            MetricRecord::new(
                keys::UPCOMING_MOVE_INS,
                "Upcoming Move-ins",
                source.metric(|table| {
                    let upcoming = table.dates(columns::NEXT_MOVE_IN)?.iter().flatten().count();
                    Ok(MetricValue::Count(upcoming as u64))
                }),
            ),
            MetricRecord::new(
                keys::AVG_DAYS_VACANT,
                "Avg Days Vacant",
                source.metric(average_days_vacant),
            ),
        ],
    }
}

pub(super) fn aggregates(source: Source<'_>) -> VacancyAggregates {
    VacancyAggregates {
        unit_status_distribution: source
            .aggregate(|table| Ok(count_by(table.text(columns::UNIT_STATUS)?))),
        bed_bath_distribution: source
            .aggregate(|table| Ok(count_by(table.text(columns::BED_BATH)?))),
        unit_type_summary: source.aggregate(|table| {
            Ok(summarize_by(
                table.text(columns::UNIT_TYPE)?,
                table.numbers(columns::DAYS_VACANT)?,
            ))
        }),
        monthly_move_ins: source
            .aggregate(|table| Ok(monthly_counts(table.dates(columns::LAST_MOVE_IN)?))),
        monthly_move_outs: source
            .aggregate(|table| Ok(monthly_counts(table.dates(columns::LAST_MOVE_OUT)?))),
        move_trend: source.aggregate(|table| {
            Ok(aligned_monthly(
                table.dates(columns::LAST_MOVE_IN)?,
                table.dates(columns::LAST_MOVE_OUT)?,
            ))
        }),
        size_vs_days_vacant: source.aggregate(size_vs_days_vacant),
        turnover_timeline: source.aggregate(turnover_timeline),
    }
}

fn average_days_vacant(table: &NormalizedTable) -> Result<MetricValue, MissingColumn> {
    let days = table.numbers(columns::DAYS_VACANT)?;
    Ok(match mean(days) {
        Some(average) => MetricValue::Days(round_to(average, 1)),
        None => MetricValue::Undefined(UndefinedReason::NoValues),
    })
}

fn size_vs_days_vacant(table: &NormalizedTable) -> Result<Vec<SizePoint>, MissingColumn> {
    let sqft = table.numbers(columns::SQFT)?;
    let days = table.numbers(columns::DAYS_VACANT)?;

    Ok(sqft
        .iter()
        .zip(days)
        .filter_map(|pair| match pair {
            (Some(sqft), Some(days_vacant)) => Some(SizePoint {
                sqft: *sqft,
                days_vacant: *days_vacant,
            }),
            _ => None,
        })
        .collect())
}

fn turnover_timeline(table: &NormalizedTable) -> Result<Vec<TurnoverEntry>, MissingColumn> {
    let units = table.text(columns::UNIT)?;
    let available = table.dates(columns::AVAILABLE_ON)?;
    let next_move_in = table.dates(columns::NEXT_MOVE_IN)?;

    let mut timeline: Vec<TurnoverEntry> = units
        .iter()
        .zip(available.iter().zip(next_move_in))
        .filter_map(|(unit, (available_on, next_move_in))| {
            available_on.map(|available_on| TurnoverEntry {
                unit: unit.clone(),
                available_on,
                next_move_in: *next_move_in,
            })
        })
        .collect();
    timeline.sort_by_key(|entry| entry.available_on);
    Ok(timeline)
}
