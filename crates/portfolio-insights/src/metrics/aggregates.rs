use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
}

/// One interval of an equal-width partition, right-closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeBin {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatePayment {
    pub tenant: String,
    pub late_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentTrendPoint {
    pub move_in: NaiveDate,
    pub rent: Option<f64>,
    pub market_rent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveTrendPoint {
    pub month: String,
    pub move_ins: usize,
    pub move_outs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizePoint {
    pub sqft: f64,
    pub days_vacant: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnoverEntry {
    pub unit: Option<String>,
    pub available_on: NaiveDate,
    pub next_move_in: Option<NaiveDate>,
}

/// Counts per distinct value, largest first, ties by key.
pub(crate) fn count_by(values: &[Option<String>]) -> Vec<CountEntry> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_default() += 1;
    }

    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(key, count)| CountEntry {
            key: key.to_string(),
            count,
        })
        .collect();
    entries.sort_by_key(|entry| Reverse(entry.count));
    entries
}

pub(crate) fn count_matching(values: &[Option<String>], accepted: &[&str]) -> usize {
    values
        .iter()
        .flatten()
        .filter(|value| accepted.contains(&value.as_str()))
        .count()
}

/// Row count plus sum/mean of the parsed `values` per key.
pub(crate) fn summarize_by(keys: &[Option<String>], values: &[Option<f64>]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<&str, (usize, f64, usize)> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        let Some(key) = key else { continue };
        let group = groups.entry(key.as_str()).or_default();
        group.0 += 1;
        if let Some(value) = value {
            group.1 += value;
            group.2 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, (count, sum, parsed))| GroupSummary {
            key: key.to_string(),
            count,
            sum,
            mean: (parsed > 0).then(|| sum / parsed as f64),
        })
        .collect()
}

pub(crate) fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub(crate) fn sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Groups `(x, y)` pairs into `bins` equal-width intervals over the range of
/// `x` and summarizes `y` per interval.
///
/// The lowest edge is pushed down by 0.1% of the span so the minimum falls
/// inside the first interval. A zero span widens both ends by 0.1% of their
/// magnitude instead.
pub(crate) fn equal_width_bins(points: &[(f64, f64)], bins: usize) -> Vec<SizeBin> {
    if points.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (min, max) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), (x, _)| (min.min(*x), max.max(*x)),
    );

    let (low, high) = if min == max {
        let widen = |edge: f64| if edge == 0.0 { 0.001 } else { 0.001 * edge.abs() };
        (min - widen(min), max + widen(max))
    } else {
        (min, max)
    };

    let step = (high - low) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| low + step * i as f64).collect();
    edges[bins] = high;
    if min != max {
        edges[0] -= (max - min) * 0.001;
    }

    let mut partition: Vec<SizeBin> = edges
        .windows(2)
        .map(|edge| SizeBin {
            label: format!("({:.1}, {:.1}]", edge[0], edge[1]),
            lower: edge[0],
            upper: edge[1],
            count: 0,
            sum: 0.0,
            mean: None,
        })
        .collect();

    for (x, y) in points {
        let index = edges[1..]
            .iter()
            .position(|upper| x <= upper)
            .unwrap_or(bins - 1);
        let bin = &mut partition[index];
        bin.count += 1;
        bin.sum += y;
    }

    for bin in &mut partition {
        bin.mean = (bin.count > 0).then(|| bin.sum / bin.count as f64);
    }

    partition
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

fn month_label(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

fn monthly_map(dates: &[Option<NaiveDate>]) -> BTreeMap<NaiveDate, usize> {
    let mut months = BTreeMap::new();
    for date in dates.iter().flatten() {
        *months.entry(month_start(*date)).or_default() += 1;
    }
    months
}

/// Event counts per calendar month; months without events are omitted.
pub(crate) fn monthly_counts(dates: &[Option<NaiveDate>]) -> Vec<MonthlyCount> {
    monthly_map(dates)
        .into_iter()
        .map(|(month, count)| MonthlyCount {
            month: month_label(month),
            count,
        })
        .collect()
}

/// Joins two monthly series on the union of their months, filling the side
/// without events in that month with zero.
pub(crate) fn aligned_monthly(
    move_ins: &[Option<NaiveDate>],
    move_outs: &[Option<NaiveDate>],
) -> Vec<MoveTrendPoint> {
    let ins = monthly_map(move_ins);
    let outs = monthly_map(move_outs);
    let mut months: Vec<NaiveDate> = ins.keys().chain(outs.keys()).copied().collect();
    months.sort();
    months.dedup();

    months
        .into_iter()
        .map(|month| MoveTrendPoint {
            month: month_label(month),
            move_ins: ins.get(&month).copied().unwrap_or(0),
            move_outs: outs.get(&month).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|value| (!value.is_empty()).then(|| value.to_string()))
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn count_by_orders_by_count_then_key() {
        let entries = count_by(&text(&["Vacant", "Current", "", "Current", "Notice", "Vacant"]));
        let keys: Vec<(&str, usize)> = entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.count))
            .collect();
        assert_eq!(keys, vec![("Current", 2), ("Vacant", 2), ("Notice", 1)]);
        assert_eq!(entries.iter().map(|entry| entry.count).sum::<usize>(), 5);
    }

    #[test]
    fn summarize_by_counts_rows_and_averages_parsed_values() {
        let summaries = summarize_by(
            &text(&["1BR", "1BR", "2BR", ""]),
            &[Some(10.0), None, Some(4.0), Some(99.0)],
        );
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, "1BR");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].mean, Some(10.0));
        assert_eq!(summaries[1].sum, 4.0);
    }

    #[test]
    fn mean_ignores_missing_and_reports_empty() {
        assert_eq!(mean(&[Some(1.0), None, Some(2.0)]), Some(1.5));
        assert_eq!(mean(&[None, None]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn equal_width_bins_cover_min_and_max() {
        let points: Vec<(f64, f64)> = (0..=10).map(|i| (500.0 + 50.0 * i as f64, 100.0)).collect();
        let bins = equal_width_bins(&points, 10);

        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 11);
        assert!(bins[0].lower < 500.0);
        assert_eq!(bins[9].upper, 1000.0);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[9].count, 1);
        assert_eq!(bins[9].mean, Some(100.0));
    }

    #[test]
    fn equal_width_bins_widen_a_zero_span() {
        let bins = equal_width_bins(&[(800.0, 30.0), (800.0, 60.0)], 10);
        assert_eq!(bins.len(), 10);
        let filled: Vec<&SizeBin> = bins.iter().filter(|bin| bin.count > 0).collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].mean, Some(45.0));
        assert!(bins[0].lower < 800.0 && bins[9].upper > 800.0);
    }

    #[test]
    fn equal_width_bins_empty_without_points() {
        assert!(equal_width_bins(&[], 10).is_empty());
    }

    #[test]
    fn monthly_counts_skip_empty_months() {
        let counts = monthly_counts(&[date(2025, 1, 5), date(2025, 1, 31), date(2025, 3, 2), None]);
        assert_eq!(
            counts,
            vec![
                MonthlyCount {
                    month: "2025-01".to_string(),
                    count: 2
                },
                MonthlyCount {
                    month: "2025-03".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn aligned_monthly_fills_only_the_missing_side() {
        let points = aligned_monthly(
            &[date(2025, 1, 5), date(2025, 3, 2)],
            &[date(2025, 3, 20), date(2025, 4, 1)],
        );
        let months: Vec<&str> = points.iter().map(|point| point.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-03", "2025-04"]);
        assert_eq!((points[0].move_ins, points[0].move_outs), (1, 0));
        assert_eq!((points[1].move_ins, points[1].move_outs), (1, 1));
        assert_eq!((points[2].move_ins, points[2].move_outs), (0, 1));
    }
}
