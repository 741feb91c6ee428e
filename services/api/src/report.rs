use crate::cli::DataArgs;
use clap::Args;
use portfolio_insights::config::AppConfig;
use portfolio_insights::error::AppError;
use portfolio_insights::export::{ExportRecord, MetricsExporter};
use portfolio_insights::metrics::{Availability, CountEntry, GroupAggregates, MetricGroup};
use portfolio_insights::pipeline::{PipelineIssue, PortfolioPipeline};
use portfolio_insights::telemetry;

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    #[command(flatten)]
    pub(crate) data: DataArgs,
    /// Render the persisted metric record instead of running the pipeline
    #[arg(long)]
    pub(crate) from_record: bool,
}

pub(crate) fn run_export(mut config: AppConfig, args: ExportArgs) -> Result<(), AppError> {
    args.data.apply(&mut config.data);
    telemetry::init(&config.telemetry)?;

    let pipeline = PortfolioPipeline::new(config.data);
    let run = pipeline.run()?;
    let exporter = MetricsExporter::new(pipeline.config().export_path.clone());
    exporter.write(&run.export_record())?;

    println!("{}", exporter.path().display());
    Ok(())
}

pub(crate) fn run_report(mut config: AppConfig, args: ReportArgs) -> Result<(), AppError> {
    args.data.apply(&mut config.data);

    if args.from_record {
        let record = MetricsExporter::new(config.data.export_path).read()?;
        print!("{}", render_pages(&record));
        return Ok(());
    }

    let run = PortfolioPipeline::new(config.data).run()?;
    print!("{}", render_pages(&run.export_record()));
    print!("{}", render_chart_feeds(&run.metrics.aggregates));
    print!("{}", render_issues(&run.issues));
    Ok(())
}

/// One page per metric set, drawn only from the record's rendered values.
pub(crate) fn render_pages(record: &ExportRecord) -> String {
    let mut out = String::new();
    for group in MetricGroup::ordered() {
        let Some(set) = record.set(group) else {
            continue;
        };

        out.push_str(&format!("{}\n{}\n", set.title, "=".repeat(set.title.len())));
        let source = record
            .sources
            .get(&group.source())
            .and_then(|file| file.as_deref())
            .unwrap_or("no current snapshot");
        out.push_str(&format!("Source: {}\n", source));
        for metric in &set.metrics {
            out.push_str(&format!("- {}: {}\n", metric.label, metric.value));
        }
        out.push('\n');
    }
    out
}

pub(crate) fn render_chart_feeds(aggregates: &GroupAggregates) -> String {
    let mut out = String::from("Chart feeds\n");

    feed(&mut out, "Tenant status", &aggregates.tenant.status_distribution, |entries| {
        top_entries(entries)
    });
    feed(&mut out, "Late payments (> 2)", &aggregates.tenant.late_payments, |ranking| {
        format!("{} tenants", ranking.len())
    });
    feed(&mut out, "Rent trend", &aggregates.tenant.rent_trend, |points| {
        format!("{} move-ins", points.len())
    });
    feed(
        &mut out,
        "Lease days by size",
        &aggregates.tenant.lease_days_by_size,
        |bins| {
            let filled = bins.iter().filter(|bin| bin.count > 0).count();
            format!("{} of {} bins populated", filled, bins.len())
        },
    );
    feed(
        &mut out,
        "Unit status",
        &aggregates.vacancy.unit_status_distribution,
        |entries| top_entries(entries),
    );
    feed(&mut out, "Bed/bath mix", &aggregates.vacancy.bed_bath_distribution, |entries| {
        top_entries(entries)
    });
    feed(&mut out, "Days vacant by unit type", &aggregates.vacancy.unit_type_summary, |groups| {
        groups
            .iter()
            .map(|group| match group.mean {
                Some(mean) => format!("{} {:.1}", group.key, mean),
                None => format!("{} n/a", group.key),
            })
            .collect::<Vec<_>>()
            .join(", ")
    });
    feed(&mut out, "Move-ins / move-outs", &aggregates.vacancy.move_trend, |points| {
        format!("{} months", points.len())
    });
    feed(&mut out, "Turnover timeline", &aggregates.vacancy.turnover_timeline, |entries| {
        format!("{} units", entries.len())
    });
    feed(
        &mut out,
        "Work order types",
        &aggregates.work_orders.type_distribution,
        |entries| top_entries(entries),
    );
    feed(
        &mut out,
        "Work order priorities",
        &aggregates.work_orders.priority_distribution,
        |entries| top_entries(entries),
    );
    feed(&mut out, "Top issues", &aggregates.work_orders.top_issues, |entries| {
        top_entries(entries)
    });

    out.push('\n');
    out
}

pub(crate) fn render_issues(issues: &[PipelineIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }

    let mut out = String::from("Data issues\n");
    for issue in issues {
        out.push_str(&format!("- {}\n", issue));
    }
    out
}

fn feed<T>(out: &mut String, name: &str, data: &Availability<T>, summarize: impl FnOnce(&T) -> String) {
    let line = match data {
        Availability::Available(data) => summarize(data),
        Availability::Unavailable(reason) => format!("unavailable ({})", reason),
    };
    out.push_str(&format!("- {}: {}\n", name, line));
}

fn top_entries(entries: &[CountEntry]) -> String {
    if entries.is_empty() {
        return "none".to_string();
    }
    entries
        .iter()
        .take(3)
        .map(|entry| format!("{} {}", entry.key, entry.count))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_insights::export::{ExportedMetric, ExportedSet};
    use portfolio_insights::metrics::MetricStatus;
    use portfolio_insights::snapshots::Category;
    use std::collections::BTreeMap;

    fn record() -> ExportRecord {
        let metric = |key: &str, label: &str, value: &str, status| ExportedMetric {
            key: key.to_string(),
            label: label.to_string(),
            value: value.to_string(),
            status,
        };

        ExportRecord {
            sources: BTreeMap::from([
                (Category::TenantRoll, Some("rent_roll-20250301.csv".to_string())),
                (Category::WorkOrders, None),
                (Category::VacancyDetail, None),
            ]),
            sets: vec![
                ExportedSet {
                    group: MetricGroup::Tenant,
                    title: "Tenant Analysis".to_string(),
                    metrics: vec![metric(
                        "occupancy_rate",
                        "Occupancy Rate",
                        "50.00%",
                        MetricStatus::Ok,
                    )],
                },
                ExportedSet {
                    group: MetricGroup::WorkOrders,
                    title: "Work Order Analysis".to_string(),
                    metrics: vec![metric(
                        "total_amount",
                        "Total Amount",
                        "Unavailable",
                        MetricStatus::Unavailable,
                    )],
                },
            ],
        }
    }

    #[test]
    fn pages_render_record_values_verbatim() {
        let pages = render_pages(&record());

        assert!(pages.starts_with("Tenant Analysis\n===============\n"));
        assert!(pages.contains("Source: rent_roll-20250301.csv\n- Occupancy Rate: 50.00%\n"));
        assert!(pages.contains("Work Order Analysis\n"));
        assert!(pages.contains("Source: no current snapshot\n- Total Amount: Unavailable\n"));
        assert!(!pages.contains("Vacant Analysis"));
    }

    #[test]
    fn chart_feeds_summarize_unavailable_aggregates_with_their_reason() {
        use portfolio_insights::metrics::{MetricsEngine, PortfolioTables};

        let mut tables = PortfolioTables::new();
        tables.mark_unreadable(Category::WorkOrders, "work_order-20250318.csv");
        let metrics = MetricsEngine::compute(&tables);
        let feeds = render_chart_feeds(&metrics.aggregates);

        assert!(feeds.starts_with("Chart feeds\n- Tenant status: unavailable (no current Tenant Roll snapshot)\n"));
        assert!(feeds.contains(
            "- Top issues: unavailable (Work Orders snapshot work_order-20250318.csv could not be read)\n"
        ));
        assert_eq!(feeds.lines().filter(|line| line.starts_with("- ")).count(), 12);
        assert!(feeds.ends_with("\n\n"));
    }

    #[test]
    fn issues_render_one_line_each() {
        let issues = vec![PipelineIssue::MissingSnapshot {
            category: Category::VacancyDetail,
        }];
        assert_eq!(
            render_issues(&issues),
            "Data issues\n- no dated Vacancy Detail snapshot found\n"
        );
        assert!(render_issues(&[]).is_empty());
    }
}
