use crate::report::{run_export, run_report, ExportArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use portfolio_insights::config::{AppConfig, DataConfig};
use portfolio_insights::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Portfolio Insights",
    about = "Compute and serve rent roll, vacancy and work order metrics from dated CSV exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP dashboard feed (default command)
    Serve(ServeArgs),
    /// Run the pipeline once and persist the metric record
    Export(ExportArgs),
    /// Print the Tenant, Vacant and Work Order analysis pages
    Report(ReportArgs),
}

/// Data location overrides shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DataArgs {
    /// Directory holding the dated CSV exports
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Where the metric record is written and read
    #[arg(long)]
    pub(crate) export_path: Option<PathBuf>,
}

impl DataArgs {
    pub(crate) fn apply(self, config: &mut DataConfig) {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(export_path) = self.export_path {
            config.export_path = export_path;
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));
    let config = AppConfig::load()?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Export(args) => run_export(config, args),
        Command::Report(args) => run_report(config, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_flags_override_loaded_paths() {
        let mut config = DataConfig::new("data", "metrics.json");
        DataArgs {
            data_dir: Some(PathBuf::from("/srv/exports")),
            export_path: None,
        }
        .apply(&mut config);

        assert_eq!(config.data_dir, PathBuf::from("/srv/exports"));
        assert_eq!(config.export_path, PathBuf::from("metrics.json"));
    }

    #[test]
    fn report_subcommand_parses_record_flag() {
        let cli = Cli::try_parse_from([
            "portfolio-insights-api",
            "report",
            "--from-record",
            "--export-path",
            "out/metrics.json",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Report(args)) => {
                assert!(args.from_record);
                assert_eq!(
                    args.data.export_path,
                    Some(PathBuf::from("out/metrics.json"))
                );
            }
            other => panic!("expected report command, got {other:?}"),
        }
    }
}
