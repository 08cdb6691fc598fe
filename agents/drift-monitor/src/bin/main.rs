//! Drift Monitor Agent entry point
//!
//! Runs the batch drift monitoring pipeline. With no subcommand, `run` is used
//! with the configuration taken from the environment.

use clap::{Args, Parser, Subcommand};
use drift_monitor::contracts::*;
use drift_monitor::driver::CancellationToken;
use drift_monitor::telemetry::{init_tracing, LogFormat, MonitorMetrics};
use drift_monitor::workspace::Workspace;
use drift_monitor::{fetch_sizes, run_monitoring, MonitorConfig, RunOutcome};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "drift-monitor")]
#[command(about = "Drift Monitor Agent - batch drift reports over inference cache snapshots")]
#[command(version)]
struct Cli {
    /// Log line format (json or pretty)
    #[arg(long, global = true, default_value = "json", env = "LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, partition and generate snapshots batch by batch
    Run(RunArgs),

    /// Fetch and partition only; print partition sizes
    Fetch {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Split policy (demo or production)
        #[arg(short, long)]
        mode: Option<SplitPolicy>,
    },

    /// List workspace projects with their latest dashboard values
    Projects {
        /// Workspace directory
        #[arg(short, long, default_value = "workspace")]
        workspace: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace directory
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Split policy (demo or production)
    #[arg(short, long)]
    mode: Option<SplitPolicy>,

    /// Rows added per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Pause after each batch, in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<(MonitorConfig, Option<PathBuf>)> {
        let mut config = MonitorConfig::load(self.config.as_deref())?;
        if let Some(workspace) = self.workspace {
            config.workspace = workspace;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(interval) = self.interval {
            config.batch_interval_secs = interval;
        }
        Ok((config, self.metrics_out))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let (config, metrics_out) = args.into_config()?;

            tracing::info!(
                server = %config.server,
                region = %config.region,
                mode = %config.mode,
                batch_size = config.batch_size,
                "Starting Drift Monitor Agent"
            );

            let token = CancellationToken::new();
            let canceller = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, stopping after the current batch");
                    canceller.cancel();
                }
            });

            let metrics = Arc::new(MonitorMetrics::new()?);
            let outcome = run_monitoring(&config, &token, Some(metrics.clone())).await?;

            if let Some(path) = metrics_out {
                std::fs::write(&path, metrics.render()?)?;
            }

            if let RunOutcome::Completed { project, summary } = &outcome {
                println!(
                    "{}",
                    serde_json::json!({
                        "project_id": project.id,
                        "batches": summary.batches(),
                        "reports": summary.reports,
                        "test_suites": summary.test_suites,
                        "cancelled": summary.cancelled,
                    })
                );
            }
        }

        Commands::Fetch { config, mode } => {
            let mut config = MonitorConfig::load(config.as_deref())?;
            if let Some(mode) = mode {
                config.mode = mode;
            }

            let sizes = fetch_sizes(&config).await?;
            println!("{}", serde_json::to_string_pretty(&sizes)?);
        }

        Commands::Projects { workspace } => {
            let workspace = Workspace::create(&workspace)?;
            let mut listing = Vec::new();

            for project in workspace.list_projects()? {
                let snapshots = workspace.list_snapshots(project.id)?;
                let reports: Vec<&Report> = snapshots.iter().filter_map(Snapshot::as_report).collect();

                let panels: BTreeMap<String, serde_json::Value> = project
                    .dashboard
                    .panels
                    .iter()
                    .map(|panel| {
                        let value = match panel {
                            DashboardPanel::Counter(counter) => serde_json::json!(counter.evaluate(&reports)),
                            DashboardPanel::Plot(plot) => serde_json::json!(plot.latest(&reports)),
                        };
                        (panel.title().to_string(), value)
                    })
                    .collect();

                listing.push(serde_json::json!({
                    "id": project.id,
                    "name": project.name,
                    "created_at": project.created_at,
                    "snapshots": snapshots.len(),
                    "reports": reports.len(),
                    "panels": panels,
                }));
            }

            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}
