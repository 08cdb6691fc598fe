//! End-to-end monitoring run
//!
//! Workspace, fetch, project, partition, then the batch loop. An empty or
//! unsplittable fetch ends the run normally with [`RunOutcome::NoData`].

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::client::CacheClient;
use crate::config::MonitorConfig;
use crate::contracts::Project;
use crate::dataset::{partition, Partition};
use crate::driver::{BatchDriver, CancellationToken, RunSummary};
use crate::engine::DriftEngine;
use crate::error::Result;
use crate::telemetry::MonitorMetrics;
use crate::workspace::Workspace;

/// How a monitoring run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing to compare; no snapshots were written
    NoData { project: Project },
    Completed { project: Project, summary: RunSummary },
}

impl RunOutcome {
    pub fn project(&self) -> &Project {
        match self {
            RunOutcome::NoData { project } | RunOutcome::Completed { project, .. } => project,
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::NoData { .. } => None,
            RunOutcome::Completed { summary, .. } => Some(summary),
        }
    }
}

/// Sizes of a fetched partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionSizes {
    pub fetched: usize,
    pub current: usize,
    pub reference: usize,
}

/// Fetch the snapshot and split it according to `config.mode`
pub async fn fetch_partition(
    config: &MonitorConfig,
    metrics: Option<&MonitorMetrics>,
) -> Result<(usize, Option<Partition>)> {
    let client = CacheClient::from_config(config);
    let dataset = client.fetch_dataset().await?;
    let fetched = dataset.len();

    if let Some(metrics) = metrics {
        metrics.record_fetch(fetched);
    }

    let split = partition(dataset, config.mode);
    if let Some(split) = &split {
        info!(
            mode = %config.mode,
            current = split.current.len(),
            reference = split.reference.len(),
            "Partitioned snapshot"
        );
    }
    Ok((fetched, split))
}

/// Fetch and split without writing anything
pub async fn fetch_sizes(config: &MonitorConfig) -> Result<PartitionSizes> {
    config.validate()?;
    let (fetched, split) = fetch_partition(config, None).await?;
    Ok(PartitionSizes {
        fetched,
        current: split.as_ref().map_or(0, |p| p.current.len()),
        reference: split.as_ref().map_or(0, |p| p.reference.len()),
    })
}

/// Run the whole pipeline with the configured batch pacing
pub async fn run_monitoring(
    config: &MonitorConfig,
    token: &CancellationToken,
    metrics: Option<Arc<MonitorMetrics>>,
) -> Result<RunOutcome> {
    config.validate()?;
    let workspace = Workspace::create(&config.workspace)?;

    let (_, split) = fetch_partition(config, metrics.as_deref()).await?;

    let project = workspace.create_monitoring_project(&config.project_name, &config.project_description)?;

    let Some(split) = split else {
        error!("No data snapshots found.");
        return Ok(RunOutcome::NoData { project });
    };

    let mut driver = BatchDriver::new(DriftEngine::default(), config.batch_size, config.batch_interval())?;
    if let Some(metrics) = metrics {
        driver = driver.with_metrics(metrics);
    }

    let summary = driver.run(&split, project.id, &workspace, token).await?;
    info!(
        project_id = %project.id,
        batches = summary.batches(),
        cancelled = summary.cancelled,
        "Monitoring run finished"
    );

    Ok(RunOutcome::Completed { project, summary })
}
