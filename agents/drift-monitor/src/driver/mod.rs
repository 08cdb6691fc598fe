//! Batch driver
//!
//! Replays the partition in growing prefixes. Batch `k` covers rows
//! `[0, (k + 1) * batch_size)` of both views, capped at each view's length,
//! so every window contains the previous one. Each batch produces one report
//! and one test suite, then the driver pauses before the next batch.

pub mod pacer;

pub use pacer::{BatchPacer, CancellationToken, PauseOutcome};

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dataset::Partition;
use crate::engine::DriftEngine;
use crate::error::{MonitorError, Result};
use crate::telemetry::MonitorMetrics;
use crate::workspace::SnapshotStore;

/// Rows covered by one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchWindow {
    /// Zero-based batch number
    pub index: usize,
    /// Uncapped window end, `(index + 1) * batch_size`
    pub end: usize,
    pub current_rows: usize,
    pub reference_rows: usize,
}

/// What a driver run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub max_rows: usize,
    pub windows: Vec<BatchWindow>,
    pub reports: usize,
    pub test_suites: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn batches(&self) -> usize {
        self.windows.len()
    }
}

/// Windows for views of the given lengths
///
/// `min(current_len, reference_len)` bounds the loop; each view is capped at
/// its own length.
pub fn plan_windows(current_len: usize, reference_len: usize, batch_size: usize) -> Vec<BatchWindow> {
    if batch_size == 0 {
        return Vec::new();
    }
    let max_rows = current_len.min(reference_len);

    (0..max_rows)
        .step_by(batch_size)
        .enumerate()
        .map(|(index, start)| {
            let end = start + batch_size;
            BatchWindow {
                index,
                end,
                current_rows: end.min(current_len),
                reference_rows: end.min(reference_len),
            }
        })
        .collect()
}

/// Sequential report/test-suite generation over cumulative windows
pub struct BatchDriver {
    engine: DriftEngine,
    batch_size: usize,
    pacer: BatchPacer,
    metrics: Option<Arc<MonitorMetrics>>,
}

impl BatchDriver {
    pub fn new(engine: DriftEngine, batch_size: usize, interval: Duration) -> Result<Self> {
        if batch_size == 0 {
            return Err(MonitorError::config("batch size must be positive"));
        }
        Ok(Self {
            engine,
            batch_size,
            pacer: BatchPacer::new(interval),
            metrics: None,
        })
    }

    /// Record batch metrics
    pub fn with_metrics(mut self, metrics: Arc<MonitorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run every batch, appending snapshots to `project_id` in `store`
    ///
    /// Returns early with `cancelled = true` when `token` fires before a batch
    /// or during a pause. Engine and store errors abort the run.
    pub async fn run<S>(
        &self,
        partition: &Partition,
        project_id: Uuid,
        store: &S,
        token: &CancellationToken,
    ) -> Result<RunSummary>
    where
        S: SnapshotStore + ?Sized,
    {
        let windows = plan_windows(partition.current.len(), partition.reference.len(), self.batch_size);
        let mut summary = RunSummary {
            max_rows: partition.max_rows(),
            ..Default::default()
        };

        info!(max_rows = summary.max_rows, batches = windows.len(), "Number of rows fetched: {}", summary.max_rows);

        for window in windows {
            if token.is_cancelled() {
                warn!(batch = window.index, "Monitoring cancelled before batch");
                summary.cancelled = true;
                break;
            }

            info!("Generating monitored data - batch [0 - {}]...", window.end);
            let start = Instant::now();

            let current = partition.current.head(window.end);
            let reference = partition.reference.head(window.end);

            let report = self.engine.create_report(current, reference)?;
            store.add_report(project_id, &report)?;
            summary.reports += 1;

            let test_suite = self.engine.create_test_suite(current, reference)?;
            store.add_test_suite(project_id, &test_suite)?;
            summary.test_suites += 1;

            summary.windows.push(window);
            if let Some(metrics) = &self.metrics {
                metrics.record_batch(&report, &test_suite, start.elapsed());
            }

            info!(
                current_rows = window.current_rows,
                reference_rows = window.reference_rows,
                failed_tests = test_suite.summary.failed_tests,
                "Monitoring data for batch [0 - {}] generated.",
                window.end
            );

            if self.pacer.pause(token).await == PauseOutcome::Cancelled {
                warn!(batch = window.index, "Monitoring cancelled during pause");
                summary.cancelled = true;
                break;
            }
        }

        Ok(summary)
    }
}
