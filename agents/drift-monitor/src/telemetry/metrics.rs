//! Prometheus metrics for the Drift Monitor Agent
//!
//! - `drift_monitor_batches_total` (counter) - batches completed
//! - `drift_monitor_snapshots_total` (counter) - snapshots appended, by kind
//! - `drift_monitor_failed_tests_total` (counter) - failed drift tests
//! - `drift_monitor_rows_fetched` (gauge) - records in the last fetch
//! - `drift_monitor_share_of_drifted_columns` (gauge) - latest drift share
//! - `drift_monitor_batch_duration_seconds` (histogram) - batch generation time

use prometheus::{Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

use crate::contracts::{Report, TestSuite};
use crate::error::{MonitorError, Result};

const NAMESPACE: &str = "drift_monitor";

/// Monitoring run metrics
pub struct MonitorMetrics {
    registry: Arc<Registry>,
    batches_total: Counter,
    snapshots_total: CounterVec,
    failed_tests_total: Counter,
    rows_fetched: Gauge,
    share_of_drifted_columns: Gauge,
    batch_duration_seconds: Histogram,
}

impl MonitorMetrics {
    /// Create metrics registered with a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create metrics and register them with `registry`
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let batches_total = Counter::with_opts(
            Opts::new("batches_total", "Total number of monitoring batches completed").namespace(NAMESPACE),
        )?;

        let snapshots_total = CounterVec::new(
            Opts::new("snapshots_total", "Total number of snapshots appended to the workspace")
                .namespace(NAMESPACE),
            &["kind"],
        )?;

        let failed_tests_total = Counter::with_opts(
            Opts::new("failed_tests_total", "Total number of failed drift tests").namespace(NAMESPACE),
        )?;

        let rows_fetched = Gauge::with_opts(
            Opts::new("rows_fetched", "Records returned by the last cache fetch").namespace(NAMESPACE),
        )?;

        let share_of_drifted_columns = Gauge::with_opts(
            Opts::new(
                "share_of_drifted_columns",
                "Share of drifted numerical features in the latest report",
            )
            .namespace(NAMESPACE),
        )?;

        let batch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("batch_duration_seconds", "Report and test suite generation time per batch")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        )?;

        registry.register(Box::new(batches_total.clone()))?;
        registry.register(Box::new(snapshots_total.clone()))?;
        registry.register(Box::new(failed_tests_total.clone()))?;
        registry.register(Box::new(rows_fetched.clone()))?;
        registry.register(Box::new(share_of_drifted_columns.clone()))?;
        registry.register(Box::new(batch_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            batches_total,
            snapshots_total,
            failed_tests_total,
            rows_fetched,
            share_of_drifted_columns,
            batch_duration_seconds,
        })
    }

    /// Record the size of a fetch
    pub fn record_fetch(&self, rows: usize) {
        self.rows_fetched.set(rows as f64);
    }

    /// Record one completed batch
    pub fn record_batch(&self, report: &Report, test_suite: &TestSuite, duration: Duration) {
        self.batches_total.inc();
        self.snapshots_total.with_label_values(&["report"]).inc();
        self.snapshots_total.with_label_values(&["test_suite"]).inc();
        self.failed_tests_total
            .inc_by(test_suite.summary.failed_tests as f64);
        if let Some(drift) = report.dataset_drift() {
            self.share_of_drifted_columns.set(drift.share_of_drifted_columns);
        }
        self.batch_duration_seconds.observe(duration.as_secs_f64());
    }

    pub fn batches(&self) -> u64 {
        self.batches_total.get() as u64
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MonitorError::engine(format!("metrics encoding: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{DatasetDriftResult, MetricResult, TestSuiteSummary};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn test_record_batch() {
        let metrics = MonitorMetrics::new().unwrap();
        let report = Report {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs_hash: String::new(),
            metrics: vec![MetricResult::DatasetDriftMetric(DatasetDriftResult {
                drift_share: 0.5,
                number_of_columns: 4,
                number_of_drifted_columns: 1,
                share_of_drifted_columns: 0.25,
                dataset_drift: false,
                drift_by_columns: vec![],
            })],
            tags: vec![],
            metadata: BTreeMap::new(),
        };
        let suite = TestSuite {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs_hash: String::new(),
            tests: vec![],
            summary: TestSuiteSummary {
                total_tests: 3,
                success_tests: 1,
                failed_tests: 2,
                all_passed: false,
            },
        };

        metrics.record_fetch(1600);
        metrics.record_batch(&report, &suite, Duration::from_millis(12));
        assert_eq!(metrics.batches(), 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("drift_monitor_batches_total 1"));
        assert!(text.contains("drift_monitor_rows_fetched 1600"));
        assert!(text.contains("drift_monitor_share_of_drifted_columns 0.25"));
        assert!(text.contains("drift_monitor_failed_tests_total 2"));
        assert!(text.contains(r#"drift_monitor_snapshots_total{kind="report"} 1"#));
    }
}
