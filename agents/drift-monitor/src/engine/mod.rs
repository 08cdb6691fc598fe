//! Drift engine
//!
//! Generates drift reports and drift test suites over a (current, reference)
//! window pair. Inputs are borrowed and never modified.

pub mod metrics;
pub mod presets;
pub mod stattests;

pub use metrics::*;
pub use presets::*;

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

use crate::contracts::*;
use crate::dataset::DatasetSlice;
use crate::error::Result;

/// Inputs shared by every metric and test of one run
pub struct MetricContext<'a> {
    pub current: DatasetSlice<'a>,
    pub reference: DatasetSlice<'a>,
    pub mapping: &'a ColumnMapping,
}

/// Trait for report metrics
pub trait Metric: Send + Sync {
    /// Metric identifier
    fn id(&self) -> &str;

    /// Compute the metric over the context windows
    fn calculate(&self, ctx: &MetricContext<'_>) -> Result<MetricResult>;
}

/// Drift report and test suite generator
pub struct DriftEngine {
    mapping: ColumnMapping,
    metrics: Vec<Box<dyn Metric>>,
    tests: Vec<Box<dyn DriftTest>>,
}

impl Default for DriftEngine {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

impl DriftEngine {
    /// Create an engine with the monitoring metric set and the data drift preset
    pub fn new(mapping: ColumnMapping) -> Self {
        let tests = data_drift_preset(&mapping);
        Self {
            metrics: vec![
                Box::new(DatasetDriftMetric::default()),
                Box::new(DatasetMissingValuesMetric),
                Box::new(ColumnDriftMetric::new(AMOUNT_COLUMN).with_stattest(StatTestKind::Wasserstein)),
                Box::new(ColumnSummaryMetric::new(AMOUNT_COLUMN)),
                Box::new(
                    ColumnDriftMetric::new(TIME_PASSED_COLUMN).with_stattest(StatTestKind::Wasserstein),
                ),
                Box::new(ColumnSummaryMetric::new(TIME_PASSED_COLUMN)),
            ],
            tests,
            mapping,
        }
    }

    /// Replace the report metric set
    pub fn with_metrics(mut self, metrics: Vec<Box<dyn Metric>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Run every report metric; the first failure aborts the report
    pub fn create_report(&self, current: DatasetSlice<'_>, reference: DatasetSlice<'_>) -> Result<Report> {
        let start = Instant::now();
        let ctx = self.context(current, reference);

        let metrics = self
            .metrics
            .iter()
            .map(|m| {
                tracing::trace!(metric = m.id(), "calculating metric");
                m.calculate(&ctx)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut metadata = BTreeMap::new();
        metadata.insert("current_rows".to_string(), current.len().to_string());
        metadata.insert("reference_rows".to_string(), reference.len().to_string());

        let report = Report {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs_hash: Self::compute_inputs_hash(current, reference)?,
            metrics,
            tags: Vec::new(),
            metadata,
        };

        tracing::debug!(
            report_id = %report.id,
            metrics = report.metrics.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "report generated"
        );

        Ok(report)
    }

    /// Run the data drift preset
    pub fn create_test_suite(
        &self,
        current: DatasetSlice<'_>,
        reference: DatasetSlice<'_>,
    ) -> Result<TestSuite> {
        let ctx = self.context(current, reference);

        let tests = self
            .tests
            .iter()
            .map(|t| t.run(&ctx))
            .collect::<Result<Vec<_>>>()?;
        let summary = TestSuiteSummary::from_results(&tests);

        let suite = TestSuite {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs_hash: Self::compute_inputs_hash(current, reference)?,
            tests,
            summary,
        };

        tracing::debug!(
            test_suite_id = %suite.id,
            total = summary.total_tests,
            failed = summary.failed_tests,
            "test suite generated"
        );

        Ok(suite)
    }

    /// Compute deterministic hash of a window pair
    pub fn compute_inputs_hash(current: DatasetSlice<'_>, reference: DatasetSlice<'_>) -> Result<String> {
        let mut hasher = Sha256::new();
        for (label, window) in [("current", current), ("reference", reference)] {
            hasher.update(label.as_bytes());
            for record in window.records() {
                hasher.update(serde_json::to_vec(record)?);
            }
        }
        Ok(hex::encode(hasher.finalize()))
    }

    fn context<'a>(&'a self, current: DatasetSlice<'a>, reference: DatasetSlice<'a>) -> MetricContext<'a> {
        MetricContext {
            current,
            reference,
            mapping: &self.mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Record};
    use crate::error::MonitorError;

    fn transactions(n: usize, amount_offset: f64) -> Dataset {
        Dataset::from_records(
            (0..n)
                .map(|i| {
                    let i = i as f64;
                    Record::new()
                        .with("id", i)
                        .with("time_passed", (i * 7.0) % 13.0)
                        .with("amount", amount_offset + (i * 3.0) % 17.0)
                        .with("latitude", 40.0 + i / 100.0)
                        .with("longitude", -73.0 - i / 100.0)
                        .with("is_fraud_flag", if i as usize % 5 == 0 { 1.0 } else { 0.0 })
                        .with("training_run_timestamp", 1_700_000_000.0)
                        .with("cls_weight", 0.5)
                })
                .collect(),
        )
    }

    #[test]
    fn test_report_has_monitoring_metrics() {
        let current = transactions(40, 100.0);
        let reference = transactions(40, 0.0);
        let engine = DriftEngine::default();

        let report = engine.create_report(current.as_slice(), reference.as_slice()).unwrap();
        let ids: Vec<_> = report.metrics.iter().map(|m| m.metric_id()).collect();
        assert_eq!(
            ids,
            vec![
                "DatasetDriftMetric",
                "DatasetMissingValuesMetric",
                "ColumnDriftMetric",
                "ColumnSummaryMetric",
                "ColumnDriftMetric",
                "ColumnSummaryMetric",
            ]
        );

        let amount = report.column_drift("amount").unwrap();
        assert_eq!(amount.stattest_name, "wasserstein");
        assert!(amount.drift_detected);
        assert!(!report.column_drift("time_passed").unwrap().drift_detected);
        assert_eq!(report.missing_values().unwrap().current.number_of_rows, 40);
        assert_eq!(report.metadata["current_rows"], "40");
    }

    #[test]
    fn test_inputs_are_not_modified_and_hash_is_stable() {
        let current = transactions(10, 0.0);
        let reference = transactions(10, 0.0);
        let before = current.clone();

        let engine = DriftEngine::default();
        let a = engine.create_report(current.as_slice(), reference.as_slice()).unwrap();
        let b = engine.create_test_suite(current.as_slice(), reference.as_slice()).unwrap();

        assert_eq!(current, before);
        assert_eq!(a.inputs_hash, b.inputs_hash);
        assert_ne!(
            a.inputs_hash,
            DriftEngine::compute_inputs_hash(current.head(5), reference.as_slice()).unwrap()
        );
    }

    #[test]
    fn test_suite_covers_every_feature() {
        let current = transactions(20, 0.0);
        let reference = transactions(20, 0.0);
        let suite = DriftEngine::default()
            .create_test_suite(current.as_slice(), reference.as_slice())
            .unwrap();

        assert_eq!(suite.summary.total_tests, 1 + NUMERICAL_FEATURES.len());
        assert!(suite.summary.all_passed);
    }

    #[test]
    fn test_missing_column_propagates() {
        let current = Dataset::from_records(vec![Record::new().with("amount", 1.0)]);
        let reference = Dataset::from_records(vec![Record::new().with("amount", 2.0)]);

        let err = DriftEngine::default()
            .create_report(current.as_slice(), reference.as_slice())
            .unwrap_err();
        assert!(matches!(err, MonitorError::ColumnNotFound(_)));
    }

    #[test]
    fn test_custom_metric_set() {
        let current = Dataset::from_records(vec![Record::new().with("amount", 1.0)]);
        let reference = Dataset::from_records(vec![Record::new().with("amount", 2.0)]);

        let engine = DriftEngine::new(ColumnMapping::new(["amount"]))
            .with_metrics(vec![Box::new(ColumnSummaryMetric::new("amount"))]);
        let report = engine.create_report(current.as_slice(), reference.as_slice()).unwrap();
        assert_eq!(report.metrics.len(), 1);
        assert!(report.column_summary("amount").is_some());
    }
}
