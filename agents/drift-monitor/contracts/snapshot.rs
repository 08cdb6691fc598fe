//! Reports, test suites and the snapshots that persist them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metric argument key naming the column a per-column metric ran on
pub const COLUMN_NAME_ARG: &str = "column_name.name";

/// Statistical test used for a column drift decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTestKind {
    /// Normed first Wasserstein distance; drift when score >= threshold
    Wasserstein,
    /// Two-sample Kolmogorov-Smirnov; drift when p-value < threshold
    Ks,
}

impl StatTestKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatTestKind::Wasserstein => "wasserstein",
            StatTestKind::Ks => "ks",
        }
    }

    pub fn default_threshold(&self) -> f64 {
        match self {
            StatTestKind::Wasserstein => 0.1,
            StatTestKind::Ks => 0.05,
        }
    }
}

/// Result of a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric_id")]
pub enum MetricResult {
    DatasetDriftMetric(DatasetDriftResult),
    DatasetMissingValuesMetric(DatasetMissingValuesResult),
    ColumnDriftMetric(ColumnDriftResult),
    ColumnSummaryMetric(ColumnSummaryResult),
}

impl MetricResult {
    pub fn metric_id(&self) -> &'static str {
        match self {
            MetricResult::DatasetDriftMetric(_) => "DatasetDriftMetric",
            MetricResult::DatasetMissingValuesMetric(_) => "DatasetMissingValuesMetric",
            MetricResult::ColumnDriftMetric(_) => "ColumnDriftMetric",
            MetricResult::ColumnSummaryMetric(_) => "ColumnSummaryMetric",
        }
    }

    /// Arguments identifying this metric instance
    pub fn metric_args(&self) -> BTreeMap<String, String> {
        let mut args = BTreeMap::new();
        match self {
            MetricResult::ColumnDriftMetric(r) => {
                args.insert(COLUMN_NAME_ARG.to_string(), r.column_name.clone());
            }
            MetricResult::ColumnSummaryMetric(r) => {
                args.insert(COLUMN_NAME_ARG.to_string(), r.column_name.clone());
            }
            _ => {}
        }
        args
    }
}

/// Dataset-level drift over all numerical features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDriftResult {
    pub drift_share: f64,
    pub number_of_columns: usize,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub dataset_drift: bool,
    pub drift_by_columns: Vec<ColumnDriftResult>,
}

/// Missing value statistics for both datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMissingValuesResult {
    pub current: MissingValuesStats,
    pub reference: MissingValuesStats,
}

/// Missing value statistics for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValuesStats {
    pub number_of_rows: usize,
    pub number_of_columns: usize,
    pub number_of_missing_values: usize,
    pub share_of_missing_values: f64,
    pub number_of_rows_with_missing_values: usize,
    pub share_of_rows_with_missing_values: f64,
    pub number_of_missing_values_by_column: BTreeMap<String, usize>,
}

/// Drift decision for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDriftResult {
    pub column_name: String,
    pub stattest_name: String,
    pub stattest_threshold: f64,
    pub drift_score: f64,
    pub drift_detected: bool,
}

/// Summary statistics for one column in both datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummaryResult {
    pub column_name: String,
    pub current_characteristics: ColumnCharacteristics,
    pub reference_characteristics: ColumnCharacteristics,
}

/// Descriptive statistics of a numerical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCharacteristics {
    pub count: usize,
    pub missing: usize,
    pub missing_share: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Drift report over one (current, reference) window pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub inputs_hash: String,
    pub metrics: Vec<MetricResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Report {
    /// Find a metric by id whose arguments include every pair in `args`
    pub fn metric(&self, metric_id: &str, args: &BTreeMap<String, String>) -> Option<&MetricResult> {
        self.metrics.iter().find(|m| {
            if m.metric_id() != metric_id {
                return false;
            }
            let own = m.metric_args();
            args.iter().all(|(k, v)| own.get(k) == Some(v))
        })
    }

    pub fn dataset_drift(&self) -> Option<&DatasetDriftResult> {
        self.metrics.iter().find_map(|m| match m {
            MetricResult::DatasetDriftMetric(r) => Some(r),
            _ => None,
        })
    }

    pub fn missing_values(&self) -> Option<&DatasetMissingValuesResult> {
        self.metrics.iter().find_map(|m| match m {
            MetricResult::DatasetMissingValuesMetric(r) => Some(r),
            _ => None,
        })
    }

    pub fn column_drift(&self, column: &str) -> Option<&ColumnDriftResult> {
        self.metrics.iter().find_map(|m| match m {
            MetricResult::ColumnDriftMetric(r) if r.column_name == column => Some(r),
            _ => None,
        })
    }

    pub fn column_summary(&self, column: &str) -> Option<&ColumnSummaryResult> {
        self.metrics.iter().find_map(|m| match m {
            MetricResult::ColumnSummaryMetric(r) if r.column_name == column => Some(r),
            _ => None,
        })
    }
}

/// Test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Success,
    Fail,
}

/// One pass/fail assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub description: String,
    pub status: TestStatus,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Counts of test outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuiteSummary {
    pub total_tests: usize,
    pub success_tests: usize,
    pub failed_tests: usize,
    pub all_passed: bool,
}

impl TestSuiteSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let success = results
            .iter()
            .filter(|r| r.status == TestStatus::Success)
            .count();
        Self {
            total_tests: results.len(),
            success_tests: success,
            failed_tests: results.len() - success,
            all_passed: success == results.len(),
        }
    }
}

/// Drift test suite over one (current, reference) window pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub inputs_hash: String,
    pub tests: Vec<TestResult>,
    pub summary: TestSuiteSummary,
}

/// A report or test suite as stored in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Report(Report),
    TestSuite(TestSuite),
}

impl Snapshot {
    pub fn id(&self) -> Uuid {
        match self {
            Snapshot::Report(r) => r.id,
            Snapshot::TestSuite(t) => t.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Snapshot::Report(r) => r.timestamp,
            Snapshot::TestSuite(t) => t.timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Snapshot::Report(_) => "report",
            Snapshot::TestSuite(_) => "test_suite",
        }
    }

    pub fn as_report(&self) -> Option<&Report> {
        match self {
            Snapshot::Report(r) => Some(r),
            Snapshot::TestSuite(_) => None,
        }
    }
}
