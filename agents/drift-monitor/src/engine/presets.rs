//! Data drift test preset
//!
//! One share-of-drifted-columns test plus one drift test per numerical
//! feature.

use serde_json::json;

use super::metrics::column_drift;
use super::MetricContext;
use crate::contracts::*;
use crate::error::Result;

/// Upper bound (exclusive) on the share of drifted columns
pub const DEFAULT_MAX_DRIFTED_SHARE: f64 = 0.3;

/// A pass/fail assertion over a window pair
pub trait DriftTest: Send + Sync {
    /// Test name
    fn name(&self) -> &str;

    /// Evaluate the test
    fn run(&self, ctx: &MetricContext<'_>) -> Result<TestResult>;
}

/// Passes while fewer than `lt` of the numerical features drift
pub struct TestShareOfDriftedColumns {
    pub lt: f64,
}

impl DriftTest for TestShareOfDriftedColumns {
    fn name(&self) -> &str {
        "Share of Drifted Columns"
    }

    fn run(&self, ctx: &MetricContext<'_>) -> Result<TestResult> {
        let columns = &ctx.mapping.numerical_features;
        let mut drifted = 0;
        for column in columns {
            if column_drift(ctx, column, None, None)?.drift_detected {
                drifted += 1;
            }
        }
        let share = if columns.is_empty() {
            0.0
        } else {
            drifted as f64 / columns.len() as f64
        };

        let status = if share < self.lt {
            TestStatus::Success
        } else {
            TestStatus::Fail
        };

        Ok(TestResult {
            name: self.name().to_string(),
            description: format!(
                "The drift is detected for {} out of {} features. The test threshold is lt={}.",
                drifted,
                columns.len(),
                self.lt
            ),
            status,
            parameters: json!({
                "condition": {"lt": self.lt},
                "number_of_drifted_columns": drifted,
                "number_of_columns": columns.len(),
                "share_of_drifted_columns": share,
            }),
        })
    }
}

/// Passes when `column` shows no drift
pub struct TestColumnDrift {
    pub column: String,
}

impl DriftTest for TestColumnDrift {
    fn name(&self) -> &str {
        "Drift per Column"
    }

    fn run(&self, ctx: &MetricContext<'_>) -> Result<TestResult> {
        let drift = column_drift(ctx, &self.column, None, None)?;
        let status = if drift.drift_detected {
            TestStatus::Fail
        } else {
            TestStatus::Success
        };

        Ok(TestResult {
            name: self.name().to_string(),
            description: format!(
                "The drift score for the feature **{}** is {:.3}. The drift detection method is {}. The drift detection threshold is {}.",
                drift.column_name, drift.drift_score, drift.stattest_name, drift.stattest_threshold
            ),
            status,
            parameters: json!({
                "column_name": drift.column_name,
                "stattest": drift.stattest_name,
                "score": drift.drift_score,
                "threshold": drift.stattest_threshold,
                "detected": drift.drift_detected,
            }),
        })
    }
}

/// Tests of the data drift preset for the given mapping
pub fn data_drift_preset(mapping: &ColumnMapping) -> Vec<Box<dyn DriftTest>> {
    let mut tests: Vec<Box<dyn DriftTest>> = vec![Box::new(TestShareOfDriftedColumns {
        lt: DEFAULT_MAX_DRIFTED_SHARE,
    })];
    tests.extend(mapping.numerical_features.iter().map(|column| {
        Box::new(TestColumnDrift {
            column: column.clone(),
        }) as Box<dyn DriftTest>
    }));
    tests
}
