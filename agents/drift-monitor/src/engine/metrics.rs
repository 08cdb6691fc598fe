//! Report metric implementations

use std::collections::BTreeMap;

use super::stattests::{self, auto_stattest, run_stattest};
use super::{Metric, MetricContext};
use crate::contracts::*;
use crate::dataset::DatasetSlice;
use crate::error::{MonitorError, Result};

/// Share of drifted columns from which the whole dataset counts as drifted
pub const DEFAULT_DRIFT_SHARE: f64 = 0.5;

/// Drift over every numerical feature of the column mapping
pub struct DatasetDriftMetric {
    pub drift_share: f64,
}

impl Default for DatasetDriftMetric {
    fn default() -> Self {
        Self {
            drift_share: DEFAULT_DRIFT_SHARE,
        }
    }
}

impl Metric for DatasetDriftMetric {
    fn id(&self) -> &str {
        "DatasetDriftMetric"
    }

    fn calculate(&self, ctx: &MetricContext<'_>) -> Result<MetricResult> {
        let drift_by_columns = ctx
            .mapping
            .numerical_features
            .iter()
            .map(|column| column_drift(ctx, column, None, None))
            .collect::<Result<Vec<_>>>()?;

        let number_of_columns = drift_by_columns.len();
        let number_of_drifted_columns = drift_by_columns.iter().filter(|d| d.drift_detected).count();
        let share_of_drifted_columns = share(number_of_drifted_columns, number_of_columns);

        Ok(MetricResult::DatasetDriftMetric(DatasetDriftResult {
            drift_share: self.drift_share,
            number_of_columns,
            number_of_drifted_columns,
            share_of_drifted_columns,
            dataset_drift: number_of_columns > 0 && share_of_drifted_columns >= self.drift_share,
            drift_by_columns,
        }))
    }
}

/// Missing value counts for both windows
pub struct DatasetMissingValuesMetric;

impl Metric for DatasetMissingValuesMetric {
    fn id(&self) -> &str {
        "DatasetMissingValuesMetric"
    }

    fn calculate(&self, ctx: &MetricContext<'_>) -> Result<MetricResult> {
        Ok(MetricResult::DatasetMissingValuesMetric(DatasetMissingValuesResult {
            current: missing_values(&ctx.current),
            reference: missing_values(&ctx.reference),
        }))
    }
}

/// Drift of a single column
pub struct ColumnDriftMetric {
    pub column: String,
    pub stattest: Option<StatTestKind>,
    pub threshold: Option<f64>,
}

impl ColumnDriftMetric {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            stattest: None,
            threshold: None,
        }
    }

    pub fn with_stattest(mut self, stattest: StatTestKind) -> Self {
        self.stattest = Some(stattest);
        self
    }
}

impl Metric for ColumnDriftMetric {
    fn id(&self) -> &str {
        "ColumnDriftMetric"
    }

    fn calculate(&self, ctx: &MetricContext<'_>) -> Result<MetricResult> {
        column_drift(ctx, &self.column, self.stattest, self.threshold)
            .map(MetricResult::ColumnDriftMetric)
    }
}

/// Descriptive statistics of a single column
pub struct ColumnSummaryMetric {
    pub column: String,
}

impl ColumnSummaryMetric {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Metric for ColumnSummaryMetric {
    fn id(&self) -> &str {
        "ColumnSummaryMetric"
    }

    fn calculate(&self, ctx: &MetricContext<'_>) -> Result<MetricResult> {
        Ok(MetricResult::ColumnSummaryMetric(ColumnSummaryResult {
            column_name: self.column.clone(),
            current_characteristics: characteristics(&ctx.current, &self.column)?,
            reference_characteristics: characteristics(&ctx.reference, &self.column)?,
        }))
    }
}

/// Drift decision for `column`; missing values are dropped first
pub fn column_drift(
    ctx: &MetricContext<'_>,
    column: &str,
    stattest: Option<StatTestKind>,
    threshold: Option<f64>,
) -> Result<ColumnDriftResult> {
    let reference = ctx.reference.numeric_values(column)?;
    let current = ctx.current.numeric_values(column)?;

    if reference.is_empty() {
        return Err(MonitorError::empty_column(column, "reference"));
    }
    if current.is_empty() {
        return Err(MonitorError::empty_column(column, "current"));
    }

    let kind = stattest.unwrap_or_else(|| auto_stattest(reference.len()));
    let outcome = run_stattest(kind, threshold, &reference, &current);

    Ok(ColumnDriftResult {
        column_name: column.to_string(),
        stattest_name: outcome.kind.name().to_string(),
        stattest_threshold: outcome.threshold,
        drift_score: outcome.score,
        drift_detected: outcome.drift_detected,
    })
}

fn missing_values(data: &DatasetSlice<'_>) -> MissingValuesStats {
    let mut by_column: BTreeMap<String, usize> = data
        .columns()
        .iter()
        .map(|c| (c.clone(), 0))
        .collect();
    let mut rows_with_missing = 0;

    for record in data.records() {
        let mut row_missing = false;
        for column in data.columns() {
            let missing = record.get(column).map_or(true, |v| v.is_missing());
            if missing {
                row_missing = true;
                if let Some(count) = by_column.get_mut(column) {
                    *count += 1;
                }
            }
        }
        if row_missing {
            rows_with_missing += 1;
        }
    }

    let total_missing: usize = by_column.values().sum();
    let cells = data.len() * data.columns().len();

    MissingValuesStats {
        number_of_rows: data.len(),
        number_of_columns: data.columns().len(),
        number_of_missing_values: total_missing,
        share_of_missing_values: share(total_missing, cells),
        number_of_rows_with_missing_values: rows_with_missing,
        share_of_rows_with_missing_values: share(rows_with_missing, data.len()),
        number_of_missing_values_by_column: by_column,
    }
}

fn characteristics(data: &DatasetSlice<'_>, column: &str) -> Result<ColumnCharacteristics> {
    let cells = data.numeric_column(column)?;
    let missing = cells.iter().filter(|c| c.is_none()).count();
    let values = stattests::sorted(&cells.into_iter().flatten().collect::<Vec<_>>());

    Ok(ColumnCharacteristics {
        count: values.len(),
        missing,
        missing_share: share(missing, data.len()),
        mean: stattests::mean(&values),
        std: stattests::population_std(&values),
        min: values.first().copied(),
        p25: stattests::percentile(&values, 25.0),
        p50: stattests::percentile(&values, 50.0),
        p75: stattests::percentile(&values, 75.0),
        max: values.last().copied(),
    })
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, Dataset, Record};

    fn dataset(values: &[Option<f64>]) -> Dataset {
        Dataset::from_records(
            values
                .iter()
                .map(|v| {
                    Record::new()
                        .with("amount", v.map(CellValue::Number).unwrap_or(CellValue::Null))
                        .with("time_passed", 1.0)
                })
                .collect(),
        )
    }

    #[test]
    fn test_missing_values_counts() {
        let current = dataset(&[Some(1.0), None, None, Some(4.0)]);
        let reference = dataset(&[Some(1.0)]);
        let mapping = ColumnMapping::new(["amount"]);
        let ctx = MetricContext {
            current: current.as_slice(),
            reference: reference.as_slice(),
            mapping: &mapping,
        };

        let result = DatasetMissingValuesMetric.calculate(&ctx).unwrap();
        let MetricResult::DatasetMissingValuesMetric(r) = result else {
            panic!("unexpected metric result");
        };
        assert_eq!(r.current.number_of_rows, 4);
        assert_eq!(r.current.number_of_missing_values, 2);
        assert_eq!(r.current.share_of_missing_values, 0.25);
        assert_eq!(r.current.number_of_rows_with_missing_values, 2);
        assert_eq!(r.current.number_of_missing_values_by_column["amount"], 2);
        assert_eq!(r.reference.number_of_missing_values, 0);
    }

    #[test]
    fn test_column_summary() {
        let current = dataset(&[Some(1.0), Some(2.0), Some(3.0), None]);
        let reference = dataset(&[Some(10.0)]);
        let mapping = ColumnMapping::new(["amount"]);
        let ctx = MetricContext {
            current: current.as_slice(),
            reference: reference.as_slice(),
            mapping: &mapping,
        };

        let MetricResult::ColumnSummaryMetric(r) = ColumnSummaryMetric::new("amount").calculate(&ctx).unwrap() else {
            panic!("unexpected metric result");
        };
        let c = r.current_characteristics;
        assert_eq!(c.count, 3);
        assert_eq!(c.missing, 1);
        assert_eq!(c.mean, Some(2.0));
        assert_eq!(c.p50, Some(2.0));
        assert_eq!(c.min, Some(1.0));
        assert_eq!(c.max, Some(3.0));
        assert_eq!(r.reference_characteristics.std, Some(0.0));
    }

    #[test]
    fn test_dataset_drift_share() {
        let current = Dataset::from_records(
            (0..20)
                .map(|i| Record::new().with("amount", 1000.0 + i as f64).with("time_passed", i as f64))
                .collect(),
        );
        let reference = Dataset::from_records(
            (0..20)
                .map(|i| Record::new().with("amount", i as f64).with("time_passed", i as f64))
                .collect(),
        );
        let mapping = ColumnMapping::new(["amount", "time_passed"]);
        let ctx = MetricContext {
            current: current.as_slice(),
            reference: reference.as_slice(),
            mapping: &mapping,
        };

        let MetricResult::DatasetDriftMetric(r) = DatasetDriftMetric::default().calculate(&ctx).unwrap() else {
            panic!("unexpected metric result");
        };
        assert_eq!(r.number_of_columns, 2);
        assert_eq!(r.number_of_drifted_columns, 1);
        assert_eq!(r.share_of_drifted_columns, 0.5);
        assert!(r.dataset_drift);
        assert_eq!(r.drift_by_columns[0].stattest_name, "ks");
    }

    #[test]
    fn test_column_drift_errors() {
        let current = dataset(&[None, None]);
        let reference = dataset(&[Some(1.0)]);
        let mapping = ColumnMapping::new(["amount"]);
        let ctx = MetricContext {
            current: current.as_slice(),
            reference: reference.as_slice(),
            mapping: &mapping,
        };

        let err = ColumnDriftMetric::new("amount").calculate(&ctx).unwrap_err();
        assert!(matches!(err, MonitorError::EmptyColumn { .. }));

        let err = ColumnDriftMetric::new("latitude").calculate(&ctx).unwrap_err();
        assert!(matches!(err, MonitorError::ColumnNotFound(_)));
    }
}
