//! Tabular record model
//!
//! A [`Dataset`] owns flattened records plus the union of their column names
//! in first-seen order. Windows over a dataset are borrowed [`DatasetSlice`]s.

pub mod partition;

pub use partition::{partition, split_demo, split_production, Partition};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::error::{MonitorError, Result};

/// One cell of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Null, non-finite numbers and empty text count as missing
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(n) => !n.is_finite(),
            CellValue::Text(s) => s.is_empty(),
            CellValue::Bool(_) => false,
        }
    }

    /// Numeric view of the cell; `Ok(None)` when missing
    pub fn as_number(&self, column: &str) -> Result<Option<f64>> {
        if self.is_missing() {
            return Ok(None);
        }
        match self {
            CellValue::Number(n) => Ok(Some(*n)),
            CellValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            CellValue::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                MonitorError::NonNumeric {
                    column: column.to_string(),
                    value: s.clone(),
                }
            }),
            CellValue::Null => Ok(None),
        }
    }

    /// Ordering used for sorting: numbers before booleans before text
    fn sort_cmp(&self, other: &CellValue) -> Ordering {
        fn rank(v: &CellValue) -> u8 {
            match v {
                CellValue::Number(_) => 0,
                CellValue::Bool(_) => 1,
                CellValue::Text(_) => 2,
                CellValue::Null => 3,
            }
        }
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// One flattened record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Cell for sorting and grouping; absent and missing cells both map to `None`
    fn key(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column).filter(|v| !v.is_missing())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Ordered records with their column list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset; columns are collected in first-seen order
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        for record in &records {
            for column in record.columns() {
                if seen.insert(column.to_string()) {
                    columns.push(column.to_string());
                }
            }
        }
        Self { columns, records }
    }

    fn with_columns(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Sort descending by `keys` in order; missing keys sort last
    pub fn sort_descending(&mut self, keys: &[&str]) {
        self.records.sort_by(|a, b| {
            for key in keys {
                let ord = match (a.key(key), b.key(key)) {
                    (Some(x), Some(y)) => y.sort_cmp(x),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Split into `[0, mid)` and `[mid, len)`; both halves keep the column list
    pub fn split_at(self, mid: usize) -> (Dataset, Dataset) {
        let mut head = self.records;
        let tail = head.split_off(mid.min(head.len()));
        (
            Dataset::with_columns(self.columns.clone(), head),
            Dataset::with_columns(self.columns, tail),
        )
    }

    /// Consecutive runs of records sharing the same non-missing `column` value
    ///
    /// Records with a missing value end the current run and belong to no run.
    pub fn runs_by(self, column: &str) -> Vec<Dataset> {
        let mut runs: Vec<Vec<Record>> = Vec::new();
        let mut current_key: Option<CellValue> = None;

        for record in self.records {
            let key = record.key(column).cloned();
            match key {
                None => current_key = None,
                Some(k) => {
                    if current_key.as_ref() != Some(&k) {
                        runs.push(Vec::new());
                        current_key = Some(k);
                    }
                    if let Some(run) = runs.last_mut() {
                        run.push(record);
                    }
                }
            }
        }

        runs.into_iter()
            .map(|records| Dataset::with_columns(self.columns.clone(), records))
            .collect()
    }

    /// Prefix of at most `n` records
    pub fn head(&self, n: usize) -> DatasetSlice<'_> {
        DatasetSlice {
            columns: &self.columns,
            records: &self.records[..n.min(self.records.len())],
        }
    }

    pub fn as_slice(&self) -> DatasetSlice<'_> {
        self.head(self.records.len())
    }
}

/// Borrowed window over a dataset
#[derive(Debug, Clone, Copy)]
pub struct DatasetSlice<'a> {
    columns: &'a [String],
    records: &'a [Record],
}

impl<'a> DatasetSlice<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Numeric column with missing cells as `None`
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>> {
        if !self.has_column(column) {
            return Err(MonitorError::ColumnNotFound(column.to_string()));
        }
        self.records
            .iter()
            .map(|r| match r.get(column) {
                Some(v) => v.as_number(column),
                None => Ok(None),
            })
            .collect()
    }

    /// Non-missing values of a numeric column
    pub fn numeric_values(&self, column: &str) -> Result<Vec<f64>> {
        Ok(self.numeric_column(column)?.into_iter().flatten().collect())
    }
}
