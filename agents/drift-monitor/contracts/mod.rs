//! Drift Monitor Agent Contracts
//!
//! Shapes shared by the engine, the workspace store and the CLI.

mod dashboard;
mod project;
mod snapshot;

pub use dashboard::*;
pub use project::*;
pub use snapshot::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record identifier column
pub const ID_COLUMN: &str = "id";
/// Seconds elapsed since the previous transaction
pub const TIME_PASSED_COLUMN: &str = "time_passed";
/// Transaction amount
pub const AMOUNT_COLUMN: &str = "amount";
/// Timestamp of the training run that scored the record
pub const TIMESTAMP_COLUMN: &str = "training_run_timestamp";

/// Numerical features monitored for drift
pub const NUMERICAL_FEATURES: [&str; 8] = [
    ID_COLUMN,
    TIME_PASSED_COLUMN,
    AMOUNT_COLUMN,
    "latitude",
    "longitude",
    "is_fraud_flag",
    TIMESTAMP_COLUMN,
    "cls_weight",
];

/// How a fetched dataset is split into current and reference data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Halves of the sorted dataset
    Demo,
    /// The two most recent training-run groups
    Production,
}

impl SplitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPolicy::Demo => "demo",
            SplitPolicy::Production => "production",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "demo" => Ok(SplitPolicy::Demo),
            "production" | "prod" => Ok(SplitPolicy::Production),
            other => Err(format!("unknown split policy: {}", other)),
        }
    }
}

/// Column roles handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub numerical_features: Vec<String>,
}

impl ColumnMapping {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numerical_features: features.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::new(NUMERICAL_FEATURES)
    }
}
