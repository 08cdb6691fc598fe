//! Current/reference partitioning
//!
//! Both policies sort by (`training_run_timestamp`, `id`) descending first.
//! They are kept separate on purpose: the demo split is a plain halving with
//! no guarantee that the two halves come from different training runs, while
//! the production split only ever compares whole runs.

use tracing::debug;

use super::Dataset;
use crate::contracts::{SplitPolicy, ID_COLUMN, TIMESTAMP_COLUMN};

/// Current and reference data for a monitoring run
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub current: Dataset,
    pub reference: Dataset,
}

impl Partition {
    /// Rows available to the batch loop
    pub fn max_rows(&self) -> usize {
        self.current.len().min(self.reference.len())
    }
}

/// Partition `dataset` with the given policy; `None` means no data
pub fn partition(dataset: Dataset, policy: SplitPolicy) -> Option<Partition> {
    match policy {
        SplitPolicy::Demo => split_demo(dataset),
        SplitPolicy::Production => split_production(dataset),
    }
}

/// Halves of the sorted dataset; the current half gets the odd row
pub fn split_demo(mut dataset: Dataset) -> Option<Partition> {
    if dataset.is_empty() {
        return None;
    }
    dataset.sort_descending(&[TIMESTAMP_COLUMN, ID_COLUMN]);

    let mid = (dataset.len() as f64 / 2.0).round() as usize;
    let (current, reference) = dataset.split_at(mid);
    debug!(current = current.len(), reference = reference.len(), "demo split");

    Some(Partition { current, reference })
}

/// The two most recent training-run groups
pub fn split_production(mut dataset: Dataset) -> Option<Partition> {
    if dataset.is_empty() {
        return None;
    }
    dataset.sort_descending(&[TIMESTAMP_COLUMN, ID_COLUMN]);

    let mut groups = dataset.runs_by(TIMESTAMP_COLUMN).into_iter();
    let current = groups.next()?;
    let reference = groups.next()?;
    debug!(current = current.len(), reference = reference.len(), "production split");

    Some(Partition { current, reference })
}
