//! Drift Monitor Agent
//!
//! Fetches an inference snapshot from the cache server, splits it into
//! current and reference data, and replays it in growing batches. Every batch
//! yields a drift report and a drift test suite appended to a workspace
//! project with a fixed monitoring dashboard.
//!
//! # Pipeline
//! - `client`: cache fetch and record flattening
//! - `dataset`: tabular records and the demo/production split
//! - `engine`: drift metrics, statistical tests and test presets
//! - `driver`: cumulative batch loop with a cancellable pause
//! - `workspace`: filesystem project and snapshot store

pub mod client;
pub mod config;
pub mod dataset;
pub mod driver;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod telemetry;
pub mod workspace;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use config::MonitorConfig;
pub use contracts::*;
pub use error::{MonitorError, Result};
pub use monitor::{fetch_sizes, run_monitoring, RunOutcome};
