//! Telemetry for the Drift Monitor Agent
//!
//! - `init_tracing` installs the tracing subscriber (JSON by default)
//! - `metrics` holds the Prometheus metrics of a monitoring run

pub mod metrics;

pub use metrics::MonitorMetrics;

use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Install the global subscriber; `RUST_LOG` sets the filter, default `info`
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}
