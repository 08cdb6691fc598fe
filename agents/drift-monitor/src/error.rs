//! Error types for the Drift Monitor Agent
//!
//! One error enum covers fetching, engine evaluation and workspace storage.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for monitoring runs
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure reaching the cache server
    #[error("Network error: {0}")]
    Network(String),

    /// Cache server answered with a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Payload could not be parsed into records
    #[error("Parse error: {0}")]
    Parse(String),

    /// Payload has no array under the configured region key
    #[error("Region '{0}' not found in cache response")]
    MissingRegion(String),

    /// A column referenced by a metric is absent from the window
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A column has no usable values in one of the windows
    #[error("Column '{column}' has no values in {dataset} data")]
    EmptyColumn { column: String, dataset: String },

    /// A numerical column holds a value that is not a number
    #[error("Column '{column}' holds non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },

    /// Other engine failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// Snapshot appended to a project the workspace does not know
    #[error("Project {0} not found in workspace")]
    ProjectNotFound(Uuid),

    /// Workspace layout problem
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// File access or I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MonitorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        MonitorError::Parse(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        MonitorError::Engine(msg.into())
    }

    /// Create a workspace error
    pub fn workspace(msg: impl Into<String>) -> Self {
        MonitorError::Workspace(msg.into())
    }

    /// Create an empty column error
    pub fn empty_column(column: impl Into<String>, dataset: impl Into<String>) -> Self {
        MonitorError::EmptyColumn {
            column: column.into(),
            dataset: dataset.into(),
        }
    }

    /// Check if this error came from fetching the source data
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            MonitorError::Network(_)
                | MonitorError::Server { .. }
                | MonitorError::Parse(_)
                | MonitorError::MissingRegion(_)
        )
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(err: serde_yaml::Error) -> Self {
        MonitorError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Network(err.to_string())
    }
}

impl From<prometheus::Error> for MonitorError {
    fn from(err: prometheus::Error) -> Self {
        MonitorError::Engine(format!("metrics error: {}", err))
    }
}

/// Result type alias for monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::MissingRegion("mds-region-greenplum".to_string());
        assert_eq!(
            err.to_string(),
            "Region 'mds-region-greenplum' not found in cache response"
        );

        let err = MonitorError::Server {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 503: unavailable");
    }

    #[test]
    fn test_is_fetch_error() {
        assert!(MonitorError::Network("refused".to_string()).is_fetch_error());
        assert!(MonitorError::parse("bad json").is_fetch_error());
        assert!(MonitorError::MissingRegion("r".to_string()).is_fetch_error());
        assert!(!MonitorError::ColumnNotFound("amount".to_string()).is_fetch_error());
        assert!(!MonitorError::ProjectNotFound(Uuid::nil()).is_fetch_error());
    }

    #[test]
    fn test_error_constructors() {
        let err = MonitorError::config("bad");
        assert!(matches!(err, MonitorError::Config(_)));

        let err = MonitorError::empty_column("amount", "current");
        assert_eq!(err.to_string(), "Column 'amount' has no values in current data");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MonitorError = io.into();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}
