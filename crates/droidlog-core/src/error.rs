//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or writing logs
#[derive(Error, Debug)]
pub enum LogError {
    /// Empty required string or out-of-range numeric setting
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized level name
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// The backing log file could not be opened
    #[error("Unable to open log file {}: {source}", path.display())]
    SinkInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sink failed while writing a record
    #[error("{sink} sink write failed: {source}")]
    Write {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or empty configuration input
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a sink initialization error
    pub fn sink_init(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkInit {
            path: path.into(),
            source,
        }
    }

    /// Create a sink write error
    pub fn write(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            sink: sink.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type LogResult<T> = Result<T, LogError>;
