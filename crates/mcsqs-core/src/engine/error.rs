use thiserror::Error;

use super::config::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Search failed: {reason}")]
    SearchFailed { reason: String },

    #[error(
        "Search timed out after {}s with no usable output in {}",
        budget.as_secs_f64(),
        directory.display()
    )]
    SearchTimeout { budget: Duration, directory: PathBuf },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed correlation report {}: {message}", path.display())]
    CorrelationReport { path: PathBuf, message: String },

    #[error("Failed to parse structure file {}: {message}", path.display())]
    StructureParse { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
