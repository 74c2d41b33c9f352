//! Error types for shuck-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the shuck library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No detection strategy could resolve the file to a known format
    #[error("Unknown archive format: {0}")]
    UnknownFormat(PathBuf),

    /// A required external program is not installed
    #[error("Required tool `{tool}` not found on PATH")]
    ToolNotFound { tool: String },

    /// A pipeline stage exited with a fatal status
    #[error("Command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    /// A stage reported failure and nothing was extracted
    #[error("Command `{command}` exited with {status} and produced no files")]
    ExtractionEmpty { command: String, status: String },

    /// Invalid file or directory path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Some archives failed during batch processing
    #[error("Partial failure: {count} archive(s) could not be unpacked")]
    PartialFailure { count: u32 },
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
