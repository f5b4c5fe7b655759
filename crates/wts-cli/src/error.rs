//! Error types for gen-wts

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use wtsgen::WtsError;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// Checkpoint path missing or not a regular file
    #[error("Invalid input file: {0}")]
    InvalidInputFile(PathBuf),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Not a file (e.g., directory)
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// Malformed checkpoint or weight file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Anchor or stride tensors do not line up
    #[error("Shape error: {0}")]
    Shape(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other conversion failure
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInputFile(_) | Self::FileNotFound(_) | Self::NotAFile(_) => {
                ExitCode::from(3)
            }
            Self::InvalidFormat(_) => ExitCode::from(4),
            Self::Shape(_) => ExitCode::from(5),
            Self::Io(_) => ExitCode::from(7),
            Self::Conversion(_) => ExitCode::from(1),
        }
    }
}

impl From<WtsError> for CliError {
    fn from(e: WtsError) -> Self {
        match e {
            WtsError::Io(io) => Self::Io(io),
            WtsError::FormatError { .. } | WtsError::UnsupportedDType { .. } => {
                Self::InvalidFormat(e.to_string())
            }
            WtsError::ShapeMismatch { .. } => Self::Shape(e.to_string()),
            other => Self::Conversion(other.to_string()),
        }
    }
}
