//! Error types for weight-file conversion.
//!
//! Every failure is fatal: nothing here is retried or downgraded to a
//! warning, and a failed export never leaves a usable artifact behind.

use std::fmt;

/// Main error type for `wtsgen` operations.
///
/// # Examples
///
/// ```
/// use wtsgen::error::WtsError;
///
/// let err = WtsError::InvalidName {
///     name: "bad name".to_string(),
/// };
/// assert!(err.to_string().contains("bad name"));
/// ```
#[derive(Debug)]
pub enum WtsError {
    /// Anchor-grid derivation preconditions violated.
    ShapeMismatch {
        /// Tensor the check failed on
        tensor: String,
        /// What was wrong with it
        reason: String,
    },

    /// Tensor name cannot be represented on a `.wts` line.
    InvalidName {
        /// The offending name
        name: String,
    },

    /// Sink or file failure.
    Io(std::io::Error),

    /// Declared element count disagrees with the buffer actually held.
    ///
    /// Always a bug in whatever produced the tensor, never user input.
    InternalInconsistency {
        /// Tensor the mismatch was found on
        tensor: String,
        /// Element count implied by the shape (or expected by the caller)
        declared: usize,
        /// Element count actually present
        actual: usize,
    },

    /// Two tensors with the same name in one collection.
    DuplicateTensor {
        /// The repeated name
        name: String,
    },

    /// Malformed checkpoint or `.wts` input.
    FormatError {
        /// Error description
        message: String,
    },

    /// Checkpoint dtype that has no f32 representation.
    UnsupportedDType {
        /// Tensor carrying the dtype
        tensor: String,
        /// The dtype string as found in the file
        dtype: String,
    },
}

impl fmt::Display for WtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WtsError::ShapeMismatch { tensor, reason } => {
                write!(f, "Shape mismatch on '{tensor}': {reason}")
            }
            WtsError::InvalidName { name } => {
                write!(
                    f,
                    "Invalid tensor name {name:?}: names must be non-empty and contain no whitespace"
                )
            }
            WtsError::Io(e) => write!(f, "I/O error: {e}"),
            WtsError::InternalInconsistency {
                tensor,
                declared,
                actual,
            } => {
                write!(
                    f,
                    "Internal inconsistency on '{tensor}': declared {declared} elements, found {actual}"
                )
            }
            WtsError::DuplicateTensor { name } => {
                write!(f, "Duplicate tensor name '{name}'")
            }
            WtsError::FormatError { message } => write!(f, "Invalid input format: {message}"),
            WtsError::UnsupportedDType { tensor, dtype } => {
                write!(f, "Unsupported dtype {dtype} for tensor '{tensor}'")
            }
        }
    }
}

impl std::error::Error for WtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WtsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WtsError {
    fn from(err: std::io::Error) -> Self {
        WtsError::Io(err)
    }
}

impl WtsError {
    /// Create a shape mismatch error for `tensor`
    #[must_use]
    pub fn shape_mismatch(tensor: &str, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            tensor: tensor.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a format error
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::FormatError {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, WtsError>;
