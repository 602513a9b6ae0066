//! Error types for gauss-bbo
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for checkpoint persistence
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error while reading or writing checkpoint files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Target file exists and overwriting was not allowed
    #[error("File already exists (overwrite disabled): {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Checkpoint file not found
    #[error("Checkpoint not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Malformed file contents
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File was written by a newer format version
    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Top-level error type for optimization runs
#[derive(Debug, Error)]
pub enum BboError {
    /// Invalid configuration or arguments, detected before any sampling
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Dimension mismatch between distribution, samples, or costs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Degenerate statistics (non-PSD covariance, non-finite costs, zero weights)
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// The cost function reported a failure
    #[error("Cost evaluation failed: {0}")]
    CostEvaluation(String),

    /// Checkpoint persistence failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl BboError {
    /// Returns true for errors raised by configuration checks
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Precondition(_) | Self::DimensionMismatch { .. }
        )
    }

    /// Returns true for errors raised by degenerate statistics
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Numerical(_))
    }
}

/// Result type alias for optimization operations
pub type BboResult<T> = Result<T, BboError>;

/// Fail with a `DimensionMismatch` unless `actual == expected`
pub(crate) fn ensure_dimension(expected: usize, actual: usize) -> BboResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(BboError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbo_error_display() {
        let err = BboError::DimensionMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 2");

        let err = BboError::Numerical("all weights are zero".to_string());
        assert_eq!(err.to_string(), "Numerical error: all weights are zero");
    }

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::AlreadyExists(PathBuf::from("/tmp/x/costs.txt"));
        assert_eq!(
            err.to_string(),
            "File already exists (overwrite disabled): /tmp/x/costs.txt"
        );

        let err = PersistenceError::UnsupportedVersion {
            found: 7,
            supported: 1,
        };
        assert_eq!(err.to_string(), "Unsupported format version 7 (supported: 1)");
    }

    #[test]
    fn test_bbo_error_from_persistence_error() {
        let err: BboError = PersistenceError::Serialization("bad".to_string()).into();
        assert!(matches!(err, BboError::Persistence(_)));
        assert!(!err.is_precondition());
        assert!(!err.is_numerical());
    }

    #[test]
    fn test_error_classification() {
        assert!(BboError::Precondition("n_updates".into()).is_precondition());
        assert!(BboError::DimensionMismatch {
            expected: 1,
            actual: 2
        }
        .is_precondition());
        assert!(BboError::Numerical("nan".into()).is_numerical());
    }

    #[test]
    fn test_ensure_dimension() {
        assert!(ensure_dimension(4, 4).is_ok());
        assert!(matches!(
            ensure_dimension(4, 3),
            Err(BboError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
