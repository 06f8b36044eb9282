//! Error types for revelar
//!
//! All fallible operations in the crate return [`Result`], with a single
//! error enum covering shape validation, head selection, degenerate
//! analysis inputs, and the storage boundary.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RevelarError>;

/// Errors produced by the repackaging and analysis pipelines
///
/// None of these are transient: every variant indicates a programming or
/// configuration mistake and is surfaced to the caller without retry.
#[derive(Debug, Error)]
pub enum RevelarError {
    /// Dimension or configuration inconsistency
    ///
    /// Raised before any output is produced; the transform aborts with no
    /// partial artifact.
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch {
        /// Expected vs. actual dimensions
        reason: String,
    },

    /// Caller requested more heads than exist, or zero heads
    #[error("Invalid head count: requested {requested}, available {available}")]
    InvalidHeadCount {
        /// Number of heads the caller asked to keep
        requested: usize,
        /// Number of heads actually present
        available: usize,
    },

    /// Sequence too short for positional statistics
    ///
    /// Previous/next-token attention averages over `seq_len - 1` entries
    /// and is undefined below two tokens.
    #[error("Degenerate sequence: positional statistics require seq_len >= 2, got {seq_len}")]
    DegenerateSequence {
        /// Offending sequence length
        seq_len: usize,
    },

    /// Non-finite or otherwise corrupt numeric input
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was found and where
        reason: String,
    },

    /// Filesystem error from the storage collaborator
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = RevelarError::ShapeMismatch {
            reason: "expected [12, 12], got [12, 8]".to_string(),
        };
        assert!(err.to_string().contains("[12, 8]"));
    }

    #[test]
    fn test_invalid_head_count_display() {
        let err = RevelarError::InvalidHeadCount {
            requested: 16,
            available: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_degenerate_sequence_display() {
        let err = RevelarError::DegenerateSequence { seq_len: 1 };
        assert!(err.to_string().contains("1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = RevelarError::from(io);
        assert!(matches!(err, RevelarError::Io(_)));
    }
}
