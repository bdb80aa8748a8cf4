//! Error types for Sieve.
//!
//! One crate-wide error type. Filters report their own failures through it,
//! and the cache hands those failures back to the caller untouched.
//! Error codes follow the pattern `SIEVE-XXX` for easy debugging.

use thiserror::Error;

/// Result type alias for Sieve operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Sieve operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Filter evaluation failed (SIEVE-001).
    #[error("[SIEVE-001] Filter evaluation failed: {0}")]
    Evaluation(String),

    /// A filter produced a document id outside its segment (SIEVE-002).
    #[error("[SIEVE-002] Document {doc} is out of range for segment with max_doc {max_doc}")]
    DocOutOfRange {
        /// Offending document id.
        doc: u32,
        /// Number of documents in the segment.
        max_doc: u32,
    },

    /// Operation not supported by this doc set representation (SIEVE-003).
    #[error("[SIEVE-003] Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Configuration error (SIEVE-004).
    #[error("[SIEVE-004] Configuration error: {0}")]
    Config(String),

    /// Serialization error (SIEVE-005).
    #[error("[SIEVE-005] Serialization error: {0}")]
    Serialization(String),

    /// IO error (SIEVE-006).
    #[error("[SIEVE-006] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (SIEVE-007).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[SIEVE-007] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "SIEVE-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Evaluation(_) => "SIEVE-001",
            Self::DocOutOfRange { .. } => "SIEVE-002",
            Self::UnsupportedOperation(_) => "SIEVE-003",
            Self::Config(_) => "SIEVE-004",
            Self::Serialization(_) => "SIEVE-005",
            Self::Io(_) => "SIEVE-006",
            Self::Internal(_) => "SIEVE-007",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Capability misuse and internal errors are programming errors; retrying
    /// the same call will fail the same way.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedOperation(_) | Self::Internal(_) | Self::DocOutOfRange { .. }
        )
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
