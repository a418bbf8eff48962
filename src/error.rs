//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the CLI
//! uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum
//! - Module-specific errors (e.g., [`UpstreamError`]) for detailed handling
//! - "Already exists" is never an error: the catalog reports it as a normal
//!   result value. Duplicate-key races are resolved inside the catalog and
//!   never reach this type.
//!
//! # Example
//!
//! ```ignore
//! use songbook::error::{Error, Result};
//!
//! async fn ingest(catalog: &Catalog, record: &TrackRecord) -> Result<()> {
//!     let outcome = catalog.save_track(record).await?; // Validation/Database errors propagate
//!     Ok(())
//! }
//! ```

use crate::source::UpstreamError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error other than a resolved duplicate key
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing required input
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The external track source failed or timed out
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Staged payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Import draft missing, expired, or owned by another actor
    #[error("Import draft not found or expired: {0}")]
    DraftNotFound(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a draft-not-found error.
    pub fn draft_not_found(id: impl Into<String>) -> Self {
        Self::DraftNotFound(id.into())
    }

    /// Whether this error was caused by bad input rather than a failure.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation { .. } => true,
            Self::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = Error::validation("artist", "track record has no artist");
        let msg = err.to_string();
        assert!(msg.contains("artist"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::draft_not_found("abc").context("while committing import");
        let msg = err.to_string();
        assert!(msg.contains("while committing import"));
        assert!(msg.contains("abc"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_context_preserves_validation_kind() {
        let err = Error::validation("title", "empty").context("row 3");
        assert!(err.is_validation());
    }

    #[test]
    fn test_upstream_error_converts() {
        let err: Error = UpstreamError::RateLimited.into();
        assert!(matches!(err, Error::Upstream(UpstreamError::RateLimited)));
    }

    #[test]
    fn test_result_ext_wraps_io_error() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_context("reading songs.csv").unwrap_err();
        assert!(err.to_string().starts_with("reading songs.csv: IO error"));
        assert!(matches!(err, Error::WithContext { ref source, .. } if matches!(**source, Error::Io(_))));
    }
}
