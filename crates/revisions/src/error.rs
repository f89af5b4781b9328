//! Error types for the revision system
//!
//! Benign outcomes (`AlreadyPerformed`) and fatal ones share one enum so the
//! engine can decide which to aggregate and which to abort on.

use thiserror::Error;

/// Result type alias for revision operations
pub type RevisionResult<T> = Result<T, RevisionError>;

/// Error types for revision operations
#[derive(Debug, Error)]
pub enum RevisionError {
    /// Identifier does not parse as a `YYYYMMDDhhmmss` timestamp
    #[error("revision id invalid: {0:?}")]
    InvalidId(String),

    /// Revision is already in the log; expected on re-runs
    #[error("revision {0}: revision already performed")]
    AlreadyPerformed(String),

    /// Slug absent from the log
    #[error("revision {0}: revision not found")]
    NotFound(String),

    /// Structural failure in the comment block header
    #[error("malformed revision header: {0}")]
    MalformedHeader(String),

    /// Slug longer than the log table can hold
    #[error("revision {slug}: slug longer than {max} characters")]
    SlugTooLong { slug: String, max: usize },

    /// No dialect registered under the given type name
    #[error("unknown database type {0}")]
    UnknownBackend(String),

    /// Registry misuse or invalid setup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Driver, connection or statement failure
    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A driver failure attributed to the revision that caused it
    #[error("revision {slug}: {source}")]
    Failed {
        slug: String,
        #[source]
        source: Box<RevisionError>,
    },
}

impl RevisionError {
    /// Attribute an error to the revision with the given slug
    pub fn for_revision(slug: impl Into<String>, source: RevisionError) -> Self {
        RevisionError::Failed {
            slug: slug.into(),
            source: Box::new(source),
        }
    }

    /// Whether this is the benign `AlreadyPerformed` outcome
    pub fn is_already_performed(&self) -> bool {
        matches!(self, RevisionError::AlreadyPerformed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RevisionError::NotFound(_))
    }
}

impl From<sqlx::Error> for RevisionError {
    fn from(err: sqlx::Error) -> Self {
        RevisionError::Database(err.to_string())
    }
}
