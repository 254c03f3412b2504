//! Error types for access resolution.
//!
//! There is deliberately no "access denied" error: denial is always an
//! ordinary `false` / `has_access: false` value.

use std::path::PathBuf;

use access_protocol::ParseEnumError;

/// Result type alias for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Result type alias for repository calls.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Errors returned by the access engine.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Malformed input, rejected before any repository call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failure reported by the repository, propagated as-is.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AccessError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_repository(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An identifier is not a hyphenated UUID.
    #[error("Invalid {field}: '{value}' is not a UUID")]
    InvalidId { field: &'static str, value: String },

    /// Negative page index.
    #[error("Invalid page {0}: must be 0 or greater")]
    InvalidPage(i64),

    /// Page size outside `1..=max`.
    #[error("Invalid page size {value}: must be between 1 and {max}")]
    InvalidPageSize { value: i64, max: i64 },

    /// Unknown asset type, role or identity type name.
    #[error(transparent)]
    UnknownVariant(#[from] ParseEnumError),
}

impl ValidationError {
    /// Creates a new `InvalidId` error.
    pub fn invalid_id(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            field,
            value: value.into(),
        }
    }
}

/// Errors surfaced by an [`AccessRepository`](crate::AccessRepository)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store could not be reached.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be interpreted.
    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord { entity: &'static str, reason: String },

    /// Any other backend failure, root cause preserved.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl RepositoryError {
    /// Creates a new `Unavailable` error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a new `InvalidRecord` error.
    pub fn invalid_record(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            entity,
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`AccessConfig`](crate::AccessConfig).
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or malformed.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    /// Creates a new `InvalidValue` error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
