//! Error types for loading and validating `voice.config.json`.
//!
//! [`ConfigError`] is what every manager call returns on failure.  Schema
//! violations are reported through [`ValidationError`], which always names
//! the offending field path (e.g. `translate.base_url`, `character[2].top_k`).

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// All errors that can surface from loading the voice configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file exists at the configured path.
    #[error(
        "voice config file not found: {}\ncreate voice.config.json or copy the sample configuration",
        .path.display()
    )]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("cannot read voice config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not well-formed JSON.
    #[error("failed to parse voice config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but violates a schema rule.
    #[error("invalid voice config: {0}")]
    Validation(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// The first schema rule a document violates.
///
/// `field` is always the full dotted path of the offending value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is missing")]
    Missing { field: String },

    #[error("{field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: String, value: f64 },

    /// A referenced file or directory does not exist.
    #[error("{field} does not exist: {}", .path.display())]
    PathNotFound { field: String, path: PathBuf },

    #[error("{field} has invalid value {value:?}; supported types: {accepted}")]
    UnknownProvider {
        field: String,
        value: String,
        accepted: String,
    },

    /// The selected translation provider needs an API key but none was given.
    #[error("{provider} provider requires translate.api_key")]
    ApiKeyRequired { provider: String },

    #[error("{field} is not a valid URL ({value:?}): {reason}")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field} has unsupported language {value:?}")]
    UnknownLanguage { field: String, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// The entry passed the rule tables but could not be mapped onto its
    /// typed shape (e.g. an optional field with the wrong JSON type).
    #[error("{field} is malformed: {reason}")]
    Malformed { field: String, reason: String },
}

impl ValidationError {
    /// Dotted path of the field that failed, when the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Missing { field }
            | Self::WrongType { field, .. }
            | Self::Empty { field }
            | Self::NotPositive { field, .. }
            | Self::PathNotFound { field, .. }
            | Self::UnknownProvider { field, .. }
            | Self::InvalidUrl { field, .. }
            | Self::UnknownLanguage { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Malformed { field, .. } => Some(field.as_str()),
            Self::ApiKeyRequired { .. } => None,
        }
    }
}
