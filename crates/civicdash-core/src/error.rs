use serde_json::Value;
use thiserror::Error;

use crate::http_client::HttpError;

/// Validation errors for caller-supplied selectors and aliases.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid collection '{value}', expected one of city, state")]
    InvalidCollection { value: String },

    #[error("invalid period frequency '{value}', expected YE or YE-<MON> (e.g. YE-JUN)")]
    InvalidFrequency { value: String },

    #[error("timestamp could not be parsed: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("column '{column}' has {actual} cells, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}

/// Configuration errors raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{variable} not set. Put it in .env or env vars.")]
    MissingAppToken { variable: &'static str },
}

/// Coarse classification of extract failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractErrorKind {
    Configuration,
    DataFetch,
    Decode,
}

/// Errors surfaced by the extract layer.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("open data request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: u16,
        /// Structured error body, `None` when the body was not JSON.
        body: Option<Value>,
    },

    #[error("open data request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: HttpError,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ExtractError {
    pub const fn kind(&self) -> ExtractErrorKind {
        match self {
            Self::Config(_) => ExtractErrorKind::Configuration,
            Self::HttpStatus { .. } | Self::Transport { .. } => ExtractErrorKind::DataFetch,
            Self::Decode { .. } => ExtractErrorKind::Decode,
        }
    }

    /// Status code of a non-success response, if that is what failed.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the period helpers in [`crate::transform`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("metadata has no 'dataUpdatedAt' field")]
    MissingDataUpdatedAt,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("date out of range while computing period end")]
    DateOutOfRange,
}
