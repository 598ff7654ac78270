use std::path::PathBuf;

use civicdash_core::{ExtractError, TransformError, ValidationError};
use thiserror::Error;

/// Errors that stop a pipeline before it can write its summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("dataset '{dataset}' returned no '{column}' column")]
    MissingColumn { dataset: &'static str, column: String },

    #[error("extract for dataset '{dataset}' did not return the requested table shape")]
    UnexpectedShape { dataset: &'static str },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to encode GeoJSON for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown pipeline '{name}'")]
    UnknownPipeline { name: String },
}
