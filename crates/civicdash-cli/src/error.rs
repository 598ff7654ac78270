use civicdash_core::{ExtractError, ExtractErrorKind};
use civicdash_pipelines::PipelineError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("no result from pipeline(s): {}", .absent.join(", "))]
    AbsentResults { absent: Vec<&'static str> },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Extract(error) => extract_exit_code(error),
            Self::Pipeline(PipelineError::UnknownPipeline { .. }) => 2,
            Self::Pipeline(PipelineError::Extract(error)) => extract_exit_code(error),
            Self::Pipeline(_) => 4,
            Self::AbsentResults { .. } => 6,
            Self::Logging(_) => 10,
            Self::Serialization(_) => 4,
            Self::Csv(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

const fn extract_exit_code(error: &ExtractError) -> u8 {
    match error.kind() {
        ExtractErrorKind::Configuration => 3,
        ExtractErrorKind::DataFetch | ExtractErrorKind::Decode => 4,
    }
}
