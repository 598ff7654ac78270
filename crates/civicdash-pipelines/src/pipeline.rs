//! Pipeline contract and the context every pipeline runs with.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use civicdash_core::{OpenDataClient, Table};
use serde::Serialize;
use tracing::error;

use crate::error::PipelineError;

/// Directory summaries are written to unless the caller overrides it.
pub const DEFAULT_OUTPUT_DIR: &str = "Data/Summary Data";

/// Rows of rejected data included in the error log.
const REJECTED_TAIL_ROWS: usize = 20;

/// Shared inputs for a pipeline run.
#[derive(Clone)]
pub struct PipelineContext {
    client: OpenDataClient,
    output_dir: PathBuf,
}

impl PipelineContext {
    pub fn new(client: OpenDataClient) -> Self {
        Self {
            client,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn client(&self) -> &OpenDataClient {
        &self.client
    }

    /// `<output_dir>/<pipeline>.csv`
    pub fn summary_path(&self, pipeline: &str) -> PathBuf {
        self.output_path(pipeline, "csv")
    }

    pub fn output_path(&self, pipeline: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{pipeline}.{extension}"))
    }
}

/// How a pipeline finished when nothing went wrong on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The summary passed its checks and was saved.
    Written { files: Vec<PathBuf>, rows: usize },
    /// The summary failed its plausibility checks; nothing was saved.
    Rejected { reason: String },
}

impl PipelineOutcome {
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

impl Display for PipelineOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written { files, rows } => {
                write!(f, "wrote {rows} rows to {} file(s)", files.len())
            }
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

/// A dashboard pipeline: extract, summarise, check, save.
pub trait Pipeline: Send + Sync {
    /// Stable identifier, also the summary file stem.
    fn name(&self) -> &'static str;

    /// Open data dataset the pipeline reads.
    fn dataset_id(&self) -> &'static str;

    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the extract fails, the response lacks an
    /// expected column, or the summary cannot be written. Data that fails the
    /// plausibility checks is not an error; see [`PipelineOutcome::Rejected`].
    fn run<'a>(
        &'a self,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineOutcome, PipelineError>> + Send + 'a>>;
}

/// Logs the tail of a summary that failed its checks and builds the outcome.
pub fn reject(pipeline: &str, reason: impl Into<String>, summary: &Table) -> PipelineOutcome {
    let reason = reason.into();
    error!(
        pipeline,
        reason = %reason,
        "incorrect data:\n{}",
        summary.tail(REJECTED_TAIL_ROWS)
    );
    PipelineOutcome::Rejected { reason }
}

/// Looks up a column the query is expected to return.
pub fn required_column<'t>(
    table: &'t Table,
    dataset: &'static str,
    column: &str,
) -> Result<&'t civicdash_core::Column, PipelineError> {
    table
        .column(column)
        .ok_or_else(|| PipelineError::MissingColumn {
            dataset,
            column: column.to_owned(),
        })
}
