//! Runs pipelines one after another and reports what each produced.
//!
//! A pipeline that errors or rejects its data does not stop the run; its
//! result is recorded as absent and the next pipeline starts.

use std::path::PathBuf;
use std::time::Instant;

use civicdash_core::UtcDateTime;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};

use crate::pipeline::{Pipeline, PipelineContext, PipelineOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Written,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub name: &'static str,
    pub dataset_id: &'static str,
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Rejection reason or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Whether the run produced a result for this pipeline.
    pub const fn is_present(&self) -> bool {
        matches!(self.status, PipelineStatus::Written)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: UtcDateTime,
    pub pipelines: Vec<PipelineReport>,
}

impl RunReport {
    pub fn all_present(&self) -> bool {
        self.pipelines.iter().all(PipelineReport::is_present)
    }

    /// Names of pipelines that produced no result.
    pub fn absent(&self) -> Vec<&'static str> {
        self.pipelines
            .iter()
            .filter(|report| !report.is_present())
            .map(|report| report.name)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&PipelineReport> {
        self.pipelines.iter().find(|report| report.name == name)
    }
}

/// Runs `pipelines` sequentially against `ctx`.
pub async fn run_pipelines(pipelines: &[Box<dyn Pipeline>], ctx: &PipelineContext) -> RunReport {
    let started_at = UtcDateTime::now();
    let mut reports = Vec::with_capacity(pipelines.len());

    for pipeline in pipelines {
        let span = info_span!("pipeline", name = pipeline.name());
        let report = run_one(pipeline.as_ref(), ctx).instrument(span).await;
        reports.push(report);
    }

    let absent = reports.iter().filter(|report| !report.is_present()).count();
    info!(
        pipelines = reports.len(),
        absent,
        "finished {} pipelines",
        reports.len()
    );

    RunReport {
        started_at,
        pipelines: reports,
    }
}

async fn run_one(pipeline: &dyn Pipeline, ctx: &PipelineContext) -> PipelineReport {
    info!(dataset = pipeline.dataset_id(), "starting pipeline");
    let started = Instant::now();
    let result = pipeline.run(ctx).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut report = PipelineReport {
        name: pipeline.name(),
        dataset_id: pipeline.dataset_id(),
        status: PipelineStatus::Failed,
        files: Vec::new(),
        rows: None,
        detail: None,
        duration_ms,
    };

    match result {
        Ok(PipelineOutcome::Written { files, rows }) => {
            info!(rows, duration_ms, "pipeline wrote summary");
            report.status = PipelineStatus::Written;
            report.files = files;
            report.rows = Some(rows);
        }
        Ok(PipelineOutcome::Rejected { reason }) => {
            warn!(reason = %reason, "pipeline rejected its data");
            report.status = PipelineStatus::Rejected;
            report.detail = Some(reason);
        }
        Err(err) => {
            error!(error = %err, "pipeline failed");
            report.detail = Some(err.to_string());
        }
    }

    report
}
