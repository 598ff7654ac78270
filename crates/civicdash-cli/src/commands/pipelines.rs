//! Lists the built-in pipelines.

use civicdash_pipelines::pipelines;
use serde::Serialize;

use crate::error::CliError;

use super::{emit, to_json};

#[derive(Debug, Serialize)]
struct PipelineEntry {
    name: &'static str,
    dataset_id: &'static str,
}

pub fn run(pretty: bool) -> Result<(), CliError> {
    let entries = pipelines::all()
        .iter()
        .map(|pipeline| PipelineEntry {
            name: pipeline.name(),
            dataset_id: pipeline.dataset_id(),
        })
        .collect::<Vec<_>>();
    emit(&to_json(&entries, pretty)?, None)
}
