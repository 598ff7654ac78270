//! Runs dashboard pipelines and prints the run report.

use civicdash_core::{OpenDataClient, OpenDataConfig};
use civicdash_pipelines::{pipelines, run_pipelines, PipelineContext};

use crate::cli::RunArgs;
use crate::error::CliError;

use super::{emit, to_json};

pub async fn run(args: &RunArgs, pretty: bool) -> Result<(), CliError> {
    let selected = pipelines::select(&args.pipelines)?;

    let client = OpenDataClient::new(OpenDataConfig::load());
    let ctx = PipelineContext::new(client).with_output_dir(args.data_dir.clone());
    let report = run_pipelines(&selected, &ctx).await;

    emit(&to_json(&report, pretty)?, None)?;

    if report.all_present() {
        Ok(())
    } else {
        Err(CliError::AbsentResults {
            absent: report.absent(),
        })
    }
}
