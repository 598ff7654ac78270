//! Buildings and schools receiving curbside organics collection per fiscal year.

use std::future::Future;
use std::pin::Pin;

use civicdash_core::{Column, ExtractRequest, Table};
use tracing::info;

use crate::error::PipelineError;
use crate::output::write_csv;
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "tiyn-ajjm";

const QUERY: &str = "
SELECT
    `fiscal_year`,
    `number_of_1_9_unit_buildings`,
    `number_of_10_unit_buildings`,
    `total_number_of_schools_receiving_curbside_organics_collection`
";

const INDEX_COLUMN: &str = "fiscal_year";
const SMALL_BUILDINGS_COLUMN: &str = "number_of_1_9_unit_buildings";
const LARGE_BUILDINGS_COLUMN: &str = "number_of_10_unit_buildings";
const SCHOOLS_COLUMN: &str = "total_number_of_schools_receiving_curbside_organics_collection";

const VALUE_COLUMNS: [&str; 3] = [
    SMALL_BUILDINGS_COLUMN,
    LARGE_BUILDINGS_COLUMN,
    SCHOOLS_COLUMN,
];

const SCHOOLS_LIMIT: f64 = 10_000.0;
const SMALL_BUILDINGS_LIMIT: f64 = 5_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrganicsCollectionBuildings;

impl Pipeline for OrganicsCollectionBuildings {
    fn name(&self) -> &'static str {
        "organics_collection_buildings"
    }

    fn dataset_id(&self) -> &'static str {
        DATASET_ID
    }

    fn run<'a>(
        &'a self,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineOutcome, PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let request = ExtractRequest::new(DATASET_ID).with_query(QUERY);
            let data = ctx
                .client()
                .extract(&request)
                .await?
                .into_table()
                .ok_or(PipelineError::UnexpectedShape {
                    dataset: DATASET_ID,
                })?;

            let summary = summarise(&data)?;

            if let Some(reason) = check(&summary) {
                return Ok(reject(self.name(), reason, &summary));
            }

            let path = ctx.summary_path(self.name());
            write_csv(&summary, &path)?;
            info!(pipeline = self.name(), path = %path.display(), rows = summary.row_count(), "saved summary");
            Ok(PipelineOutcome::Written {
                files: vec![path],
                rows: summary.row_count(),
            })
        })
    }
}

/// Fiscal year first, then the counts in query order.
fn summarise(data: &Table) -> Result<Table, PipelineError> {
    let mut columns: Vec<Column> = Vec::with_capacity(VALUE_COLUMNS.len() + 1);
    columns.push(required_column(data, DATASET_ID, INDEX_COLUMN)?.clone());
    for name in VALUE_COLUMNS {
        columns.push(required_column(data, DATASET_ID, name)?.clone());
    }
    Ok(Table::from_columns(columns)?)
}

/// All counts present and non-negative, and the two headline counts below
/// their ceilings.
fn check(summary: &Table) -> Option<String> {
    if let Some(name) = VALUE_COLUMNS
        .into_iter()
        .find(|name| summary.column(name).is_none())
    {
        return Some(format!("{name} column is missing"));
    }

    for name in VALUE_COLUMNS {
        let values = summary.column(name).map(Column::to_f64s).unwrap_or_default();
        if let Some(row) = values
            .iter()
            .position(|value| !value.is_some_and(|value| value >= 0.0))
        {
            return Some(format!("{name} is missing or negative in row {row}"));
        }
    }

    for (name, limit) in [
        (SCHOOLS_COLUMN, SCHOOLS_LIMIT),
        (SMALL_BUILDINGS_COLUMN, SMALL_BUILDINGS_LIMIT),
    ] {
        let max = summary
            .column(name)
            .map(Column::to_f64s)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .reduce(f64::max);
        match max {
            Some(max) if max < limit => {}
            Some(max) => return Some(format!("{name} max {max} is not below {limit}")),
            None => return Some(format!("{name} has no values")),
        }
    }

    None
}
