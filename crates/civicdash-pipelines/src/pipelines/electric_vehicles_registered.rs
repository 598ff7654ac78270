//! Registered vehicles in the five boroughs by fuel group, with shares.

use std::future::Future;
use std::pin::Pin;

use civicdash_core::{Collection, Column, ExtractRequest, Table};
use tracing::info;

use crate::error::PipelineError;
use crate::output::write_csv;
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "w4pv-hbkt";

const QUERY: &str = r#"
SELECT
CASE
    WHEN `fuel_type` IN ('GAS', 'DIESEL') THEN 'GAS_AND_DIESEL'
    ELSE `fuel_type`
END AS `fuel_group`,
COUNT(DISTINCT `vin`) AS `vehicle_count`
WHERE
`county` IN ("KINGS", "NEW YORK", "BRONX", "RICHMOND", "QUEENS")
AND `record_type` = 'VEH'
AND `fuel_type` IN ("ELECTRIC", "GAS", "DIESEL")
GROUP BY `fuel_group`
"#;

const GROUP_COLUMN: &str = "fuel_group";
const COUNT_COLUMN: &str = "vehicle_count";
const SHARE_COLUMN: &str = "pct";
const MAX_PLAUSIBLE_COUNT: f64 = 5_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ElectricVehiclesRegistered;

impl Pipeline for ElectricVehiclesRegistered {
    fn name(&self) -> &'static str {
        "electric_vehicles_registered"
    }

    fn dataset_id(&self) -> &'static str {
        DATASET_ID
    }

    fn run<'a>(
        &'a self,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineOutcome, PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let request = ExtractRequest::new(DATASET_ID)
                .with_query(QUERY)
                .with_collection(Collection::State);
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

/// Adds each group's share of the total count.
fn summarise(data: &Table) -> Result<Table, PipelineError> {
    let groups = required_column(data, DATASET_ID, GROUP_COLUMN)?.clone();
    let counts = required_column(data, DATASET_ID, COUNT_COLUMN)?.to_f64s();

    let total: f64 = counts.iter().flatten().sum();
    let shares = counts
        .iter()
        .map(|count| count.filter(|_| total != 0.0).map(|count| count / total))
        .collect::<Vec<_>>();

    Ok(Table::from_columns(vec![
        groups,
        Column::numbers(COUNT_COLUMN, counts),
        Column::numbers(SHARE_COLUMN, shares),
    ])?)
}

/// Every group's count must be present and plausible.
fn check(summary: &Table) -> Option<String> {
    let Some(counts) = summary.column(COUNT_COLUMN) else {
        return Some(format!("{COUNT_COLUMN} column is missing"));
    };
    counts
        .to_f64s()
        .into_iter()
        .enumerate()
        .find_map(|(row, count)| match count {
            Some(count) if (0.0..=MAX_PLAUSIBLE_COUNT).contains(&count) => None,
            Some(count) => Some(format!(
                "{COUNT_COLUMN} {count} in row {row} is outside 0..={MAX_PLAUSIBLE_COUNT}"
            )),
            None => Some(format!("{COUNT_COLUMN} is missing in row {row}")),
        })
}
