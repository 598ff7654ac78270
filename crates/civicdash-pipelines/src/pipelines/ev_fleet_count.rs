//! Electric vehicles in the city fleet, one row per fiscal year.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use civicdash_core::{
    last_complete_period_end, Column, ExtractRequest, PeriodFrequency, Table,
};
use tracing::info;

use crate::error::PipelineError;
use crate::output::write_csv;
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "rbed-zzin";

const QUERY: &str = "
SELECT
    `fiscalyear`,
    `acceptedvalueytd` AS electric_vehicles
WHERE `id` == 10956
";

const YEAR_COLUMN: &str = "fiscalyear";
const COUNT_COLUMN: &str = "electric_vehicles";
const MAX_PLAUSIBLE_COUNT: f64 = 50_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct EvFleetCount;

impl Pipeline for EvFleetCount {
    fn name(&self) -> &'static str {
        "ev_fleet_count"
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
                .with_metadata(true);
            let dataset = ctx
                .client()
                .extract(&request)
                .await?
                .into_table_with_metadata()
                .ok_or(PipelineError::UnexpectedShape {
                    dataset: DATASET_ID,
                })?;

            let last_complete_year =
                last_complete_period_end(&dataset.metadata, PeriodFrequency::CALENDAR_YEAR)?
                    .year();
            let summary = summarise(&dataset.data, last_complete_year)?;

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

/// Highest year-to-date count per fiscal year, up to `last_complete_year`.
///
/// Rows without a whole-number fiscal year are dropped; a year whose counts
/// are all missing keeps a null count.
fn summarise(data: &Table, last_complete_year: i32) -> Result<Table, PipelineError> {
    let years = required_column(data, DATASET_ID, YEAR_COLUMN)?.to_f64s();
    let counts = required_column(data, DATASET_ID, COUNT_COLUMN)?.to_f64s();

    let mut by_year: BTreeMap<i64, Option<f64>> = BTreeMap::new();
    for (year, count) in years.into_iter().zip(counts) {
        let Some(year) = year.filter(|year| year.fract() == 0.0) else {
            continue;
        };
        let entry = by_year.entry(year as i64).or_insert(None);
        *entry = match (*entry, count) {
            (Some(current), Some(count)) => Some(current.max(count)),
            (current, count) => current.or(count),
        };
    }

    let (years, maxima): (Vec<_>, Vec<_>) = by_year
        .into_iter()
        .filter(|(year, _)| *year <= i64::from(last_complete_year))
        .map(|(year, max)| (Some(year as f64), max))
        .unzip();

    Ok(Table::from_columns(vec![
        Column::numbers(YEAR_COLUMN, years),
        Column::numbers(COUNT_COLUMN, maxima),
    ])?)
}

/// The latest year's count must be present and plausible.
fn check(summary: &Table) -> Option<String> {
    let latest = summary
        .column(COUNT_COLUMN)
        .and_then(|column| column.cells().last())?;
    match latest.as_f64() {
        Some(count) if (0.0..=MAX_PLAUSIBLE_COUNT).contains(&count) => None,
        Some(count) => Some(format!(
            "latest {COUNT_COLUMN} {count} is outside 0..={MAX_PLAUSIBLE_COUNT}"
        )),
        None => Some(format!("latest {COUNT_COLUMN} is missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicdash_core::RawRows;
    use serde_json::json;

    fn data(value: serde_json::Value) -> Table {
        let rows: RawRows = serde_json::from_value(value).expect("records");
        Table::from_records(&rows)
    }

    #[test]
    fn takes_yearly_maximum_and_drops_incomplete_years() {
        let data = data(json!([
            {"fiscalyear": "2022", "electric_vehicles": "1200"},
            {"fiscalyear": "2022", "electric_vehicles": "1500"},
            {"fiscalyear": "2023", "electric_vehicles": "2100"},
            {"fiscalyear": "2023", "electric_vehicles": "n/a"},
            {"fiscalyear": "2024", "electric_vehicles": "2500"},
            {"fiscalyear": "unknown", "electric_vehicles": "9"}
        ]));

        let summary = summarise(&data, 2023).expect("summary");

        assert_eq!(
            summary.column(YEAR_COLUMN).map(Column::to_f64s),
            Some(vec![Some(2022.0), Some(2023.0)])
        );
        assert_eq!(
            summary.column(COUNT_COLUMN).map(Column::to_f64s),
            Some(vec![Some(1500.0), Some(2100.0)])
        );
        assert_eq!(check(&summary), None);
    }

    #[test]
    fn implausible_latest_count_is_rejected() {
        let data = data(json!([
            {"fiscalyear": "2022", "electric_vehicles": "70000"},
            {"fiscalyear": "2023", "electric_vehicles": "-1"}
        ]));
        let summary = summarise(&data, 2023).expect("summary");
        assert!(check(&summary).is_some());
    }

    #[test]
    fn earlier_years_are_not_checked() {
        let data = data(json!([
            {"fiscalyear": "2022", "electric_vehicles": "70000"},
            {"fiscalyear": "2023", "electric_vehicles": "3000"}
        ]));
        let summary = summarise(&data, 2023).expect("summary");
        assert_eq!(check(&summary), None);
    }

    #[test]
    fn missing_latest_count_is_rejected() {
        let data = data(json!([{"fiscalyear": "2023", "electric_vehicles": null}]));
        let summary = summarise(&data, 2023).expect("summary");
        assert_eq!(
            check(&summary),
            Some(String::from("latest electric_vehicles is missing"))
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = data(json!([{"fiscalyear": "2023"}]));
        assert!(matches!(
            summarise(&data, 2023),
            Err(PipelineError::MissingColumn { .. })
        ));
    }
}
