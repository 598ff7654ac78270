//! Protected and unprotected bicycle lane miles installed per fiscal year.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use civicdash_core::{
    last_complete_period_end, Cell, Column, ExtractRequest, PeriodFrequency, Table,
};
use tracing::info;

use crate::error::PipelineError;
use crate::output::write_csv;
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "rbed-zzin";

const QUERY: &str = "
SELECT
    `fiscalyear`,
    `indicator`,
    SUM(`acceptedvalue`) AS `total_miles`
WHERE (`id` == 2851) OR (`id` == 12319)
GROUP BY
    `fiscalyear`,
    `indicator`
";

const YEAR_COLUMN: &str = "fiscalyear";
const INDICATOR_COLUMN: &str = "indicator";
const TOTAL_COLUMN: &str = "total_miles";
const MILES_COLUMN: &str = "miles";

const ALL_LANES: &str = "Bicycle lane miles installed";
const PROTECTED_LANES: &str = "Bicycle lane miles installed — Protected";

const PROTECTED: &str = "protected";
const UNPROTECTED: &str = "unprotected";

const MAX_PLAUSIBLE_MILES: f64 = 300.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BicycleLaneMiles;

impl Pipeline for BicycleLaneMiles {
    fn name(&self) -> &'static str {
        "bicycle_lane_miles"
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
                last_complete_period_end(&dataset.metadata, PeriodFrequency::FISCAL_YEAR)?.year();
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

#[derive(Debug, Clone, Copy, Default)]
struct YearTotals {
    all: Option<f64>,
    protected: Option<f64>,
}

/// Long table of `(fiscalyear, indicator, miles)` through `last_complete_year`,
/// with `protected` and `unprotected` (all lanes minus protected) per year.
///
/// A year missing either indicator keeps a null `unprotected` value.
fn summarise(data: &Table, last_complete_year: i32) -> Result<Table, PipelineError> {
    let years = required_column(data, DATASET_ID, YEAR_COLUMN)?.to_f64s();
    let indicators = required_column(data, DATASET_ID, INDICATOR_COLUMN)?.cells();
    let totals = required_column(data, DATASET_ID, TOTAL_COLUMN)?.to_f64s();

    let mut by_year: BTreeMap<i64, YearTotals> = BTreeMap::new();
    for ((year, indicator), total) in years.into_iter().zip(indicators).zip(totals) {
        let Some(year) = year.filter(|year| year.fract() == 0.0) else {
            continue;
        };
        let entry = by_year.entry(year as i64).or_default();
        match indicator.as_str() {
            Some(ALL_LANES) => entry.all = total,
            Some(PROTECTED_LANES) => entry.protected = total,
            _ => {}
        }
    }

    let mut year_cells = Vec::new();
    let mut indicator_cells = Vec::new();
    let mut miles = Vec::new();
    for (year, totals) in by_year
        .into_iter()
        .filter(|(year, _)| *year <= i64::from(last_complete_year))
    {
        let unprotected = totals
            .all
            .zip(totals.protected)
            .map(|(all, protected)| all - protected);
        for (indicator, value) in [(PROTECTED, totals.protected), (UNPROTECTED, unprotected)] {
            year_cells.push(Some(year as f64));
            indicator_cells.push(Cell::from_json(&serde_json::Value::from(indicator)));
            miles.push(value);
        }
    }

    Ok(Table::from_columns(vec![
        Column::numbers(YEAR_COLUMN, year_cells),
        Column::untyped(INDICATOR_COLUMN, indicator_cells),
        Column::numbers(MILES_COLUMN, miles),
    ])?)
}

/// Every value present and within 0..=300 miles.
fn check(summary: &Table) -> Option<String> {
    let Some(miles) = summary.column(MILES_COLUMN) else {
        return Some(format!("{MILES_COLUMN} column is missing"));
    };
    miles
        .to_f64s()
        .into_iter()
        .enumerate()
        .find_map(|(row, value)| match value {
            Some(value) if (0.0..=MAX_PLAUSIBLE_MILES).contains(&value) => None,
            Some(value) => Some(format!(
                "{MILES_COLUMN} {value} in row {row} is outside 0..={MAX_PLAUSIBLE_MILES}"
            )),
            None => Some(format!("{MILES_COLUMN} is missing in row {row}")),
        })
}
