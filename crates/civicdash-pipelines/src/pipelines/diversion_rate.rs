//! Share of collected tonnage diverted from refuse, per fiscal year and borough.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;

use civicdash_core::{
    last_complete_period_end, Cell, Column, ExtractRequest, PeriodFrequency, Table,
};
use time::{Date, Month};
use tracing::info;

use crate::error::PipelineError;
use crate::output::write_csv;
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "ebb7-mvp5";

const QUERY: &str = "
SELECT
    `month`,
    `borough`,
    sum(`refusetonscollected`),
    sum(`papertonscollected`),
    sum(`mgptonscollected`),
    sum(`resorganicstons`),
    sum(`schoolorganictons`),
    sum(`leavesorganictons`),
    sum(`xmastreetons`),
    sum(`otherorganicstons`)
GROUP BY
    `month`,
    `borough`
LIMIT 100000000
";

const MONTH_COLUMN: &str = "month";
const BOROUGH_COLUMN: &str = "borough";
const FISCAL_YEAR_COLUMN: &str = "fy";

const REFUSE_COLUMN: &str = "sum_refusetonscollected";
const PAPER_COLUMN: &str = "sum_papertonscollected";
const MGP_COLUMN: &str = "sum_mgptonscollected";
const ORGANICS_COLUMNS: [&str; 5] = [
    "sum_resorganicstons",
    "sum_schoolorganictons",
    "sum_leavesorganictons",
    "sum_xmastreetons",
    "sum_otherorganicstons",
];

const FIRST_FISCAL_YEAR: i32 = 2017;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiversionRate;

impl Pipeline for DiversionRate {
    fn name(&self) -> &'static str {
        "diversion_rate"
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
            let tonnage = ctx
                .client()
                .extract(&request)
                .await?
                .into_table_with_metadata()
                .ok_or(PipelineError::UnexpectedShape {
                    dataset: DATASET_ID,
                })?;

            let last_complete_year =
                last_complete_period_end(&tonnage.metadata, PeriodFrequency::FISCAL_YEAR)?.year();
            let summary = summarise(&tonnage.data, last_complete_year)?;

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
struct Tonnage {
    refuse: f64,
    paper: f64,
    mgp: f64,
    organics: f64,
}

impl Tonnage {
    /// Paper, metal/glass/plastic and organics over everything collected.
    fn diversion_rate(self) -> Option<f64> {
        let diverted = self.organics + self.mgp + self.paper;
        let collected = diverted + self.refuse;
        (collected != 0.0).then(|| diverted / collected)
    }
}

/// Fiscal year containing a `YYYY / MM` month label.
fn fiscal_year(label: &str) -> Option<i32> {
    let (year, month) = label.split_once('/')?;
    let year = year.trim().parse::<i32>().ok()?;
    let month = Month::try_from(month.trim().parse::<u8>().ok()?).ok()?;
    let first_day = Date::from_calendar_date(year, month, 1).ok()?;
    PeriodFrequency::FISCAL_YEAR
        .period_end_containing(first_day)
        .ok()
        .map(Date::year)
}

/// Wide table: one row per fiscal year from 2017 through `last_complete_year`,
/// one diversion-rate column per borough in name order.
///
/// Missing tonnages count as zero. Rows without a readable month or a
/// borough are dropped, and a borough with no tonnage in a year gets null.
fn summarise(data: &Table, last_complete_year: i32) -> Result<Table, PipelineError> {
    let months = required_column(data, DATASET_ID, MONTH_COLUMN)?.cells();
    let boroughs = required_column(data, DATASET_ID, BOROUGH_COLUMN)?.cells();
    let tonnage = |name: &str| -> Result<Vec<f64>, PipelineError> {
        Ok(required_column(data, DATASET_ID, name)?
            .to_f64s()
            .into_iter()
            .map(|value| value.unwrap_or(0.0))
            .collect())
    };
    let refuse = tonnage(REFUSE_COLUMN)?;
    let paper = tonnage(PAPER_COLUMN)?;
    let mgp = tonnage(MGP_COLUMN)?;
    let organics = ORGANICS_COLUMNS
        .into_iter()
        .map(tonnage)
        .collect::<Result<Vec<_>, _>>()?;

    let mut totals: BTreeMap<(i32, String), Tonnage> = BTreeMap::new();
    for (row, (month, borough)) in months.iter().zip(boroughs).enumerate() {
        let Some(year) = month.as_str().and_then(fiscal_year) else {
            continue;
        };
        if !(FIRST_FISCAL_YEAR..=last_complete_year).contains(&year) {
            continue;
        }
        let Some(borough) = borough.as_str() else {
            continue;
        };
        let entry = totals.entry((year, borough.to_owned())).or_default();
        entry.refuse += refuse[row];
        entry.paper += paper[row];
        entry.mgp += mgp[row];
        entry.organics += organics.iter().map(|column| column[row]).sum::<f64>();
    }

    let years = totals
        .keys()
        .map(|(year, _)| *year)
        .collect::<BTreeSet<_>>();
    let borough_names = totals
        .keys()
        .map(|(_, borough)| borough.clone())
        .collect::<BTreeSet<_>>();

    let mut columns = vec![Column::numbers(
        FISCAL_YEAR_COLUMN,
        years.iter().map(|year| Some(f64::from(*year))),
    )];
    for borough in borough_names {
        let rates = years
            .iter()
            .map(|year| {
                totals
                    .get(&(*year, borough.clone()))
                    .and_then(|tonnage| tonnage.diversion_rate())
            })
            .collect::<Vec<_>>();
        columns.push(Column::numbers(borough, rates));
    }

    Ok(Table::from_columns(columns)?)
}

/// Every rate present and strictly between 0 and 1.
fn check(summary: &Table) -> Option<String> {
    summary
        .columns()
        .iter()
        .filter(|column| column.name() != FISCAL_YEAR_COLUMN)
        .find_map(|column| {
            column
                .cells()
                .iter()
                .map(Cell::as_f64)
                .position(|rate| !rate.is_some_and(|rate| rate > 0.0 && rate < 1.0))
                .map(|row| {
                    format!(
                        "{} rate in row {row} is missing or outside (0, 1)",
                        column.name()
                    )
                })
        })
}
