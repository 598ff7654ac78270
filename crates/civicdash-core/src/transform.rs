//! Reporting-period helpers shared by the pipelines.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Offset, TimeZone};
use chrono_tz::America::New_York;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::extract::DatasetMetadata;
use crate::timestamp::ParsedTimestamp;
use crate::{TransformError, ValidationError};

/// Annual period ending on the last day of `month`.
///
/// Parsed from `YE` (calendar year) or `YE-<MON>`, e.g. `YE-JUN` for a fiscal
/// year ending June 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodFrequency {
    month: Month,
}

impl PeriodFrequency {
    pub const CALENDAR_YEAR: Self = Self {
        month: Month::December,
    };
    pub const FISCAL_YEAR: Self = Self { month: Month::June };

    pub const fn year_ending(month: Month) -> Self {
        Self { month }
    }

    fn period_end(self, year: i32) -> Result<Date, TransformError> {
        let (next_year, next_month) = match self.month {
            Month::December => (year + 1, Month::January),
            month => (year, month.next()),
        };
        Date::from_calendar_date(next_year, next_month, 1)
            .ok()
            .and_then(Date::previous_day)
            .ok_or(TransformError::DateOutOfRange)
    }

    /// End of the period `date` falls in; a period end maps to itself.
    pub fn period_end_containing(self, date: Date) -> Result<Date, TransformError> {
        let this_year = self.period_end(date.year())?;
        if date <= this_year {
            Ok(this_year)
        } else {
            self.period_end(date.year() + 1)
        }
    }

    /// Latest period end strictly before `moment`'s date.
    pub fn last_end_before(self, moment: PrimitiveDateTime) -> Result<Date, TransformError> {
        let date = moment.date();
        let this_year = self.period_end(date.year())?;
        if date > this_year {
            Ok(this_year)
        } else {
            self.period_end(date.year() - 1)
        }
    }
}

const MONTH_ABBREVIATIONS: [(&str, Month); 12] = [
    ("JAN", Month::January),
    ("FEB", Month::February),
    ("MAR", Month::March),
    ("APR", Month::April),
    ("MAY", Month::May),
    ("JUN", Month::June),
    ("JUL", Month::July),
    ("AUG", Month::August),
    ("SEP", Month::September),
    ("OCT", Month::October),
    ("NOV", Month::November),
    ("DEC", Month::December),
];

impl FromStr for PeriodFrequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let invalid = || ValidationError::InvalidFrequency {
            value: value.to_owned(),
        };

        match normalized.split_once('-') {
            None if normalized == "YE" => Ok(Self::CALENDAR_YEAR),
            Some(("YE", month)) => MONTH_ABBREVIATIONS
                .iter()
                .find(|(abbreviation, _)| *abbreviation == month)
                .map(|(_, month)| Self::year_ending(*month))
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

impl Display for PeriodFrequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let abbreviation = MONTH_ABBREVIATIONS
            .iter()
            .find(|(_, month)| *month == self.month)
            .map_or("DEC", |(abbreviation, _)| abbreviation);
        write!(f, "YE-{abbreviation}")
    }
}

/// End date of the most recent full period before the dataset was last updated.
///
/// `dataUpdatedAt` values with an offset are read as New York wall-clock time.
pub fn last_complete_period_end(
    metadata: &DatasetMetadata,
    frequency: PeriodFrequency,
) -> Result<Date, TransformError> {
    let raw = metadata
        .data_updated_at()
        .ok_or(TransformError::MissingDataUpdatedAt)?;
    let parsed = ParsedTimestamp::parse(raw).ok_or_else(|| ValidationError::InvalidTimestamp {
        value: raw.to_owned(),
    })?;

    let wall_clock = match parsed {
        ParsedTimestamp::Offset(value) => new_york_wall_clock(value)?,
        ParsedTimestamp::Naive(value) => value,
    };

    frequency.last_end_before(wall_clock)
}

fn new_york_wall_clock(value: OffsetDateTime) -> Result<PrimitiveDateTime, TransformError> {
    let utc = chrono::Utc
        .timestamp_opt(value.unix_timestamp(), 0)
        .single()
        .ok_or(TransformError::DateOutOfRange)?;
    let offset_seconds = New_York
        .offset_from_utc_datetime(&utc.naive_utc())
        .fix()
        .local_minus_utc();
    let offset =
        UtcOffset::from_whole_seconds(offset_seconds).map_err(|_| TransformError::DateOutOfRange)?;
    let local = value.to_offset(offset);
    Ok(PrimitiveDateTime::new(local.date(), local.time()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn metadata(updated_at: &str) -> DatasetMetadata {
        DatasetMetadata::new(json!({ "dataUpdatedAt": updated_at }))
    }

    #[test]
    fn parses_year_end_aliases() {
        assert_eq!("YE".parse(), Ok(PeriodFrequency::CALENDAR_YEAR));
        assert_eq!("ye-jun".parse(), Ok(PeriodFrequency::FISCAL_YEAR));
        assert!("QE".parse::<PeriodFrequency>().is_err());
        assert!("YE-XYZ".parse::<PeriodFrequency>().is_err());
        assert_eq!(PeriodFrequency::FISCAL_YEAR.to_string(), "YE-JUN");
    }

    #[test]
    fn calendar_year_rolls_back_to_previous_december() {
        let end = last_complete_period_end(&metadata("2024-05-01T12:00:00.000Z"), PeriodFrequency::CALENDAR_YEAR)
            .expect("period end");
        assert_eq!(end, date!(2023 - 12 - 31));
    }

    #[test]
    fn fiscal_year_uses_current_june_once_past_it() {
        let end = last_complete_period_end(&metadata("2024-08-15T12:00:00Z"), PeriodFrequency::FISCAL_YEAR)
            .expect("period end");
        assert_eq!(end, date!(2024 - 06 - 30));

        let end = last_complete_period_end(&metadata("2024-03-15T12:00:00Z"), PeriodFrequency::FISCAL_YEAR)
            .expect("period end");
        assert_eq!(end, date!(2023 - 06 - 30));
    }

    #[test]
    fn period_end_containing_rolls_forward() {
        let fiscal = PeriodFrequency::FISCAL_YEAR;
        assert_eq!(
            fiscal.period_end_containing(date!(2023 - 07 - 01)),
            Ok(date!(2024 - 06 - 30))
        );
        assert_eq!(
            fiscal.period_end_containing(date!(2024 - 06 - 01)),
            Ok(date!(2024 - 06 - 30))
        );
        assert_eq!(
            fiscal.period_end_containing(date!(2024 - 06 - 30)),
            Ok(date!(2024 - 06 - 30))
        );
        assert_eq!(
            PeriodFrequency::CALENDAR_YEAR.period_end_containing(date!(2024 - 02 - 29)),
            Ok(date!(2024 - 12 - 31))
        );
    }

    #[test]
    fn moment_on_period_end_rolls_back_a_full_period() {
        let end = last_complete_period_end(&metadata("2024-06-30T12:00:00"), PeriodFrequency::FISCAL_YEAR)
            .expect("period end");
        assert_eq!(end, date!(2023 - 06 - 30));
    }

    #[test]
    fn utc_instant_is_read_in_new_york_time() {
        // 03:00 UTC on Jan 1 is still Dec 31 in New York.
        let end = last_complete_period_end(&metadata("2024-01-01T03:00:00Z"), PeriodFrequency::CALENDAR_YEAR)
            .expect("period end");
        assert_eq!(end, date!(2022 - 12 - 31));
    }

    #[test]
    fn missing_or_bad_timestamp_is_an_error() {
        let missing = DatasetMetadata::new(json!({}));
        assert_eq!(
            last_complete_period_end(&missing, PeriodFrequency::CALENDAR_YEAR),
            Err(TransformError::MissingDataUpdatedAt)
        );
        assert!(matches!(
            last_complete_period_end(&metadata("yesterday"), PeriodFrequency::CALENDAR_YEAR),
            Err(TransformError::Validation(ValidationError::InvalidTimestamp { .. }))
        ));
    }
}
