use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::ValidationError;

const NAIVE_DATETIME_FORMATS: [&[BorrowedFormatItem<'static>]; 4] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
];

// Offsets RFC3339 does not accept: `+0000` and `-05`.
const OFFSET_DATETIME_FORMATS: [&[BorrowedFormatItem<'static>]; 4] = [
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory][offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]"
    ),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]"),
];

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A calendar timestamp as written by the provider, before zone handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    /// Carried an explicit offset (`fixed_timestamp`, or RFC3339 in general).
    Offset(OffsetDateTime),
    /// Wall-clock time with no zone (`floating_timestamp`).
    Naive(PrimitiveDateTime),
}

impl ParsedTimestamp {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(parsed) = OffsetDateTime::parse(input, &Rfc3339).ok().or_else(|| {
            OFFSET_DATETIME_FORMATS
                .iter()
                .find_map(|format| OffsetDateTime::parse(input, *format).ok())
        }) {
            return Some(Self::Offset(parsed));
        }

        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| PrimitiveDateTime::parse(input, *format).ok())
            .or_else(|| {
                Date::parse(input, DATE_FORMAT)
                    .ok()
                    .map(|date| date.midnight())
            })
            .map(Self::Naive)
    }

    /// Offset timestamps are converted to UTC, naive ones are taken as UTC.
    pub fn to_utc(self) -> UtcDateTime {
        match self {
            Self::Offset(value) => UtcDateTime(value.to_offset(UtcOffset::UTC)),
            Self::Naive(value) => UtcDateTime(value.assume_utc()),
        }
    }
}

/// Instant normalised to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        ParsedTimestamp::parse(input)
            .map(ParsedTimestamp::to_utc)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            })
    }

    pub fn format_rfc3339(self) -> String {
        self.0.format(&Rfc3339).unwrap_or_else(|_| self.0.to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
