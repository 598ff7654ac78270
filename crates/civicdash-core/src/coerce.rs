//! Schema-on-read coercion driven by the provider's type-hint headers.
//!
//! The data response names its columns in `X-SODA2-Fields` and their types in
//! `X-Soda2-Types`, both JSON arrays in matching order. Coercion never fails:
//! missing hints give an untyped table and unparsable cells become
//! [`Cell::Null`].

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::http_client::ResponseHeaders;
use crate::table::{Cell, Column, ColumnKind, RawRecord, Table};
use crate::timestamp::ParsedTimestamp;
use crate::UtcDateTime;

pub const FIELDS_HEADER: &str = "X-SODA2-Fields";
pub const TYPES_HEADER: &str = "X-Soda2-Types";

/// Provider-declared column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Number,
    /// Wall-clock timestamp without an offset.
    FloatingTimestamp,
    /// Timestamp with an explicit offset.
    FixedTimestamp,
    /// Any other tag (`text`, `point`, `checkbox`, ...); values pass through.
    Other(String),
}

impl ColumnType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "number" => Self::Number,
            "floating_timestamp" => Self::FloatingTimestamp,
            "fixed_timestamp" => Self::FixedTimestamp,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Column name to declared type, zipped from the two hint headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHints(BTreeMap<String, ColumnType>);

impl TypeHints {
    /// Returns `None` when the headers are absent, either hint field is
    /// missing or empty, or a field is not a JSON array of strings.
    pub fn from_headers(headers: Option<&ResponseHeaders>) -> Option<Self> {
        let headers = headers?;
        let fields = header_list(headers, FIELDS_HEADER)?;
        let types = header_list(headers, TYPES_HEADER)?;
        Some(Self::from_pairs(fields, types))
    }

    /// Zips positionally; surplus entries on either side are dropped.
    pub fn from_pairs<F, T>(fields: F, types: T) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self(
            fields
                .into_iter()
                .zip(types)
                .map(|(field, tag)| (field.into(), ColumnType::from_tag(tag.as_ref())))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&ColumnType> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn header_list(headers: &ResponseHeaders, name: &str) -> Option<Vec<String>> {
    let raw = headers.get(&name.to_ascii_lowercase())?;
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<Vec<String>>(raw).ok()
}

/// Turns raw records into a table, typing columns from the response headers.
pub fn coerce_rows(rows: &[RawRecord], headers: Option<&ResponseHeaders>) -> Table {
    let Some(hints) = TypeHints::from_headers(headers) else {
        warn!("no data types returned in response; not converting types");
        return Table::from_records(rows);
    };

    if rows.is_empty() {
        warn!("no data");
        return Table::empty();
    }

    apply_hints(Table::from_records(rows), &hints)
}

/// Coerces every hinted column; unhinted columns are left as they are.
pub fn apply_hints(table: Table, hints: &TypeHints) -> Table {
    table.map_columns(|column| match hints.get(column.name()) {
        Some(ColumnType::Number) => convert(column, ColumnKind::Number, |cell| {
            cell_number(cell).map_or(Cell::Null, Cell::Number)
        }),
        Some(ColumnType::FloatingTimestamp | ColumnType::FixedTimestamp) => {
            convert(column, ColumnKind::Timestamp, |cell| {
                cell_timestamp(cell).map_or(Cell::Null, Cell::Timestamp)
            })
        }
        Some(ColumnType::Other(_)) | None => column,
    })
}

fn convert<F>(column: Column, kind: ColumnKind, convert_cell: F) -> Column
where
    F: Fn(&Cell) -> Cell,
{
    let name = column.name().to_owned();
    let cells = column
        .into_cells()
        .iter()
        .map(convert_cell)
        .collect::<Vec<_>>();
    Column::new(name, kind, cells)
}

fn cell_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Value(value) => parse_number(value),
        Cell::Number(value) => Some(*value),
        Cell::Null | Cell::Timestamp(_) => None,
    }
}

fn cell_timestamp(cell: &Cell) -> Option<UtcDateTime> {
    match cell {
        Cell::Value(value) => parse_timestamp(value),
        Cell::Timestamp(value) => Some(*value),
        Cell::Null | Cell::Number(_) => None,
    }
}

/// Best-effort numeric reading: JSON numbers and numeric strings.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Best-effort timestamp reading, normalised to UTC.
pub fn parse_timestamp(value: &Value) -> Option<UtcDateTime> {
    match value {
        Value::String(text) => ParsedTimestamp::parse(text).map(ParsedTimestamp::to_utc),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<RawRecord> {
        serde_json::from_value(value).expect("records must deserialize")
    }

    fn headers(fields: &str, types: &str) -> ResponseHeaders {
        ResponseHeaders::from([
            (String::from("x-soda2-fields"), fields.to_owned()),
            (String::from("x-soda2-types"), types.to_owned()),
        ])
    }

    #[test]
    fn numeric_column_parses_with_nulls_for_bad_values() {
        let rows = rows(json!([{"n": "1"}, {"n": "2"}, {"n": "bad"}]));
        let table = coerce_rows(&rows, Some(&headers(r#"["n"]"#, r#"["number"]"#)));

        let column = table.column("n").expect("column n");
        assert_eq!(column.kind(), ColumnKind::Number);
        assert_eq!(
            column.cells(),
            &[Cell::Number(1.0), Cell::Number(2.0), Cell::Null]
        );
    }

    #[test]
    fn timestamp_columns_normalise_to_utc() {
        let rows = rows(json!([
            {"floating": "2024-01-02T03:04:05.000", "fixed": "2024-01-02T03:04:05.000-05:00"},
            {"floating": "garbage", "fixed": "2024-13-45"}
        ]));
        let table = coerce_rows(
            &rows,
            Some(&headers(
                r#"["floating","fixed"]"#,
                r#"["floating_timestamp","fixed_timestamp"]"#,
            )),
        );

        let floating = table.column("floating").expect("floating column");
        assert_eq!(
            floating.get(0).and_then(Cell::as_timestamp).map(|ts| ts.to_string()),
            Some(String::from("2024-01-02T03:04:05Z"))
        );
        assert_eq!(floating.get(1), Some(&Cell::Null));

        let fixed = table.column("fixed").expect("fixed column");
        assert_eq!(
            fixed.get(0).and_then(Cell::as_timestamp).map(|ts| ts.to_string()),
            Some(String::from("2024-01-02T08:04:05Z"))
        );
        assert_eq!(fixed.get(1), Some(&Cell::Null));
    }

    #[test]
    fn unknown_tags_and_unhinted_columns_pass_through() {
        let rows = rows(json!([{"name": "x", "extra": 7, "loc": {"type": "Point"}}]));
        let table = coerce_rows(&rows, Some(&headers(r#"["name","loc","missing"]"#, r#"["text","point","number"]"#)));

        assert_eq!(table, Table::from_records(&rows));
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn no_headers_returns_untyped_table() {
        let rows = rows(json!([{"n": "1"}]));
        let table = coerce_rows(&rows, None);
        assert_eq!(table, Table::from_records(&rows));
        assert_eq!(table.column("n").map(Column::kind), Some(ColumnKind::Untyped));
    }

    #[test]
    fn one_missing_hint_field_returns_untyped_table() {
        let rows = rows(json!([{"n": "1"}]));
        let only_fields = ResponseHeaders::from([(
            String::from("x-soda2-fields"),
            String::from(r#"["n"]"#),
        )]);
        assert_eq!(coerce_rows(&rows, Some(&only_fields)), Table::from_records(&rows));
    }

    #[test]
    fn malformed_hint_header_degrades_to_untyped() {
        let rows = rows(json!([{"n": "1"}]));
        let table = coerce_rows(&rows, Some(&headers("not json", r#"["number"]"#)));
        assert_eq!(table, Table::from_records(&rows));
    }

    #[test]
    fn empty_rows_short_circuit_to_empty_table() {
        let table = coerce_rows(&[], Some(&headers(r#"["n"]"#, r#"["number"]"#)));
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn hints_zip_positionally() {
        let hints = TypeHints::from_pairs(["a", "b", "c"], ["number", "text"]);
        assert_eq!(hints.len(), 2);
        assert_eq!(hints.get("a"), Some(&ColumnType::Number));
        assert_eq!(hints.get("b"), Some(&ColumnType::Other(String::from("text"))));
        assert_eq!(hints.get("c"), None);
    }

    #[test]
    fn parse_number_accepts_json_numbers_and_numeric_strings() {
        assert_eq!(parse_number(&json!(3)), Some(3.0));
        assert_eq!(parse_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!([1])), None);
    }
}
