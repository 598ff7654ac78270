//! Columnar table built from schema-less JSON records.
//!
//! Column order follows first appearance across the records, and a key
//! missing from a record becomes [`Cell::Null`] in that row.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::{UtcDateTime, ValidationError};

/// One record as delivered by the provider.
pub type RawRecord = Map<String, Value>;

/// Ordered records as delivered by the provider.
pub type RawRows = Vec<RawRecord>;

/// A single table value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Number(f64),
    Timestamp(UtcDateTime),
    /// Untouched provider value.
    Value(Value),
}

impl Cell {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Value(other.clone()),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric reading of the cell; numeric strings count, anything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Value(value) => crate::coerce::parse_number(value),
            Self::Null | Self::Timestamp(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(Value::String(value)) => Some(value),
            _ => None,
        }
    }

    pub const fn as_timestamp(&self) -> Option<UtcDateTime> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Number(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Timestamp(value) => Value::String(value.format_rfc3339()),
            Self::Value(value) => value.clone(),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Timestamp(value) => write!(f, "{value}"),
            Self::Value(Value::String(value)) => f.write_str(value),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// How a column's cells were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Untyped,
    Number,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn untyped(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self::new(name, ColumnKind::Untyped, cells)
    }

    pub fn numbers(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let cells = values
            .into_iter()
            .map(|value| value.map_or(Cell::Null, Cell::Number))
            .collect();
        Self::new(name, ColumnKind::Number, cells)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Numeric readings of every cell, see [`Cell::as_f64`].
    pub fn to_f64s(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }

    pub(crate) fn into_cells(self) -> Vec<Cell> {
        self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an untyped table, one column per distinct key.
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let cells = records
                    .iter()
                    .map(|record| record.get(name).map_or(Cell::Null, Cell::from_json))
                    .collect();
                Column::untyped(name, cells)
            })
            .collect();

        Self {
            columns,
            row_count: records.len(),
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ValidationError> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != row_count {
                return Err(ValidationError::ColumnLength {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ValidationError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self { columns, row_count })
    }

    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    pub const fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .filter_map(|column| column.get(index))
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count).filter_map(move |index| self.row(index))
    }

    /// The last `n` rows, used when logging rejected data.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.row_count.saturating_sub(n);
        let columns = self
            .columns
            .iter()
            .map(|column| Column::new(column.name.clone(), column.kind, column.cells[start..].to_vec()))
            .collect();
        Self {
            columns,
            row_count: self.row_count - start,
        }
    }

    pub fn to_records(&self) -> RawRows {
        self.rows()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn map_columns<F>(self, mut convert: F) -> Self
    where
        F: FnMut(Column) -> Column,
    {
        Self {
            columns: self.columns.into_iter().map(&mut convert).collect(),
            row_count: self.row_count,
        }
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_records().serialize(serializer)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.column_names().join("\t"))?;
        for row in self.rows() {
            let rendered = row.iter().map(ToString::to_string).collect::<Vec<_>>();
            writeln!(f, "{}", rendered.join("\t"))?;
        }
        Ok(())
    }
}
