//! Request and result shapes for [`crate::OpenDataClient::extract`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{RawRows, Table};
use crate::Collection;

/// Query used when the caller does not supply one. The provider still caps it.
pub const DEFAULT_QUERY: &str = "SELECT * LIMIT 1000000";

/// Parameters for one extract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub dataset_id: String,
    pub query: String,
    pub collection: Collection,
    /// Coerce column types from the response hints.
    pub parse: bool,
    /// Also fetch the catalog metadata.
    pub include_metadata: bool,
}

impl ExtractRequest {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            query: String::from(DEFAULT_QUERY),
            collection: Collection::City,
            parse: true,
            include_metadata: false,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_parse(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }
}

/// Catalog metadata as returned by the provider, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetMetadata(Value);

impl DatasetMetadata {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `dataUpdatedAt` timestamp string, when present.
    pub fn data_updated_at(&self) -> Option<&str> {
        self.0.get("dataUpdatedAt").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Data paired with its catalog metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset<T> {
    pub data: T,
    pub metadata: DatasetMetadata,
}

/// Output of an extract call, shaped by `parse` and `include_metadata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractResult {
    Table(Table),
    Raw(RawRows),
    TableWithMetadata(Dataset<Table>),
    RawWithMetadata(Dataset<RawRows>),
}

impl ExtractResult {
    pub fn table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::TableWithMetadata(dataset) => Some(&dataset.data),
            Self::Raw(_) | Self::RawWithMetadata(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&RawRows> {
        match self {
            Self::Raw(rows) => Some(rows),
            Self::RawWithMetadata(dataset) => Some(&dataset.data),
            Self::Table(_) | Self::TableWithMetadata(_) => None,
        }
    }

    pub fn metadata(&self) -> Option<&DatasetMetadata> {
        match self {
            Self::TableWithMetadata(dataset) => Some(&dataset.metadata),
            Self::RawWithMetadata(dataset) => Some(&dataset.metadata),
            Self::Table(_) | Self::Raw(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::TableWithMetadata(dataset) => Some(dataset.data),
            Self::Raw(_) | Self::RawWithMetadata(_) => None,
        }
    }

    /// Splits a parsed result into table and metadata.
    pub fn into_table_with_metadata(self) -> Option<Dataset<Table>> {
        match self {
            Self::TableWithMetadata(dataset) => Some(dataset),
            _ => None,
        }
    }

    /// Attaches metadata, replacing any already present.
    pub fn with_metadata(self, metadata: DatasetMetadata) -> Self {
        match self {
            Self::Table(data) | Self::TableWithMetadata(Dataset { data, .. }) => {
                Self::TableWithMetadata(Dataset { data, metadata })
            }
            Self::Raw(data) | Self::RawWithMetadata(Dataset { data, .. }) => {
                Self::RawWithMetadata(Dataset { data, metadata })
            }
        }
    }

    /// Row count regardless of shape.
    pub fn row_count(&self) -> usize {
        self.table()
            .map(Table::row_count)
            .or_else(|| self.raw().map(Vec::len))
            .unwrap_or(0)
    }
}
