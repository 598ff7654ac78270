use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Open data catalogs the extract layer can query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// NYC Open Data.
    #[default]
    City,
    /// NYS Open Data (data.ny.gov).
    State,
}

impl Collection {
    pub const ALL: [Self; 2] = [Self::City, Self::State];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::State => "state",
        }
    }

    pub const fn base_url(self) -> &'static str {
        match self {
            Self::City => "https://data.cityofnewyork.us/",
            Self::State => "https://data.ny.gov/",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "city" => Ok(Self::City),
            "state" => Ok(Self::State),
            other => Err(ValidationError::InvalidCollection {
                value: other.to_owned(),
            }),
        }
    }
}

/// Row-query and catalog-metadata URLs for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDataUrls {
    pub data_url: String,
    pub metadata_url: String,
}

impl OpenDataUrls {
    pub fn new(dataset_id: &str, collection: Collection) -> Self {
        let base = collection.base_url();
        Self {
            data_url: format!("{base}resource/{dataset_id}.json"),
            metadata_url: format!("{base}api/views/metadata/v1/{dataset_id}"),
        }
    }
}
