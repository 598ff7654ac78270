//! Summary output: CSV tables and GeoJSON point layers.

use std::fs;
use std::io;
use std::path::Path;

use civicdash_core::Table;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Columns holding a row's WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointColumns<'a> {
    pub longitude: &'a str,
    pub latitude: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

fn create_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes `table` as CSV with a header row, creating parent directories.
///
/// Null cells are written as empty fields; whole numbers are written without
/// a fractional part.
pub fn write_csv(table: &Table, path: &Path) -> Result<(), PipelineError> {
    create_parent(path)?;

    let csv_error = |source: csv::Error| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    write_table(&mut writer, table).map_err(csv_error)?;
    writer
        .flush()
        .map_err(|source| csv_error(csv::Error::from(source)))
}

/// Renders `table` as CSV text.
pub fn to_csv_string(table: &Table) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_table(&mut writer, table)?;
    let bytes = writer
        .into_inner()
        .map_err(|error| csv::Error::from(io::Error::other(error.to_string())))?;
    String::from_utf8(bytes).map_err(|error| csv::Error::from(io::Error::other(error)))
}

/// One point feature per row. The coordinate columns become the geometry and
/// every other column a property; a row without both coordinates gets a null
/// geometry.
pub fn to_feature_collection(table: &Table, points: PointColumns<'_>) -> FeatureCollection {
    let features = table
        .rows()
        .map(|row| {
            let mut longitude = None;
            let mut latitude = None;
            let mut properties = Map::new();
            for (column, cell) in table.columns().iter().zip(row) {
                if column.name() == points.longitude {
                    longitude = cell.as_f64();
                } else if column.name() == points.latitude {
                    latitude = cell.as_f64();
                } else {
                    properties.insert(column.name().to_owned(), cell.to_json());
                }
            }
            let geometry = longitude
                .zip(latitude)
                .map(|(longitude, latitude)| Geometry::Point {
                    coordinates: [longitude, latitude],
                });
            Feature {
                properties,
                geometry,
            }
        })
        .collect();
    FeatureCollection { features }
}

/// Writes `table` as a GeoJSON `FeatureCollection`, creating parent
/// directories. Returns the number of features written.
pub fn write_geojson(
    table: &Table,
    points: PointColumns<'_>,
    path: &Path,
) -> Result<usize, PipelineError> {
    create_parent(path)?;
    let collection = to_feature_collection(table, points);
    let body = serde_json::to_vec(&collection).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(collection.features.len())
}

fn write_table<W: io::Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<(), csv::Error> {
    if table.columns().is_empty() {
        return Ok(());
    }
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    Ok(())
}
