//! Charging stations of the city fleet as a GeoJSON point layer.

use std::future::Future;
use std::pin::Pin;

use civicdash_core::{ExtractRequest, Table};
use tracing::info;

use crate::error::PipelineError;
use crate::output::{write_geojson, PointColumns};
use crate::pipeline::{reject, required_column, Pipeline, PipelineContext, PipelineOutcome};

const DATASET_ID: &str = "fc53-9hrv";

const QUERY: &str = "
SELECT
    agency,
    street,
    station_name,
    borough,
    community_district,
    type_of_charger,
    latitude,
    longitude
WHERE latitude IS NOT NULL
LIMIT 1000000
";

const POINTS: PointColumns<'static> = PointColumns {
    longitude: "longitude",
    latitude: "latitude",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct EvFleetStationNetwork;

impl Pipeline for EvFleetStationNetwork {
    fn name(&self) -> &'static str {
        "ev_fleet_station_network"
    }

    fn dataset_id(&self) -> &'static str {
        DATASET_ID
    }

    fn run<'a>(
        &'a self,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineOutcome, PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let request = ExtractRequest::new(DATASET_ID).with_query(QUERY);
            let chargers = ctx
                .client()
                .extract(&request)
                .await?
                .into_table()
                .ok_or(PipelineError::UnexpectedShape {
                    dataset: DATASET_ID,
                })?;

            if let Some(reason) = check(&chargers) {
                return Ok(reject(self.name(), reason, &chargers));
            }
            required_column(&chargers, DATASET_ID, POINTS.longitude)?;
            required_column(&chargers, DATASET_ID, POINTS.latitude)?;

            let path = ctx.output_path(self.name(), "geojson");
            let features = write_geojson(&chargers, POINTS, &path)?;
            info!(pipeline = self.name(), path = %path.display(), features, "saved charger layer");
            Ok(PipelineOutcome::Written {
                files: vec![path],
                rows: features,
            })
        })
    }
}

/// At least one charger must come back.
fn check(chargers: &Table) -> Option<String> {
    chargers
        .is_empty()
        .then(|| String::from("no chargers with a location were returned"))
}
