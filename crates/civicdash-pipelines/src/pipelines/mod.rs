//! Built-in dashboard pipelines.

mod bicycle_lane_miles;
mod diversion_rate;
mod electric_vehicles_registered;
mod ev_fleet_count;
mod ev_fleet_station_network;
mod organics_collection_buildings;

pub use bicycle_lane_miles::BicycleLaneMiles;
pub use diversion_rate::DiversionRate;
pub use electric_vehicles_registered::ElectricVehiclesRegistered;
pub use ev_fleet_count::EvFleetCount;
pub use ev_fleet_station_network::EvFleetStationNetwork;
pub use organics_collection_buildings::OrganicsCollectionBuildings;

use crate::error::PipelineError;
use crate::pipeline::Pipeline;

/// Every built-in pipeline, in run order.
pub fn all() -> Vec<Box<dyn Pipeline>> {
    vec![
        Box::new(EvFleetCount),
        Box::new(ElectricVehiclesRegistered),
        Box::new(OrganicsCollectionBuildings),
        Box::new(EvFleetStationNetwork),
        Box::new(BicycleLaneMiles),
        Box::new(DiversionRate),
    ]
}

pub fn names() -> Vec<&'static str> {
    all().iter().map(|pipeline| pipeline.name()).collect()
}

/// Looks up built-in pipelines by name, keeping the caller's order.
pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Vec<Box<dyn Pipeline>>, PipelineError> {
    if names.is_empty() {
        return Ok(all());
    }

    names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            all()
                .into_iter()
                .find(|pipeline| pipeline.name() == name)
                .ok_or_else(|| PipelineError::UnknownPipeline {
                    name: name.to_owned(),
                })
        })
        .collect()
}
