//! # Civicdash Pipelines
//!
//! Dashboard summary pipelines on top of [`civicdash_core`]. Each pipeline
//! extracts one dataset, reduces it to a small summary table, checks the
//! summary is plausible and saves it as CSV (or GeoJSON for point layers)
//! under the output directory (`Data/Summary Data` by default).
//!
//! | Pipeline | Dataset | Summary |
//! |----------|---------|---------|
//! | `ev_fleet_count` | city `rbed-zzin` | Electric vehicles in the city fleet per fiscal year |
//! | `electric_vehicles_registered` | state `w4pv-hbkt` | Registered vehicles by fuel group with shares |
//! | `organics_collection_buildings` | city `tiyn-ajjm` | Buildings and schools with organics collection |
//! | `ev_fleet_station_network` | city `fc53-9hrv` | Fleet charger locations (GeoJSON) |
//! | `bicycle_lane_miles` | city `rbed-zzin` | Protected and unprotected lane miles per fiscal year (`YE-JUN`) |
//! | `diversion_rate` | city `ebb7-mvp5` | Diversion rate per fiscal year (`YE-JUN`) and borough |
//!
//! [`run_pipelines`] runs any subset in order and never stops early.

pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod pipelines;

pub use error::PipelineError;
pub use orchestrator::{run_pipelines, PipelineReport, PipelineStatus, RunReport};
pub use output::{to_csv_string, to_feature_collection, write_csv, write_geojson, PointColumns};
pub use pipeline::{Pipeline, PipelineContext, PipelineOutcome, DEFAULT_OUTPUT_DIR};
