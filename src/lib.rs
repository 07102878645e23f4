use crate::api::scenario_dto::ScenarioDto;
use crate::domain::simulator::admission::IntersectionSimulator;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario file and builds the admission pipeline with all proposals enqueued.
///
/// Does not install a logger; call [`logger::init`] first to see the construction log.
pub fn generate_scenario(file_path: &str) -> Result<IntersectionSimulator> {
    log::info!("Loading scenario from '{}'.", file_path);

    let scenario_dto: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("JSON file parsed successfully.");

    let simulator = IntersectionSimulator::from_scenario(scenario_dto)?;
    log::info!("Intersection model constructed successfully.");

    Ok(simulator)
}
