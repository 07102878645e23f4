use serde::{Deserialize, Serialize};

use crate::api::config_dto::{BatchConfigDto, ReservationGridConfigDto};
use crate::api::intersection_dto::IntersectionDto;
use crate::api::proposal_dto::ProposalDto;
use crate::api::vehicle_spec_dto::VehicleSpecDto;

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub reservation_grid: ReservationGridConfigDto,
    #[serde(default)]
    pub batch: BatchConfigDto,
    pub intersection: IntersectionDto,
    pub vehicle_specs: Vec<VehicleSpecDto>,
    #[serde(default)]
    pub proposals: Vec<ProposalDto>,
}
