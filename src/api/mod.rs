pub mod config_dto;
pub mod intersection_dto;
pub mod proposal_dto;
pub mod scenario_dto;
pub mod vehicle_spec_dto;
