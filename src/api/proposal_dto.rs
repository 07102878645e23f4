use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDto {
    pub vin: u32,
    pub vehicle_spec: String,
    pub arrival_lane: u32,
    pub departure_lane: u32,
    pub arrival_time: f64,
    pub arrival_velocity: f64,
    #[serde(default)]
    pub accelerating: bool,

    /// Drawn from a random wallet when absent.
    #[serde(default)]
    pub bid: Option<f64>,
}
