use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSpecDto {
    pub name: String,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub max_deceleration: f64,
    pub length: f64,
    pub width: f64,
}
