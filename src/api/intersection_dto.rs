use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionDto {
    /// Side length of the square controlled area in meters.
    pub size: f64,
    pub lanes_per_road: usize,
    pub lane_width: f64,
}
