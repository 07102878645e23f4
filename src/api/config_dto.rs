use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlanCacheModeDto {
    #[default]
    FrameReplay,
    Rescale,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationGridConfigDto {
    pub time_step: f64,
    pub grid_time_step: f64,
    pub static_buffer_size: f64,
    pub internal_tile_time_buffer_size: f64,
    pub edge_tile_time_buffer_size: f64,
    pub is_edge_tile_time_buffer_enabled: bool,
    pub granularity: f64,
    #[serde(default)]
    pub plan_cache_mode: PlanCacheModeDto,
}

fn default_processing_interval() -> f64 {
    2.0
}

fn default_lookahead_time() -> f64 {
    3.0
}

fn default_comp_comm_delay() -> f64 {
    0.05
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfigDto {
    #[serde(default = "default_processing_interval")]
    pub processing_interval: f64,
    #[serde(default = "default_lookahead_time")]
    pub lookahead_time: f64,

    /// Defaults to the processing interval.
    #[serde(default)]
    pub batch_interval: Option<f64>,
    #[serde(default = "default_comp_comm_delay")]
    pub comp_comm_delay: f64,
}

impl Default for BatchConfigDto {
    fn default() -> Self {
        BatchConfigDto {
            processing_interval: default_processing_interval(),
            lookahead_time: default_lookahead_time(),
            batch_interval: None,
            comp_comm_delay: default_comp_comm_delay(),
        }
    }
}
