use crate::api::config_dto::{PlanCacheModeDto, ReservationGridConfigDto};
use crate::domain::intersection::tiled_area::Tile;
use crate::error::{Error, Result};

const STEP_EPSILON: f64 = 1e-9;

/// How a cached template is turned into a plan for a concrete query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanCacheMode {
    /// Re-drive the test vehicle, reading tile occupancy from the template's frames.
    #[default]
    FrameReplay,

    /// Rescale the template's timing to the arrival velocity without simulating.
    Rescale,
}

impl From<PlanCacheModeDto> for PlanCacheMode {
    fn from(dto: PlanCacheModeDto) -> Self {
        match dto {
            PlanCacheModeDto::FrameReplay => PlanCacheMode::FrameReplay,
            PlanCacheModeDto::Rescale => PlanCacheMode::Rescale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationGridConfig {
    /// Simulation time step in seconds.
    pub time_step: f64,

    /// Width of one discrete step of the reservation grid in seconds.
    pub grid_time_step: f64,

    /// Margin in meters added around the vehicle before mapping it to tiles.
    pub static_buffer_size: f64,

    /// Time buffer in seconds around reservations of internal tiles.
    pub internal_tile_time_buffer_size: f64,

    /// Time buffer in seconds around reservations of edge tiles.
    pub edge_tile_time_buffer_size: f64,

    pub is_edge_tile_time_buffer_enabled: bool,

    /// Tiles per meter; the tile side is `1 / granularity`.
    pub granularity: f64,

    pub plan_cache_mode: PlanCacheMode,
}

impl ReservationGridConfig {
    pub fn from_dto(dto: &ReservationGridConfigDto) -> Result<Self> {
        let config = ReservationGridConfig {
            time_step: dto.time_step,
            grid_time_step: dto.grid_time_step,
            static_buffer_size: dto.static_buffer_size,
            internal_tile_time_buffer_size: dto.internal_tile_time_buffer_size,
            edge_tile_time_buffer_size: dto.edge_tile_time_buffer_size,
            is_edge_tile_time_buffer_enabled: dto.is_edge_tile_time_buffer_enabled,
            granularity: dto.granularity,
            plan_cache_mode: dto.plan_cache_mode.into(),
        };
        config.validate()?;

        return Ok(config);
    }

    /// Rejects configurations the grid cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [("timeStep", self.time_step), ("gridTimeStep", self.grid_time_step), ("granularity", self.granularity)];
        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(Error::InvalidConfiguration(format!("{} must be positive, got {}", field, value)));
            }
        }

        let non_negative = [
            ("staticBufferSize", self.static_buffer_size),
            ("internalTileTimeBufferSize", self.internal_tile_time_buffer_size),
            ("edgeTileTimeBufferSize", self.edge_tile_time_buffer_size),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(Error::InvalidConfiguration(format!("{} must not be negative, got {}", field, value)));
            }
        }

        return Ok(());
    }

    pub fn internal_tile_time_buffer_steps(&self) -> i64 {
        (self.internal_tile_time_buffer_size / self.grid_time_step + STEP_EPSILON).floor() as i64
    }

    pub fn edge_tile_time_buffer_steps(&self) -> i64 {
        (self.edge_tile_time_buffer_size / self.grid_time_step + STEP_EPSILON).floor() as i64
    }

    pub fn tile_length(&self) -> f64 {
        1.0 / self.granularity
    }

    pub fn tile_time_buffer(&self) -> TileTimeBuffer {
        TileTimeBuffer {
            internal_steps: self.internal_tile_time_buffer_steps(),
            edge_steps: self.edge_tile_time_buffer_steps(),
            is_edge_enabled: self.is_edge_tile_time_buffer_enabled,
        }
    }
}

/// Temporal slack, in grid steps, reserved around each occupied tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileTimeBuffer {
    pub internal_steps: i64,
    pub edge_steps: i64,
    pub is_edge_enabled: bool,
}

impl TileTimeBuffer {
    pub fn steps_for(&self, tile: &Tile) -> i64 {
        if self.is_edge_enabled && tile.is_edge_tile {
            return self.edge_steps;
        }

        return self.internal_steps;
    }
}
