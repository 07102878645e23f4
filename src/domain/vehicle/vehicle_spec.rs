use crate::api::vehicle_spec_dto::VehicleSpecDto;
use crate::error::{Error, Result};

/// Kinematic description of a vehicle class.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSpec {
    pub name: String,

    /// Maximum velocity in m/s.
    pub max_velocity: f64,

    /// Maximum acceleration in m/s².
    pub max_acceleration: f64,

    /// Maximum deceleration in m/s², stored as a positive number.
    pub max_deceleration: f64,

    pub length: f64,
    pub width: f64,
}

impl VehicleSpec {
    pub fn new(name: impl Into<String>, max_velocity: f64, max_acceleration: f64, max_deceleration: f64, length: f64, width: f64) -> Self {
        VehicleSpec { name: name.into(), max_velocity, max_acceleration, max_deceleration, length, width }
    }

    pub fn from_dto(dto: &VehicleSpecDto) -> Result<Self> {
        let spec = VehicleSpec::new(dto.name.clone(), dto.max_velocity, dto.max_acceleration, dto.max_deceleration, dto.length, dto.width);
        spec.validate()?;

        return Ok(spec);
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("maxVelocity", self.max_velocity),
            ("maxAcceleration", self.max_acceleration),
            ("length", self.length),
            ("width", self.width),
        ];

        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(Error::ModelConstructionError(format!("Vehicle spec '{}': {} must be positive, got {}", self.name, field, value)));
            }
        }

        if self.max_deceleration < 0.0 {
            return Err(Error::ModelConstructionError(format!(
                "Vehicle spec '{}': maxDeceleration must not be negative, got {}",
                self.name, self.max_deceleration
            )));
        }

        return Ok(());
    }

    /// Minimum time to cover `dist` meters starting at `vel`, accelerating at the
    /// maximum rate until `max_vel` is reached and cruising afterwards.
    pub fn min_reach_time(&self, vel: f64, dist: f64, max_vel: f64) -> f64 {
        if dist <= 0.0 {
            return 0.0;
        }

        let discr = 2.0 * self.max_acceleration * dist + vel.powi(2);
        if discr < max_vel.powi(2) {
            (discr.sqrt() - vel) / self.max_acceleration
        } else {
            let t = ((max_vel - vel) / self.max_acceleration).max(0.0);
            let d = 0.5 * (vel + max_vel) * t;
            t + (dist - d) / max_vel
        }
    }
}
