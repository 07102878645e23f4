use crate::domain::reservation::reservation_grid::TimeTile;
use crate::domain::reservation::trajectory::TileTimeFrame;
use crate::domain::utils::id::{LaneId, Vin};
use crate::domain::vehicle::vehicle_spec::VehicleSpec;

/// A request to cross the intersection. Immutable once built.
#[derive(Debug, Clone)]
pub struct Query {
    pub vin: Vin,
    pub arrival_time: f64,
    pub arrival_velocity: f64,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
    pub spec: VehicleSpec,

    /// Velocity cap of the test vehicle while crossing.
    pub max_turn_velocity: f64,

    /// **true** to accelerate towards `max_turn_velocity`, **false** to hold the arrival velocity.
    pub accelerating: bool,
}

impl Query {
    pub fn new(
        vin: Vin,
        arrival_time: f64,
        arrival_velocity: f64,
        arrival_lane: LaneId,
        departure_lane: LaneId,
        spec: VehicleSpec,
        max_turn_velocity: f64,
        accelerating: bool,
    ) -> Self {
        Query { vin, arrival_time, arrival_velocity, arrival_lane, departure_lane, spec, max_turn_velocity, accelerating }
    }
}

/// One (acceleration, duration) piece of the profile a vehicle must follow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSegment {
    pub acceleration: f64,
    pub duration: f64,
}

impl AccelerationSegment {
    pub fn new(acceleration: f64, duration: f64) -> Self {
        AccelerationSegment { acceleration, duration }
    }
}

/// A collision-checked space-time trajectory satisfying a [`Query`].
#[derive(Debug, Clone)]
pub struct Plan {
    pub vin: Vin,

    /// Continuous time the vehicle enters the intersection.
    pub entry_time: f64,

    /// Continuous time the vehicle has fully left the padded intersection area.
    pub exit_time: f64,

    pub arrival_velocity: f64,
    pub exit_velocity: f64,

    /// Cells to reserve, ordered by (time, tile) without duplicates.
    pub working_list: Vec<TimeTile>,

    /// Vehicle positions and tiles per simulated step, used as cache templates.
    pub tile_frames: Vec<TileTimeFrame>,

    pub acceleration_profile: Vec<AccelerationSegment>,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
}

/// Splits the traversal into an acceleration phase and a cruise phase.
///
/// # Panics
/// If `exit_time <= arrival_time`. A trajectory always spends time inside the
/// intersection, so anything else means the simulation bookkeeping is broken.
pub fn calc_acceleration_profile(
    arrival_time: f64,
    arrival_velocity: f64,
    max_velocity: f64,
    max_acceleration: f64,
    exit_time: f64,
    accelerating: bool,
) -> Vec<AccelerationSegment> {
    let traversal_time = exit_time - arrival_time;
    if traversal_time <= 0.0 {
        log::error!("Non-positive traversal time {:.10} (arrival: {}, exit: {}).", traversal_time, arrival_time, exit_time);
    }
    assert!(traversal_time > 0.0, "traversal time must be positive, got {}", traversal_time);

    let mut profile = Vec::with_capacity(2);

    if accelerating && max_velocity > arrival_velocity {
        let acceleration_duration = traversal_time.min((max_velocity - arrival_velocity) / max_acceleration);
        profile.push(AccelerationSegment::new(max_acceleration, acceleration_duration));

        if acceleration_duration < traversal_time {
            profile.push(AccelerationSegment::new(0.0, traversal_time - acceleration_duration));
        }
    } else {
        profile.push(AccelerationSegment::new(0.0, traversal_time));
    }

    return profile;
}
