use cgmath::prelude::*;

use crate::domain::intersection::geometry::Point2d;
use crate::domain::intersection::tiled_area::TiledArea;
use crate::domain::intersection::topology::Intersection;
use crate::domain::reservation::config::TileTimeBuffer;
use crate::domain::reservation::query::{calc_acceleration_profile, Plan, Query};
use crate::domain::reservation::reservation_grid::{ReservationGrid, TimeTile};
use crate::domain::utils::id::{TileId, Vin};
use crate::domain::vehicle::driver::{CrashTestDummy, Driver};
use crate::domain::vehicle::kinematics::{TestVehicle, VehicleKinematics};

/// Upper bound on simulated steps for one crossing. A vehicle that has not left
/// the intersection by then is stalled.
pub const MAX_SIMULATION_STEPS: usize = 10_000;

/// Number of leading template frames considered when aligning a replay with its template.
const REPLAY_START_WINDOW: usize = 5;

/// Snapshot of the simulated vehicle position and the tiles it covered at that step.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTimeFrame {
    pub position: Point2d,
    pub tiles: Vec<TileId>,
}

/// Outcome of driving the test vehicle through the intersection.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub working_list: Vec<TimeTile>,
    pub frames: Vec<TileTimeFrame>,

    /// Start of the first step after the vehicle left the padded area.
    pub exit_time: f64,

    pub exit_velocity: f64,
}

/// Finds the (time, tile) cells a crossing occupies by simulating a test vehicle.
///
/// Borrows the grid read-only; committing a plan is the manager's job.
pub struct TrajectoryDiscoverer<'a> {
    pub intersection: &'a Intersection,
    pub tiled_area: &'a TiledArea,
    pub grid: &'a ReservationGrid,
    pub static_buffer_size: f64,
    pub buffer: TileTimeBuffer,
}

impl<'a> TrajectoryDiscoverer<'a> {
    /// Simulates `query` and builds a plan from the occupied cells.
    ///
    /// # Returns
    /// `None` if any cell is held by another owner or the crossing cannot be simulated.
    pub fn plan_by_simulation(&self, query: &Query) -> Option<Plan> {
        let (mut vehicle, mut dummy) = self.prepare(query)?;
        let result = self.find_tile_times_by_simulation(&mut vehicle, &mut dummy, query.vin, query.arrival_time, query.accelerating)?;

        return Some(self.build_plan(query, result));
    }

    /// Like [`Self::plan_by_simulation`], but tile occupancy is read from `frames`
    /// recorded by an earlier simulation of the same lane pair.
    pub fn plan_by_frame_replay(&self, query: &Query, frames: &[TileTimeFrame]) -> Option<Plan> {
        let (mut vehicle, mut dummy) = self.prepare(query)?;
        let result = self.find_tile_times_by_frames(&mut vehicle, &mut dummy, query.vin, query.arrival_time, query.accelerating, frames)?;

        return Some(self.build_plan(query, result));
    }

    fn prepare(&self, query: &Query) -> Option<(TestVehicle, CrashTestDummy)> {
        let Some(arrival_lane) = self.intersection.lane(query.arrival_lane) else {
            log::error!("Query of {:?} names unknown arrival lane {}.", query.vin, query.arrival_lane);
            return None;
        };
        let Some(departure_lane) = self.intersection.lane(query.departure_lane) else {
            log::error!("Query of {:?} names unknown departure lane {}.", query.vin, query.departure_lane);
            return None;
        };

        let mut spec = query.spec.clone();
        spec.max_velocity = query.max_turn_velocity;

        let vehicle = TestVehicle::new(spec, arrival_lane.entry_point, arrival_lane.heading, query.arrival_velocity);
        let dummy = CrashTestDummy::new(departure_lane.clone());

        return Some((vehicle, dummy));
    }

    fn build_plan(&self, query: &Query, result: SimulationResult) -> Plan {
        let acceleration_profile = calc_acceleration_profile(
            query.arrival_time,
            query.arrival_velocity,
            query.max_turn_velocity,
            query.spec.max_acceleration,
            result.exit_time,
            query.accelerating,
        );

        Plan {
            vin: query.vin,
            entry_time: query.arrival_time,
            exit_time: result.exit_time,
            arrival_velocity: query.arrival_velocity,
            exit_velocity: result.exit_velocity,
            working_list: result.working_list,
            tile_frames: result.frames,
            acceleration_profile,
            arrival_lane: query.arrival_lane,
            departure_lane: query.departure_lane,
        }
    }

    /// Drives `vehicle` step by step until it leaves the padded intersection area,
    /// recording every tile its buffered shape covers.
    pub fn find_tile_times_by_simulation(
        &self,
        vehicle: &mut dyn VehicleKinematics,
        driver: &mut dyn Driver,
        owner: Vin,
        arrival_time: f64,
        accelerating: bool,
    ) -> Option<SimulationResult> {
        if !self.starts_inside(vehicle, owner) {
            return None;
        }

        let mut working_list = Vec::new();
        let mut frames = Vec::new();
        let mut current_step = self.grid.calc_discrete_time(arrival_time);
        let mut duration = self.grid.calc_remaining_time(arrival_time);
        let mut simulated_steps = 0;

        while vehicle.shape(0.0).intersects(self.intersection.area_plus()) {
            if simulated_steps == MAX_SIMULATION_STEPS {
                log::error!("Test vehicle for {:?} did not leave the intersection within {} steps.", owner, MAX_SIMULATION_STEPS);
                return None;
            }
            simulated_steps += 1;

            move_test_vehicle(vehicle, driver, duration, accelerating);
            current_step += 1;

            let occupied: Vec<TileId> =
                self.tiled_area.find_occupied_tiles(&vehicle.shape(self.static_buffer_size)).iter().map(|tile| tile.id).collect();

            if !self.claim(&occupied, current_step, owner, &mut working_list) {
                return None;
            }

            frames.push(TileTimeFrame { position: vehicle.position(), tiles: occupied });
            duration = self.grid.grid_time_step();
        }

        normalize(&mut working_list);

        return Some(SimulationResult {
            working_list,
            frames,
            exit_time: self.grid.calc_time(current_step),
            exit_velocity: vehicle.velocity(),
        });
    }

    /// Frame replay variant of [`Self::find_tile_times_by_simulation`].
    ///
    /// The vehicle is advanced exactly as in the simulation, but occupancy is taken
    /// from the nearest template frame: replay starts at the closest of the first
    /// few frames and moves on whenever the next frame is closer to the vehicle.
    pub fn find_tile_times_by_frames(
        &self,
        vehicle: &mut dyn VehicleKinematics,
        driver: &mut dyn Driver,
        owner: Vin,
        arrival_time: f64,
        accelerating: bool,
        template_frames: &[TileTimeFrame],
    ) -> Option<SimulationResult> {
        if template_frames.is_empty() {
            log::error!("Frame replay for {:?} requested without template frames.", owner);
            return None;
        }
        if !self.starts_inside(vehicle, owner) {
            return None;
        }

        let start_window = template_frames.len().min(REPLAY_START_WINDOW + 1);
        let mut index = closest_frame(&template_frames[..start_window], vehicle.position());

        let mut working_list = Vec::new();
        let mut frames = Vec::new();
        let mut current_step = self.grid.calc_discrete_time(arrival_time);
        let mut duration = self.grid.calc_remaining_time(arrival_time);
        let mut simulated_steps = 0;

        while vehicle.shape(0.0).intersects(self.intersection.area_plus()) {
            if simulated_steps == MAX_SIMULATION_STEPS {
                log::error!("Replayed vehicle for {:?} did not leave the intersection within {} steps.", owner, MAX_SIMULATION_STEPS);
                return None;
            }
            simulated_steps += 1;

            move_test_vehicle(vehicle, driver, duration, accelerating);
            current_step += 1;

            let position = vehicle.position();
            while index + 1 < template_frames.len()
                && template_frames[index + 1].position.distance(position) < template_frames[index].position.distance(position)
            {
                index += 1;
            }

            let occupied = &template_frames[index].tiles;
            if !self.claim(occupied, current_step, owner, &mut working_list) {
                return None;
            }

            frames.push(TileTimeFrame { position, tiles: occupied.clone() });
            duration = self.grid.grid_time_step();
        }

        normalize(&mut working_list);

        return Some(SimulationResult {
            working_list,
            frames,
            exit_time: self.grid.calc_time(current_step),
            exit_velocity: vehicle.velocity(),
        });
    }

    fn starts_inside(&self, vehicle: &dyn VehicleKinematics, owner: Vin) -> bool {
        if vehicle.shape(0.0).intersects(self.intersection.area_plus()) {
            return true;
        }

        log::error!("Test vehicle for {:?} does not start inside the intersection (position: {:?}).", owner, vehicle.position());
        return false;
    }

    /// Adds the buffered time window of every tile at `step` to `working_list`.
    ///
    /// # Returns
    /// `false` as soon as a cell is held by another owner.
    pub fn claim(&self, tiles: &[TileId], step: i64, owner: Vin, working_list: &mut Vec<TimeTile>) -> bool {
        for &tile_id in tiles {
            let buffer = match self.tiled_area.tile(tile_id) {
                Some(tile) => self.buffer.steps_for(tile),
                None => {
                    log::error!("Tile {} is not part of the tiled area.", tile_id);
                    self.buffer.internal_steps
                }
            };

            for time in step - buffer..=step + buffer {
                if self.grid.is_reserved_by_other(time, tile_id, owner) {
                    log::debug!("{:?} collides with {:?} on tile {} at step {}.", owner, self.grid.reserved_by(time, tile_id), tile_id, time);
                    return false;
                }
                working_list.push(TimeTile::new(time, tile_id));
            }
        }

        return true;
    }
}

fn move_test_vehicle(vehicle: &mut dyn VehicleKinematics, driver: &mut dyn Driver, duration: f64, accelerating: bool) {
    driver.act(vehicle);

    if accelerating {
        vehicle.accelerate_to_max();
    } else {
        vehicle.coast();
    }

    vehicle.move_for(duration);
}

fn closest_frame(frames: &[TileTimeFrame], position: Point2d) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (index, frame) in frames.iter().enumerate() {
        let distance = frame.position.distance(position);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }

    return best;
}

/// Orders cells by (time, tile) and drops duplicates from overlapping buffers.
pub fn normalize(working_list: &mut Vec<TimeTile>) {
    working_list.sort();
    working_list.dedup();
}
