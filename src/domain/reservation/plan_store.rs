use crate::domain::reservation::query::{calc_acceleration_profile, Plan, Query};
use crate::domain::reservation::reservation_grid::ReservationGrid;
use crate::domain::reservation::trajectory::{normalize, TileTimeFrame, TrajectoryDiscoverer, MAX_SIMULATION_STEPS};
use crate::domain::utils::id::{LaneId, Vin};
use crate::domain::vehicle::vehicle_spec::VehicleSpec;

/// Templates are simulated at this fraction of the class's maximum velocity.
pub const NOMINAL_ARRIVAL_VELOCITY_FRACTION: f64 = 0.14;

/// Owner used for template queries; templates are never committed.
pub const TEMPLATE_VIN: Vin = Vin::new(0);

/// Pre-simulated plans of one vehicle class, one per reachable (arrival, departure) lane pair.
#[derive(Debug, Clone)]
pub struct PlanStore {
    spec: VehicleSpec,

    /// Templates, read-only after generation.
    plans: Vec<Plan>,

    /// The queries the templates were generated from, including failed ones.
    queries: Vec<Query>,
}

impl PlanStore {
    /// Simulates every entry lane x exit lane combination except U-turns onto the
    /// entry road's dual.
    pub fn generate(spec: &VehicleSpec, discoverer: &TrajectoryDiscoverer<'_>, current_time: f64) -> Self {
        let nominal_velocity = spec.max_velocity * NOMINAL_ARRIVAL_VELOCITY_FRACTION;
        let intersection = discoverer.intersection;

        let mut plans = Vec::new();
        let mut queries = Vec::new();

        for entry_road in intersection.entry_roads() {
            for &entry_lane in &entry_road.lanes {
                for exit_road in intersection.exit_roads() {
                    if entry_road.dual == Some(exit_road.id) {
                        continue;
                    }

                    for &exit_lane in &exit_road.lanes {
                        let query = Query::new(TEMPLATE_VIN, current_time, nominal_velocity, entry_lane, exit_lane, spec.clone(), nominal_velocity, false);

                        match discoverer.plan_by_simulation(&query) {
                            Some(plan) => plans.push(plan),
                            None => log::warn!(
                                "No template for '{}' from lane {} to lane {}. Queries for this pair fall back to simulation.",
                                spec.name,
                                entry_lane,
                                exit_lane
                            ),
                        }
                        queries.push(query);
                    }
                }
            }
        }

        log::info!("PlanStore for '{}' generated with {} of {} lane pairs.", spec.name, plans.len(), queries.len());

        return PlanStore { spec: spec.clone(), plans, queries };
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// The template for a lane pair, if one could be generated.
    pub fn template(&self, arrival_lane: LaneId, departure_lane: LaneId) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.arrival_lane == arrival_lane && plan.departure_lane == departure_lane)
    }

    /// Rescales the template of the lane pair to the given arrival, accelerating
    /// towards `max_turn_velocity` if `accelerating` is set.
    ///
    /// # Returns
    /// `None` if no template exists or the rescaled cells collide with the grid.
    pub fn retrieve_current_plan(
        &self,
        discoverer: &TrajectoryDiscoverer<'_>,
        vin: Vin,
        arrival_lane: LaneId,
        departure_lane: LaneId,
        arrival_time: f64,
        arrival_velocity: f64,
        max_turn_velocity: f64,
        accelerating: bool,
    ) -> Option<Plan> {
        let template = self.template(arrival_lane, departure_lane)?;
        let arrival = Arrival { vin, time: arrival_time, velocity: arrival_velocity, max_velocity: max_turn_velocity, accelerating };

        return rescale_plan(template, discoverer, &self.spec, &arrival);
    }
}

/// Arrival conditions a template is rescaled to.
#[derive(Debug, Clone, Copy)]
pub struct Arrival {
    pub vin: Vin,
    pub time: f64,
    pub velocity: f64,
    pub max_velocity: f64,
    pub accelerating: bool,
}

/// Builds a new plan from `template` for a vehicle arriving as described by `arrival`.
///
/// The tile sequence of the template is kept. Each template frame was reached after
/// travelling some distance at the template's constant velocity; the frame is moved
/// to the step at which the arriving vehicle covers the same distance, either at
/// constant speed or accelerating towards `max_velocity`. Each frame's tiles are held
/// from the step after the previous frame up to its own step, so occupancy stays
/// contiguous from the arrival step on. Several frames may land on the same step.
pub fn rescale_plan(template: &Plan, discoverer: &TrajectoryDiscoverer<'_>, spec: &VehicleSpec, arrival: &Arrival) -> Option<Plan> {
    let grid = discoverer.grid;

    if template.tile_frames.is_empty() || !(template.arrival_velocity > 0.0) {
        log::error!("Template {} -> {} cannot be rescaled.", template.arrival_lane, template.departure_lane);
        return None;
    }

    let accelerating = arrival.accelerating && arrival.max_velocity > arrival.velocity;
    if !(arrival.velocity > 0.0) && !accelerating {
        log::debug!("{:?} arrives standing still without accelerating, no rescaled plan.", arrival.vin);
        return None;
    }

    let travel_time = |distance: f64| -> f64 {
        if accelerating {
            spec.min_reach_time(arrival.velocity, distance, arrival.max_velocity)
        } else {
            distance / arrival.velocity
        }
    };
    let step_at = |elapsed: f64| -> i64 { first_step_not_before(grid.calc_discrete_time(arrival.time + elapsed), arrival.time + elapsed, grid) };

    let template_traversal = template.exit_time - template.entry_time;
    let exit_distance = template.arrival_velocity * template_traversal;
    let traversal_time = travel_time(exit_distance);
    if !traversal_time.is_finite() || traversal_time / grid.grid_time_step() > MAX_SIMULATION_STEPS as f64 {
        log::warn!(
            "Rescaled crossing of {:?} would take {:.1}s, more than {} grid steps. No plan.",
            arrival.vin,
            traversal_time,
            MAX_SIMULATION_STEPS
        );
        return None;
    }

    let template_start = grid.calc_discrete_time(template.entry_time);
    let first_step = grid.calc_discrete_time(arrival.time) + 1;
    let mut working_list = Vec::new();
    let mut previous_step = first_step - 1;

    for (index, frame) in template.tile_frames.iter().enumerate() {
        let template_elapsed = grid.calc_time(template_start + 1 + index as i64) - template.entry_time;
        let step = step_at(travel_time(template.arrival_velocity * template_elapsed)).max(first_step);

        // Frames mapped to an already covered step share it.
        for occupied_step in (previous_step + 1).min(step)..=step {
            if !discoverer.claim(&frame.tiles, occupied_step, arrival.vin, &mut working_list) {
                return None;
            }
        }
        previous_step = previous_step.max(step);
    }

    let exit_step = step_at(traversal_time).max(previous_step);
    let exit_time = grid.calc_time(exit_step);

    normalize(&mut working_list);

    let exit_velocity = if accelerating {
        (arrival.velocity.powi(2) + 2.0 * spec.max_acceleration * exit_distance).sqrt().min(arrival.max_velocity)
    } else {
        arrival.velocity
    };

    let acceleration_profile =
        calc_acceleration_profile(arrival.time, arrival.velocity, arrival.max_velocity, spec.max_acceleration, exit_time, arrival.accelerating);

    let tile_frames: Vec<TileTimeFrame> = template.tile_frames.clone();

    return Some(Plan {
        vin: arrival.vin,
        entry_time: arrival.time,
        exit_time,
        arrival_velocity: arrival.velocity,
        exit_velocity,
        working_list,
        tile_frames,
        acceleration_profile,
        arrival_lane: template.arrival_lane,
        departure_lane: template.departure_lane,
    });
}

/// Smallest step whose start is not before `time`, given `step = calc_discrete_time(time)`.
fn first_step_not_before(step: i64, time: f64, grid: &ReservationGrid) -> i64 {
    if grid.calc_time(step) >= time - 1e-9 {
        return step;
    }

    return step + 1;
}
