use crate::domain::intersection::tiled_area::TiledArea;
use crate::domain::intersection::topology::Intersection;
use crate::domain::reservation::config::{PlanCacheMode, ReservationGridConfig};
use crate::domain::reservation::plan_store::PlanStore;
use crate::domain::reservation::query::{Plan, Query};
use crate::domain::reservation::reservation_grid::ReservationGrid;
use crate::domain::reservation::stat_collector::VinHistoryStatCollector;
use crate::domain::reservation::trajectory::TrajectoryDiscoverer;
use crate::domain::utils::id::Vin;
use crate::domain::vehicle::vehicle_spec_registry::VehicleSpecRegistry;
use crate::error::Result;

/// Grants conflict-free crossings of one intersection.
///
/// Sole owner of the [`ReservationGrid`]; trajectory discovery and the plan cache
/// only ever borrow it.
#[derive(Debug)]
pub struct ReservationGridManager {
    config: ReservationGridConfig,
    intersection: Intersection,
    tiled_area: TiledArea,
    grid: ReservationGrid,

    /// One template cache per registered vehicle class.
    plan_stores: Vec<PlanStore>,

    current_time: f64,
    stat_collector: VinHistoryStatCollector,
}

impl ReservationGridManager {
    /// Validates `config`, tiles the intersection and pre-generates a [`PlanStore`]
    /// for every vehicle class in `registry`.
    pub fn new(config: ReservationGridConfig, intersection: Intersection, registry: &VehicleSpecRegistry) -> Result<Self> {
        config.validate()?;

        let tiled_area = TiledArea::new(intersection.area(), config.tile_length())?;
        let grid = ReservationGrid::new(config.grid_time_step)?;

        let mut manager = ReservationGridManager {
            config,
            intersection,
            tiled_area,
            grid,
            plan_stores: Vec::new(),
            current_time: 0.0,
            stat_collector: VinHistoryStatCollector::new(),
        };

        let plan_stores: Vec<PlanStore> = {
            let discoverer = manager.discoverer();
            registry.iter().map(|spec| PlanStore::generate(spec, &discoverer, manager.current_time)).collect()
        };
        manager.plan_stores = plan_stores;

        log::info!(
            "ReservationGridManager ready: {} tiles, {} vehicle classes, cache mode {:?}.",
            manager.tiled_area.number_of_tiles(),
            manager.plan_stores.len(),
            manager.config.plan_cache_mode
        );

        return Ok(manager);
    }

    fn discoverer(&self) -> TrajectoryDiscoverer<'_> {
        TrajectoryDiscoverer {
            intersection: &self.intersection,
            tiled_area: &self.tiled_area,
            grid: &self.grid,
            static_buffer_size: self.config.static_buffer_size,
            buffer: self.config.tile_time_buffer(),
        }
    }

    /// Finds a conflict-free plan for `query` without reserving anything.
    ///
    /// With `use_fresh_simulation` the trajectory is always simulated. Otherwise the
    /// cached template of the vehicle class is used and simulation is the fallback
    /// when the class or lane pair has no template.
    pub fn query(&self, query: &Query, use_fresh_simulation: bool) -> Option<Plan> {
        if !self.grid.is_representable(query.arrival_time) || !query.arrival_velocity.is_finite() {
            log::warn!("{:?} arrives at {} with velocity {}, outside the grid. No plan.", query.vin, query.arrival_time, query.arrival_velocity);
            return None;
        }

        let discoverer = self.discoverer();

        if use_fresh_simulation {
            return discoverer.plan_by_simulation(query);
        }

        let template_store = self.plan_store(&query.spec.name);
        let template = template_store.and_then(|store| store.template(query.arrival_lane, query.departure_lane));

        let (Some(store), Some(template)) = (template_store, template) else {
            log::debug!("No template for '{}' ({} -> {}), simulating.", query.spec.name, query.arrival_lane, query.departure_lane);
            return discoverer.plan_by_simulation(query);
        };

        let plan = match self.config.plan_cache_mode {
            PlanCacheMode::FrameReplay => discoverer.plan_by_frame_replay(query, &template.tile_frames),
            PlanCacheMode::Rescale => store.retrieve_current_plan(
                &discoverer,
                query.vin,
                query.arrival_lane,
                query.departure_lane,
                query.arrival_time,
                query.arrival_velocity,
                query.max_turn_velocity,
                query.accelerating,
            ),
        };

        match &plan {
            Some(plan) => log::debug!("{:?} granted candidate plan, exit at {:.3}.", query.vin, plan.exit_time),
            None => log::debug!("{:?} rejected, trajectory collides.", query.vin),
        }

        return plan;
    }

    /// Commits `plan` to the grid.
    ///
    /// # Panics
    /// If the plan collides with the grid. A plan returned by [`Self::query`] and
    /// accepted before any other grid change never does.
    pub fn accept(&mut self, plan: &Plan) -> Vin {
        if !self.grid.reserve(plan.vin, &plan.working_list) {
            log::error!("Accepting plan of {:?} failed after a successful query. The grid is inconsistent.", plan.vin);
            panic!("reservation of {:?} failed after a successful query", plan.vin);
        }

        return plan.vin;
    }

    /// Releases the reservation of `vin`. Unknown vehicles are ignored.
    pub fn cancel(&mut self, vin: Vin) {
        self.grid.cancel(vin);
    }

    /// Purges elapsed reservations, collects statistics and advances the clock.
    pub fn act(&mut self, time_step: f64) {
        self.grid.clean_up(self.current_time);
        self.stat_collector.collect(&self.grid, self.current_time);
        self.current_time += time_step;
    }

    pub fn plan_store(&self, spec_name: &str) -> Option<&PlanStore> {
        self.plan_stores.iter().find(|store| store.spec().name == spec_name)
    }

    pub fn plan_stores(&self) -> &[PlanStore] {
        &self.plan_stores
    }

    pub fn grid(&self) -> &ReservationGrid {
        &self.grid
    }

    pub fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    pub fn tiled_area(&self) -> &TiledArea {
        &self.tiled_area
    }

    pub fn config(&self) -> &ReservationGridConfig {
        &self.config
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn stat_collector(&self) -> &VinHistoryStatCollector {
        &self.stat_collector
    }
}
