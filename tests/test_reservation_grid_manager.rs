use std::collections::BTreeSet;

use assert_approx_eq::assert_approx_eq;

use intersection_reservation::api::config_dto::{PlanCacheModeDto, ReservationGridConfigDto};
use intersection_reservation::domain::intersection::topology::Intersection;
use intersection_reservation::domain::reservation::config::ReservationGridConfig;
use intersection_reservation::domain::reservation::grid_manager::ReservationGridManager;
use intersection_reservation::domain::reservation::query::{AccelerationSegment, Plan, Query};
use intersection_reservation::domain::utils::id::{LaneId, Vin};
use intersection_reservation::domain::vehicle::vehicle_spec::VehicleSpec;
use intersection_reservation::domain::vehicle::vehicle_spec_registry::VehicleSpecRegistry;

const EASTBOUND: LaneId = LaneId::new(0);
const WESTBOUND: LaneId = LaneId::new(2);

fn sedan() -> VehicleSpec {
    VehicleSpec::new("Sedan", 5.0, 3.0, 5.0, 4.0, 2.0)
}

fn manager(mode: PlanCacheModeDto) -> ReservationGridManager {
    manager_with_buffers(mode, 0.0, 0.0, false)
}

fn manager_with_buffers(mode: PlanCacheModeDto, internal: f64, edge: f64, is_edge_enabled: bool) -> ReservationGridManager {
    let config = ReservationGridConfig::from_dto(&ReservationGridConfigDto {
        time_step: 1.0,
        grid_time_step: 1.0,
        static_buffer_size: 1.0,
        internal_tile_time_buffer_size: internal,
        edge_tile_time_buffer_size: edge,
        is_edge_tile_time_buffer_enabled: is_edge_enabled,
        granularity: 1.0,
        plan_cache_mode: mode,
    })
    .unwrap();

    let mut registry = VehicleSpecRegistry::new();
    registry.register(sedan()).unwrap();

    ReservationGridManager::new(config, Intersection::four_way(14.0, 1, 3.5).unwrap(), &registry).unwrap()
}

fn straight_query(vin: u32, lane: LaneId, arrival_time: f64) -> Query {
    let spec = sedan();
    let max_velocity = spec.max_velocity;

    Query::new(Vin::new(vin), arrival_time, 5.0, lane, lane, spec, max_velocity, false)
}

fn accelerating_query(vin: u32, lane: LaneId, arrival_time: f64, arrival_velocity: f64, max_turn_velocity: f64) -> Query {
    Query::new(Vin::new(vin), arrival_time, arrival_velocity, lane, lane, sedan(), max_turn_velocity, true)
}

fn times(plan: &Plan) -> BTreeSet<i64> {
    plan.working_list.iter().map(|cell| cell.time).collect()
}

#[test]
fn test_straight_crossing_by_simulation() {
    let manager = manager(PlanCacheModeDto::FrameReplay);

    let plan = manager.query(&straight_query(1, EASTBOUND, 10.0), true).expect("empty grid must grant the crossing");

    assert_eq!(plan.vin, Vin::new(1));
    assert_approx_eq!(plan.entry_time, 10.0);
    assert_approx_eq!(plan.exit_time, 14.0);
    assert_approx_eq!(plan.exit_velocity, 5.0);
    assert_eq!(plan.acceleration_profile, vec![AccelerationSegment::new(0.0, 4.0)]);

    let times = times(&plan);
    assert!(times.contains(&11));
    assert!(times.iter().all(|time| (11..=14).contains(time)));
    assert!(plan.working_list.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_query_leaves_grid_untouched() {
    let manager = manager(PlanCacheModeDto::FrameReplay);

    manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    manager.query(&straight_query(1, EASTBOUND, 10.0), false).unwrap();

    assert_eq!(manager.grid().reservation_count(), 0);
}

#[test]
fn test_cached_modes_match_simulated_exit() {
    for mode in [PlanCacheModeDto::FrameReplay, PlanCacheModeDto::Rescale] {
        let manager = manager(mode);

        let plan = manager.query(&straight_query(1, EASTBOUND, 10.0), false).expect("empty grid must grant the crossing");

        assert_approx_eq!(plan.exit_time, 14.0);
        assert_eq!(plan.acceleration_profile, vec![AccelerationSegment::new(0.0, 4.0)]);

        let times = times(&plan);
        assert!(times.contains(&11), "{:?}: {:?}", mode, times);
        assert!(times.iter().all(|time| (11..=14).contains(time)), "{:?}: {:?}", mode, times);
    }
}

#[test]
fn test_every_lane_pair_of_the_class_has_a_template() {
    let manager = manager(PlanCacheModeDto::FrameReplay);
    let store = manager.plan_store("Sedan").unwrap();

    assert_eq!(store.queries().len(), 12);
    assert!(store.template(EASTBOUND, EASTBOUND).is_some());
    assert!(store.template(WESTBOUND, WESTBOUND).is_some());
    assert!(store.template(EASTBOUND, WESTBOUND).is_none());
}

#[test]
fn test_accepted_plans_exclude_each_other() {
    let mut manager = manager(PlanCacheModeDto::FrameReplay);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    assert_eq!(manager.accept(&first), Vin::new(1));

    assert!(manager.query(&straight_query(2, WESTBOUND, 10.0), true).is_none());
    assert!(manager.query(&straight_query(2, WESTBOUND, 10.0), false).is_none());

    let later = manager.query(&straight_query(3, EASTBOUND, 20.0), false).unwrap();
    manager.accept(&later);

    let first_cells: BTreeSet<_> = manager.grid().reservations_of(Vin::new(1)).into_iter().collect();
    let later_cells: BTreeSet<_> = manager.grid().reservations_of(Vin::new(3)).into_iter().collect();
    assert!(!first_cells.is_empty());
    assert!(first_cells.is_disjoint(&later_cells));
}

#[test]
fn test_rejection_is_deterministic() {
    let mut manager = manager(PlanCacheModeDto::Rescale);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    manager.accept(&first);
    let reserved = manager.grid().reservation_count();

    for _ in 0..3 {
        assert!(manager.query(&straight_query(2, WESTBOUND, 10.0), false).is_none());
    }
    assert_eq!(manager.grid().reservation_count(), reserved);
}

#[test]
fn test_cancel_releases_cells_and_is_idempotent() {
    let mut manager = manager(PlanCacheModeDto::FrameReplay);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    manager.accept(&first);

    manager.cancel(Vin::new(1));
    manager.cancel(Vin::new(1));
    manager.cancel(Vin::new(99));

    assert_eq!(manager.grid().reservation_count(), 0);
    assert!(!manager.grid().has_reservations(Vin::new(1)));
    assert!(manager.query(&straight_query(2, WESTBOUND, 10.0), true).is_some());
}

#[test]
fn test_unknown_class_falls_back_to_simulation() {
    let manager = manager(PlanCacheModeDto::Rescale);
    let bus = VehicleSpec::new("Bus", 5.0, 1.5, 3.0, 4.0, 2.0);
    let query = Query::new(Vin::new(7), 10.0, 5.0, EASTBOUND, EASTBOUND, bus, 5.0, false);

    assert!(manager.plan_store("Bus").is_none());

    let plan = manager.query(&query, false).expect("simulation fallback must grant the crossing");
    assert_approx_eq!(plan.exit_time, 14.0);
}

#[test]
#[should_panic]
fn test_accepting_a_stale_plan_panics() {
    let mut manager = manager(PlanCacheModeDto::FrameReplay);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    let stale = manager.query(&straight_query(2, WESTBOUND, 10.0), true).unwrap();

    manager.accept(&first);
    manager.accept(&stale);
}

#[test]
fn test_act_purges_elapsed_reservations_and_records_history() {
    let mut manager = manager(PlanCacheModeDto::FrameReplay);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    manager.accept(&first);

    for _ in 0..15 {
        manager.act(1.0);
    }

    assert_approx_eq!(manager.current_time(), 15.0);
    assert_eq!(manager.grid().reservation_count(), 0);

    let history = manager.stat_collector().history();
    assert_eq!(history.len(), 2);
    assert_approx_eq!(history[0].time, 11.0);
    assert_eq!(history[0].vins, BTreeSet::from([Vin::new(1)]));
    assert!(history[1].vins.is_empty());
}

#[test]
fn test_accelerating_crossing_exits_earlier() {
    let manager = manager(PlanCacheModeDto::FrameReplay);
    let coasting = Query::new(Vin::new(1), 10.0, 2.0, EASTBOUND, EASTBOUND, sedan(), 5.0, false);

    let slow = manager.query(&coasting, true).unwrap();
    let fast = manager.query(&accelerating_query(1, EASTBOUND, 10.0, 2.0, 5.0), true).unwrap();

    assert_approx_eq!(slow.exit_time, 20.0);
    assert_approx_eq!(fast.exit_time, 15.0);
    assert_approx_eq!(fast.exit_velocity, 5.0);
    assert_eq!(fast.acceleration_profile, vec![AccelerationSegment::new(3.0, 1.0), AccelerationSegment::new(0.0, 4.0)]);
}

#[test]
fn test_accelerating_crossing_from_cache() {
    for mode in [PlanCacheModeDto::FrameReplay, PlanCacheModeDto::Rescale] {
        let manager = manager(mode);

        let plan = manager.query(&accelerating_query(1, EASTBOUND, 10.0, 2.0, 5.0), false).expect("empty grid must grant the crossing");

        assert_approx_eq!(plan.exit_time, 15.0);
        assert_approx_eq!(plan.exit_velocity, 5.0);
        assert_eq!(plan.acceleration_profile.len(), 2, "{:?}", mode);
        assert_approx_eq!(plan.acceleration_profile[0].acceleration, 3.0);
        assert_approx_eq!(plan.acceleration_profile[0].duration, 1.0);

        let times = times(&plan);
        assert!(times.iter().all(|time| (11..=15).contains(time)), "{:?}: {:?}", mode, times);
    }
}

#[test]
fn test_rescale_accelerates_only_up_to_turn_velocity() {
    let manager = manager(PlanCacheModeDto::Rescale);
    let query = accelerating_query(1, EASTBOUND, 10.0, 1.0, 2.0);

    let simulated = manager.query(&query, true).unwrap();
    let rescaled = manager.query(&query, false).unwrap();

    for plan in [&simulated, &rescaled] {
        assert_approx_eq!(plan.exit_time, 20.0);
        assert!(plan.exit_velocity <= 2.0 + 1e-9, "exit velocity {}", plan.exit_velocity);
        assert_eq!(plan.acceleration_profile.len(), 2);
        assert_approx_eq!(plan.acceleration_profile[0].acceleration, 3.0);
        assert_approx_eq!(plan.acceleration_profile[0].duration, 1.0 / 3.0);
    }
}

#[test]
fn test_stalled_crossing_is_rejected_in_every_mode() {
    let crawling = Query::new(Vin::new(1), 10.0, 0.0005, EASTBOUND, EASTBOUND, sedan(), 5.0, false);

    for mode in [PlanCacheModeDto::FrameReplay, PlanCacheModeDto::Rescale] {
        let manager = manager(mode);

        assert!(manager.query(&crawling, true).is_none(), "{:?}", mode);
        assert!(manager.query(&crawling, false).is_none(), "{:?}", mode);
    }
}

#[test]
fn test_far_future_arrival_is_rejected() {
    for mode in [PlanCacheModeDto::FrameReplay, PlanCacheModeDto::Rescale] {
        let manager = manager(mode);

        assert!(manager.query(&straight_query(1, EASTBOUND, 1e300), true).is_none());
        assert!(manager.query(&straight_query(1, EASTBOUND, 1e300), false).is_none());
        assert!(manager.query(&straight_query(1, EASTBOUND, f64::NAN), false).is_none());
    }
}

#[test]
fn test_tile_time_buffers_widen_the_reservation() {
    let mut manager = manager_with_buffers(PlanCacheModeDto::FrameReplay, 1.0, 2.0, true);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    let times = times(&first);

    // Edge tiles entered at step 11 are held two steps early.
    assert_eq!(times.first(), Some(&9));
    assert!(*times.last().unwrap() >= 15);
    manager.accept(&first);

    assert!(manager.query(&straight_query(2, EASTBOUND, 12.0), true).is_none());
}

#[test]
fn test_follower_fits_without_tile_time_buffers() {
    let mut manager = manager(PlanCacheModeDto::FrameReplay);

    let first = manager.query(&straight_query(1, EASTBOUND, 10.0), true).unwrap();
    manager.accept(&first);

    assert!(manager.query(&straight_query(2, EASTBOUND, 12.0), true).is_some());
}
