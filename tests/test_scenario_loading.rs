use std::collections::BTreeSet;

use intersection_reservation::api::scenario_dto::ScenarioDto;
use intersection_reservation::domain::reservation::config::PlanCacheMode;
use intersection_reservation::domain::simulator::admission::IntersectionSimulator;
use intersection_reservation::domain::utils::id::{LaneId, Vin};
use intersection_reservation::error::Error;
use intersection_reservation::generate_scenario;
use intersection_reservation::loader::parser::{parse_json_file, parse_json_str};

fn scenario_path() -> String {
    format!("{}/tests/data/scenario.json", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_generate_scenario() {
    let simulator = generate_scenario(&scenario_path()).unwrap();

    assert_eq!(simulator.queue().len(), 3);
    assert_eq!(simulator.registry().len(), 1);
    assert_eq!(simulator.manager().config().plan_cache_mode, PlanCacheMode::FrameReplay);
    assert_eq!(simulator.reordering().config().batch_interval, 2.0);
    assert_eq!(simulator.reordering().next_processing_time(), 2.0);
    assert_eq!(simulator.time_step(), 1.0);

    let missing_bid = simulator.queue().iter().find(|p| p.proposal.vin == Vin::new(3)).unwrap();
    assert!(missing_bid.proposal.bid >= 0.05 && missing_bid.proposal.bid <= 0.50);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = generate_scenario("does/not/exist.json");

    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_malformed_json_is_a_deserialization_error() {
    let result = parse_json_str::<ScenarioDto>("{ \"reservationGrid\": 3 }");

    assert!(matches!(result, Err(Error::DeserializationError(_))));
}

#[test]
fn test_unknown_lane_is_rejected_on_load() {
    let mut dto: ScenarioDto = parse_json_file(&scenario_path()).unwrap();
    dto.proposals[0].arrival_lane = 17;

    let result = IntersectionSimulator::from_scenario(dto);

    assert!(matches!(result, Err(Error::UnknownLane(lane)) if lane == LaneId::new(17)));
}

#[test]
fn test_invalid_grid_config_is_rejected() {
    let mut dto: ScenarioDto = parse_json_file(&scenario_path()).unwrap();
    dto.reservation_grid.grid_time_step = 0.0;

    assert!(matches!(IntersectionSimulator::from_scenario(dto), Err(Error::InvalidConfiguration(_))));
}

#[test]
fn test_batch_admission_serves_higher_bid_first() {
    let mut simulator = generate_scenario(&scenario_path()).unwrap();

    let mut confirmed = BTreeSet::new();
    let mut rejected = Vec::new();
    let mut expired = Vec::new();

    for _ in 0..8 {
        let report = simulator.tick(1.0);
        confirmed.extend(report.confirmed);
        rejected.extend(report.rejected);
        expired.extend(report.expired);
    }

    // Vehicles 1 and 2 cross head-on at the same time; the lane bidding 0.3 wins.
    assert_eq!(confirmed, BTreeSet::from([Vin::new(1), Vin::new(3)]));
    assert_eq!(rejected, vec![Vin::new(2), Vin::new(2)]);
    assert_eq!(expired, vec![Vin::new(2)]);
    assert!(simulator.queue().is_empty());
}

#[test]
fn test_statistics_csv_lists_reserving_vehicles() {
    let mut simulator = generate_scenario(&scenario_path()).unwrap();

    for _ in 0..10 {
        simulator.tick(1.0);
    }

    let mut out = Vec::new();
    simulator.manager().stat_collector().write_csv(&mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();

    assert_eq!(csv.lines().next(), Some("6,1"));
}
