use crate::domain::intersection::topology::Lane;
use crate::domain::vehicle::kinematics::VehicleKinematics;

/// Distance ahead of the vehicle's projection onto the departure lane the dummy steers at.
pub const DEFAULT_LOOKAHEAD_DISTANCE: f64 = 5.0;

/// Steering policy invoked once per simulated tick, before the kinematics advance.
pub trait Driver {
    fn act(&mut self, vehicle: &mut dyn VehicleKinematics);
}

/// Pure-pursuit driver that pulls the test vehicle onto its departure lane.
#[derive(Debug, Clone)]
pub struct CrashTestDummy {
    departure_lane: Lane,
    lookahead_distance: f64,
}

impl CrashTestDummy {
    pub fn new(departure_lane: Lane) -> Self {
        CrashTestDummy { departure_lane, lookahead_distance: DEFAULT_LOOKAHEAD_DISTANCE }
    }

    pub fn with_lookahead(mut self, lookahead_distance: f64) -> Self {
        self.lookahead_distance = lookahead_distance;
        self
    }
}

impl Driver for CrashTestDummy {
    fn act(&mut self, vehicle: &mut dyn VehicleKinematics) {
        let position = vehicle.position();
        let along = self.departure_lane.distance_along(position);
        let target = self.departure_lane.point_at(along + self.lookahead_distance);

        let direction = target - position;
        vehicle.set_heading(direction.y.atan2(direction.x));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intersection::geometry::Point2d;
    use crate::domain::intersection::topology::Intersection;
    use crate::domain::utils::id::LaneId;
    use crate::domain::vehicle::kinematics::TestVehicle;
    use crate::domain::vehicle::vehicle_spec::VehicleSpec;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn keeps_heading_on_straight_lane() {
        let intersection = Intersection::four_way(14.0, 1, 3.5).unwrap();
        let eastbound = intersection.lane(LaneId::new(0)).unwrap();
        let mut vehicle = TestVehicle::new(VehicleSpec::new("Sedan", 10.0, 2.0, 4.0, 4.0, 2.0), eastbound.entry_point, eastbound.heading, 5.0);

        let mut dummy = CrashTestDummy::new(eastbound.clone());
        dummy.act(&mut vehicle);

        assert_approx_eq!(vehicle.heading(), 0.0);
    }

    #[test]
    fn turns_towards_departure_lane() {
        let intersection = Intersection::four_way(14.0, 1, 3.5).unwrap();
        let northbound = intersection.lane(LaneId::new(1)).unwrap();
        let mut vehicle = TestVehicle::new(VehicleSpec::new("Sedan", 10.0, 2.0, 4.0, 4.0, 2.0), Point2d::new(-7.0, -1.75), 0.0, 5.0);

        let mut dummy = CrashTestDummy::new(northbound.clone());
        dummy.act(&mut vehicle);

        assert!(vehicle.heading() > 0.0 && vehicle.heading() < FRAC_PI_2);
    }
}
