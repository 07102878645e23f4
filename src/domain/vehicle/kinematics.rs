use crate::domain::intersection::geometry::{heading_vector, ConvexPolygon, Point2d};
use crate::domain::vehicle::vehicle_spec::VehicleSpec;

/// The slice of vehicle physics the trajectory discovery needs.
pub trait VehicleKinematics {
    /// Middle point of the front bumper.
    fn position(&self) -> Point2d;

    /// Heading in radians, counter-clockwise from +x.
    fn heading(&self) -> f64;

    fn velocity(&self) -> f64;

    /// Footprint of the vehicle grown by `buffer` meters on every side.
    fn shape(&self, buffer: f64) -> ConvexPolygon;

    fn set_heading(&mut self, heading: f64);

    /// Advances the vehicle by `duration` seconds with its current acceleration.
    fn move_for(&mut self, duration: f64);

    /// Holds the current velocity.
    fn coast(&mut self);

    /// Accelerates at the maximum rate until the maximum velocity is reached.
    fn accelerate_to_max(&mut self);
}

/// Point-mass vehicle driven through the intersection during trajectory discovery.
#[derive(Debug, Clone)]
pub struct TestVehicle {
    spec: VehicleSpec,
    position: Point2d,
    heading: f64,
    velocity: f64,
    acceleration: f64,
}

impl TestVehicle {
    pub fn new(spec: VehicleSpec, position: Point2d, heading: f64, velocity: f64) -> Self {
        TestVehicle { spec, position, heading, velocity, acceleration: 0.0 }
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    /// Distance covered within `duration`, velocity capped at the spec maximum.
    fn advance_velocity(&mut self, duration: f64) -> f64 {
        if self.acceleration <= 0.0 || self.velocity >= self.spec.max_velocity {
            return self.velocity * duration;
        }

        let time_to_max = (self.spec.max_velocity - self.velocity) / self.acceleration;
        if time_to_max >= duration {
            let distance = self.velocity * duration + 0.5 * self.acceleration * duration * duration;
            self.velocity += self.acceleration * duration;
            return distance;
        }

        let distance = self.velocity * time_to_max
            + 0.5 * self.acceleration * time_to_max * time_to_max
            + self.spec.max_velocity * (duration - time_to_max);
        self.velocity = self.spec.max_velocity;
        self.acceleration = 0.0;

        return distance;
    }
}

impl VehicleKinematics for TestVehicle {
    fn position(&self) -> Point2d {
        self.position
    }

    fn heading(&self) -> f64 {
        self.heading
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn shape(&self, buffer: f64) -> ConvexPolygon {
        let front = self.position + heading_vector(self.heading) * buffer;
        ConvexPolygon::oriented_rect(front, self.heading, self.spec.length + 2.0 * buffer, self.spec.width + 2.0 * buffer)
    }

    fn set_heading(&mut self, heading: f64) {
        self.heading = heading;
    }

    fn move_for(&mut self, duration: f64) {
        let distance = self.advance_velocity(duration);
        self.position += heading_vector(self.heading) * distance;
    }

    fn coast(&mut self) {
        self.acceleration = 0.0;
    }

    fn accelerate_to_max(&mut self) {
        self.acceleration = self.spec.max_acceleration;
    }
}
