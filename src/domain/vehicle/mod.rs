pub mod driver;
pub mod kinematics;
pub mod vehicle_spec;
pub mod vehicle_spec_registry;
