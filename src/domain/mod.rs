pub mod batch;
pub mod intersection;
pub mod reservation;
pub mod simulator;
pub mod utils;
pub mod vehicle;
