pub mod config;
pub mod grid_manager;
pub mod plan_store;
pub mod query;
pub mod reservation_grid;
pub mod stat_collector;
pub mod trajectory;
