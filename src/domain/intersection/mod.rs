pub mod geometry;
pub mod tiled_area;
pub mod topology;
