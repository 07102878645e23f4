use cgmath::prelude::*;
use std::f64::consts::FRAC_PI_2;

use crate::api::intersection_dto::IntersectionDto;
use crate::domain::intersection::geometry::{heading_vector, rot90, ConvexPolygon, Point2d, Rect};
use crate::domain::utils::id::{LaneId, RoadId};
use crate::error::{Error, Result};

/// Margin (meters) by which the controlled area is padded when deciding whether a
/// simulated vehicle is still inside the intersection.
pub const AREA_PLUS_MARGIN: f64 = 1.0;

const ROAD_NAMES: [&str; 4] = ["Eastbound", "Northbound", "Westbound", "Southbound"];

/// The straight segment a lane traces through the intersection.
#[derive(Debug, Clone)]
pub struct Lane {
    pub id: LaneId,
    pub road: RoadId,

    /// Point where the lane enters the intersection area.
    pub entry_point: Point2d,

    /// Point where the lane leaves the intersection area.
    pub exit_point: Point2d,

    /// Travel direction in radians, counter-clockwise from +x.
    pub heading: f64,
    pub width: f64,
}

impl Lane {
    /// Signed distance of `point` along the lane, measured from the entry point.
    pub fn distance_along(&self, point: Point2d) -> f64 {
        (point - self.entry_point).dot(heading_vector(self.heading))
    }

    /// Point on the (infinite) lane line at `distance` from the entry point.
    pub fn point_at(&self, distance: f64) -> Point2d {
        self.entry_point + heading_vector(self.heading) * distance
    }

    pub fn length(&self) -> f64 {
        (self.exit_point - self.entry_point).magnitude()
    }
}

#[derive(Debug, Clone)]
pub struct Road {
    pub id: RoadId,
    pub name: String,

    /// Lanes ordered from the centre line outwards.
    pub lanes: Vec<LaneId>,

    /// The road running in the opposite direction.
    pub dual: Option<RoadId>,
}

/// Lane/road topology of one intersection together with its controlled area.
#[derive(Debug, Clone)]
pub struct Intersection {
    area: ConvexPolygon,
    area_plus: ConvexPolygon,
    roads: Vec<Road>,
    lanes: Vec<Lane>,
}

impl Intersection {
    /// Square four-way intersection centred at the origin with right-hand traffic.
    ///
    /// Every road carries `lanes_per_road` lanes; all roads are both entry and
    /// exit roads and each road's dual is the one heading the opposite way.
    pub fn four_way(size: f64, lanes_per_road: usize, lane_width: f64) -> Result<Self> {
        if !(size > 0.0) || !(lane_width > 0.0) || lanes_per_road == 0 {
            return Err(Error::ModelConstructionError(format!(
                "Four-way intersection needs positive size, lane width and lane count (size: {}, lane width: {}, lanes: {})",
                size, lane_width, lanes_per_road
            )));
        }

        if 2.0 * lanes_per_road as f64 * lane_width > size {
            return Err(Error::ModelConstructionError(format!(
                "{} lanes of width {} per direction do not fit into an intersection of size {}",
                lanes_per_road, lane_width, size
            )));
        }

        let mut roads = Vec::with_capacity(ROAD_NAMES.len());
        let mut lanes = Vec::with_capacity(ROAD_NAMES.len() * lanes_per_road);

        for (road_index, name) in ROAD_NAMES.iter().enumerate() {
            let road_id = RoadId::new(road_index as u32);
            let heading = road_index as f64 * FRAC_PI_2;
            let forward = heading_vector(heading);
            let right = -rot90(forward);

            let mut lane_ids = Vec::with_capacity(lanes_per_road);
            for lane_index in 0..lanes_per_road {
                let lane_id = LaneId::new(lanes.len() as u32);
                let offset = Point2d::new(0.0, 0.0) + right * ((lane_index as f64 + 0.5) * lane_width);

                lanes.push(Lane {
                    id: lane_id,
                    road: road_id,
                    entry_point: offset - forward * (size / 2.0),
                    exit_point: offset + forward * (size / 2.0),
                    heading,
                    width: lane_width,
                });
                lane_ids.push(lane_id);
            }

            roads.push(Road {
                id: road_id,
                name: name.to_string(),
                lanes: lane_ids,
                dual: Some(RoadId::new(((road_index + 2) % ROAD_NAMES.len()) as u32)),
            });
        }

        let bounds = Rect::from_center(Point2d::new(0.0, 0.0), size, size);

        return Ok(Intersection {
            area: bounds.to_polygon(),
            area_plus: bounds.expanded(AREA_PLUS_MARGIN).to_polygon(),
            roads,
            lanes,
        });
    }

    pub fn from_dto(dto: &IntersectionDto) -> Result<Self> {
        Intersection::four_way(dto.size, dto.lanes_per_road, dto.lane_width)
    }

    pub fn area(&self) -> &ConvexPolygon {
        &self.area
    }

    /// The controlled area padded by [`AREA_PLUS_MARGIN`].
    pub fn area_plus(&self) -> &ConvexPolygon {
        &self.area_plus
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(id.index())
    }

    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id.index())
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn road_of(&self, lane: LaneId) -> Option<RoadId> {
        self.lane(lane).map(|lane| lane.road)
    }

    pub fn entry_roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn exit_roads(&self) -> &[Road] {
        &self.roads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn four_way_lanes_drive_on_the_right() {
        let intersection = Intersection::four_way(14.0, 1, 3.5).unwrap();

        let eastbound = intersection.lane(LaneId::new(0)).unwrap();
        assert_approx_eq!(eastbound.entry_point.x, -7.0);
        assert_approx_eq!(eastbound.entry_point.y, -1.75);
        assert_approx_eq!(eastbound.exit_point.x, 7.0);

        let northbound = intersection.lane(LaneId::new(1)).unwrap();
        assert_approx_eq!(northbound.entry_point.x, 1.75);
        assert_approx_eq!(northbound.entry_point.y, -7.0);
        assert_approx_eq!(northbound.length(), 14.0);
    }

    #[test]
    fn duals_point_at_opposite_road() {
        let intersection = Intersection::four_way(20.0, 2, 3.0).unwrap();

        for road in intersection.entry_roads() {
            let dual = road.dual.unwrap();
            assert_eq!(intersection.road(dual).unwrap().dual, Some(road.id));
            assert_ne!(dual, road.id);
            assert_eq!(road.lanes.len(), 2);
        }
        assert_eq!(intersection.lanes().len(), 8);
    }

    #[test]
    fn rejects_lanes_wider_than_the_area() {
        assert!(Intersection::four_way(10.0, 2, 3.0).is_err());
        assert!(Intersection::four_way(0.0, 1, 3.0).is_err());
    }

    #[test]
    fn distance_along_lane() {
        let intersection = Intersection::four_way(14.0, 1, 3.5).unwrap();
        let eastbound = intersection.lane(LaneId::new(0)).unwrap();

        assert_approx_eq!(eastbound.distance_along(Point2d::new(0.0, 5.0)), 7.0);
        let p = eastbound.point_at(3.0);
        assert_approx_eq!(p.x, -4.0);
        assert_approx_eq!(p.y, -1.75);
    }
}
