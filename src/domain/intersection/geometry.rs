use cgmath::prelude::*;
use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Tolerance used by the separating axis test. Shapes that only touch along an
/// edge are treated as disjoint.
const SEPARATION_EPSILON: f64 = 1e-9;

/// Rotates a vector 90 degrees counter-clockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Unit vector pointing along `heading` (radians, counter-clockwise from +x).
pub fn heading_vector(heading: f64) -> Vector2d {
    Vector2d::new(heading.cos(), heading.sin())
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2d,
    pub max: Point2d,
}

impl Rect {
    pub fn new(min: Point2d, max: Point2d) -> Self {
        Rect { min, max }
    }

    pub fn from_center(center: Point2d, width: f64, height: f64) -> Self {
        let half = Vector2d::new(width / 2.0, height / 2.0);
        Rect { min: center - half, max: center + half }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Rect {
        let delta = Vector2d::new(margin, margin);
        Rect { min: self.min - delta, max: self.max + delta }
    }

    pub fn contains(&self, point: Point2d) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn to_polygon(&self) -> ConvexPolygon {
        ConvexPolygon::new(vec![
            self.min,
            Point2d::new(self.max.x, self.min.y),
            self.max,
            Point2d::new(self.min.x, self.max.y),
        ])
    }
}

/// Convex polygon with vertices in counter-clockwise order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    pub vertices: Vec<Point2d>,
}

impl ConvexPolygon {
    pub fn new(vertices: Vec<Point2d>) -> Self {
        ConvexPolygon { vertices }
    }

    /// Rectangle of `length` x `width` whose front edge is centred on `front`,
    /// extending backwards against `heading`.
    pub fn oriented_rect(front: Point2d, heading: f64, length: f64, width: f64) -> Self {
        let forward = heading_vector(heading);
        let left = rot90(forward) * (width / 2.0);
        let rear = front - forward * length;

        ConvexPolygon::new(vec![rear - left, front - left, front + left, rear + left])
    }

    pub fn bounding_box(&self) -> Rect {
        let mut min = Point2d::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2d::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for v in &self.vertices {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }

        return Rect::new(min, max);
    }

    /// Separating axis test. Touching polygons do not intersect.
    pub fn intersects(&self, other: &ConvexPolygon) -> bool {
        if self.vertices.len() < 3 || other.vertices.len() < 3 {
            return false;
        }

        for polygon in [self, other] {
            let n = polygon.vertices.len();
            for i in 0..n {
                let edge = polygon.vertices[(i + 1) % n] - polygon.vertices[i];
                if edge.magnitude2() == 0.0 {
                    continue;
                }
                let axis = rot90(edge).normalize();

                let (min_a, max_a) = self.project(axis);
                let (min_b, max_b) = other.project(axis);

                if max_a <= min_b + SEPARATION_EPSILON || max_b <= min_a + SEPARATION_EPSILON {
                    return false;
                }
            }
        }

        return true;
    }

    fn project(&self, axis: Vector2d) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in &self.vertices {
            let p = v.to_vec().dot(axis);
            min = min.min(p);
            max = max.max(p);
        }

        return (min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn oriented_rect_extends_behind_front_point() {
        let shape = ConvexPolygon::oriented_rect(Point2d::new(0.0, 0.0), 0.0, 4.0, 2.0);
        let bbox = shape.bounding_box();

        assert_approx_eq!(bbox.min.x, -4.0);
        assert_approx_eq!(bbox.max.x, 0.0);
        assert_approx_eq!(bbox.min.y, -1.0);
        assert_approx_eq!(bbox.max.y, 1.0);
    }

    #[test]
    fn rotated_rect_bounding_box() {
        let shape = ConvexPolygon::oriented_rect(Point2d::new(1.0, 1.0), FRAC_PI_2, 4.0, 2.0);
        let bbox = shape.bounding_box();

        assert_approx_eq!(bbox.min.x, 0.0);
        assert_approx_eq!(bbox.max.x, 2.0);
        assert_approx_eq!(bbox.min.y, -3.0);
        assert_approx_eq!(bbox.max.y, 1.0);
    }

    #[test]
    fn overlapping_and_touching_polygons() {
        let a = Rect::new(Point2d::new(0.0, 0.0), Point2d::new(1.0, 1.0)).to_polygon();
        let b = Rect::new(Point2d::new(0.5, 0.5), Point2d::new(2.0, 2.0)).to_polygon();
        let touching = Rect::new(Point2d::new(1.0, 0.0), Point2d::new(2.0, 1.0)).to_polygon();
        let far = Rect::new(Point2d::new(3.0, 3.0), Point2d::new(4.0, 4.0)).to_polygon();

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&touching));
        assert!(!a.intersects(&far));
    }

    #[test]
    fn diagonal_rect_misses_corner_box() {
        // Rotated 45 degrees, bounding boxes overlap but the shapes do not.
        let diamond = ConvexPolygon::new(vec![
            Point2d::new(0.0, -1.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(0.0, 1.0),
            Point2d::new(-1.0, 0.0),
        ]);
        let corner = Rect::new(Point2d::new(0.7, 0.7), Point2d::new(1.0, 1.0)).to_polygon();

        assert!(!diamond.intersects(&corner));
    }
}
