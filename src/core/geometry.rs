//! Geometry Primitives
//!
//! Stateless vector, angle and rectangle math shared by the hitbox model,
//! movement and pathfinding.
//!
//! ## Angle convention
//!
//! ```text
//!              90° (screen up, -Y)
//!                    │
//!   180° (-X) ───────┼─────── 0° (+X)
//!                    │
//!              270° (screen down, +Y)
//! ```
//!
//! `angle_of_vector` and `angle_to_vector` are exact inverses under this
//! convention. Every rotation and compass consumer in the crate relies on it.

use std::f32::consts::{PI, TAU};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::rect::{Point, Rect};
use super::vec2::Vec2;

/// Geometry precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// `intersecting_rectangle` was called on rectangles that do not overlap.
    #[error("rectangles {a} and {b} do not intersect")]
    NoIntersection {
        /// First rectangle
        a: Rect,
        /// Second rectangle
        b: Rect,
    },
}

// =============================================================================
// VECTORS & ANGLES
// =============================================================================

/// Vector pointing from `from` to `to`.
#[inline]
pub fn vector_between(from: Vec2, to: Vec2) -> Vec2 {
    to - from
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    vector_between(a, b).length()
}

/// Unit vector in the direction of `v`. The zero vector maps to itself.
#[inline]
pub fn unit_vector(v: Vec2) -> Vec2 {
    v.normalize()
}

/// The shorter of two vectors (`b` on ties).
#[inline]
pub fn shortest_vector(a: Vec2, b: Vec2) -> Vec2 {
    if a.length() < b.length() {
        a
    } else {
        b
    }
}

/// Angle of a vector in radians, in `[0, 2π]`.
///
/// Computed as `acos(x / len)`, mirrored to `2π - θ` when `y > 0`. The zero
/// vector has angle 0.
pub fn angle_of_vector(v: Vec2) -> f32 {
    let len = v.length();
    if len == 0.0 {
        return 0.0;
    }

    let mut radians = (v.x / len).clamp(-1.0, 1.0).acos();
    if v.y > 0.0 {
        radians = TAU - radians;
    }
    radians
}

/// Vector of the given length at `radians` (inverse of [`angle_of_vector`]).
#[inline]
pub fn angle_to_vector(radians: f32, length: f32) -> Vec2 {
    Vec2::new(radians.cos(), -radians.sin()) * length
}

/// Convert whole degrees to radians.
#[inline]
pub fn degrees_to_radians(degrees: i32) -> f32 {
    degrees as f32 * PI / 180.0
}

/// Convert radians to whole degrees, rounding half away from zero.
#[inline]
pub fn radians_to_degrees(radians: f32) -> i32 {
    (radians * 180.0 / PI).round() as i32
}

// =============================================================================
// RECTANGLES
// =============================================================================

/// Gap vector from rectangle `from` to rectangle `to`.
///
/// Zero when the rectangles intersect; overlap depth is not recoverable
/// from this call. Each axis is zero where the projections overlap or touch.
pub fn vector_between_rectangles(from: &Rect, to: &Rect) -> Vec2 {
    if from.intersects(to) {
        return Vec2::ZERO;
    }

    let mut gap = Vec2::ZERO;
    if from.right() < to.left() {
        gap.x = (to.left() - from.right()) as f32;
    } else if to.right() < from.left() {
        gap.x = (to.right() - from.left()) as f32;
    }

    if from.bottom() < to.top() {
        gap.y = (to.top() - from.bottom()) as f32;
    } else if to.bottom() < from.top() {
        gap.y = (to.bottom() - from.top()) as f32;
    }

    gap
}

/// Length of [`vector_between_rectangles`].
#[inline]
pub fn distance_between_rectangles(from: &Rect, to: &Rect) -> f32 {
    vector_between_rectangles(from, to).length()
}

/// The overlapping region of two rectangles.
pub fn intersecting_rectangle(a: &Rect, b: &Rect) -> Result<Rect, GeometryError> {
    if !a.intersects(b) {
        return Err(GeometryError::NoIntersection { a: *a, b: *b });
    }

    let left = a.left().max(b.left());
    let top = a.top().max(b.top());
    let width = a.right().min(b.right()) - left;
    let height = a.bottom().min(b.bottom()) - top;

    Ok(Rect::new(left, top, width, height))
}

/// Rotate a rectangle's corners about `pivot` by `angle` radians.
///
/// Each corner goes through polar form (angle, radius) about the pivot,
/// gets `angle` added, and comes back through [`angle_to_vector`], then is
/// truncated to integer coordinates. Corners are returned in perimeter
/// order: top-left, top-right, bottom-right, bottom-left.
pub fn rotated_rectangle(pivot: Vec2, rect: &Rect, angle: f32) -> [Point; 4] {
    let corners = [
        Vec2::new(rect.left() as f32, rect.top() as f32),
        Vec2::new(rect.right() as f32, rect.top() as f32),
        Vec2::new(rect.right() as f32, rect.bottom() as f32),
        Vec2::new(rect.left() as f32, rect.bottom() as f32),
    ];

    corners.map(|corner| {
        let offset = corner - pivot;
        let rotated = angle_to_vector(angle_of_vector(offset) + angle, offset.length());
        (pivot + rotated).to_point()
    })
}

// =============================================================================
// POLYGONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y as i64 - p.y as i64) * (r.x as i64 - q.x as i64)
        - (q.x as i64 - p.x as i64) * (r.y as i64 - q.y as i64);

    match val {
        0 => Orientation::Collinear,
        v if v > 0 => Orientation::Clockwise,
        _ => Orientation::CounterClockwise,
    }
}

/// Given collinear p, q, r: does q lie on segment pr?
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Ray-casting point-in-polygon test.
///
/// A point lying on a boundary edge counts as inside. Polygons with fewer
/// than 3 vertices contain nothing.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let edges = || (0..n).map(|i| (polygon[i], polygon[(i + 1) % n]));

    if edges().any(|(a, b)| orientation(a, point, b) == Orientation::Collinear && on_segment(a, point, b)) {
        return true;
    }

    // Half-open in y, so a ray through a vertex counts it once
    let mut inside = false;
    for (a, b) in edges() {
        if (a.y > point.y) != (b.y > point.y) {
            let t = (point.y - a.y) as f64 / (b.y - a.y) as f64;
            let x_cross = a.x as f64 + t * (b.x - a.x) as f64;
            if (point.x as f64) < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

// =============================================================================
// COMPASS DIRECTIONS
// =============================================================================

/// Compass direction. Opposite directions have opposite discriminants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Direction {
    /// Screen up (-Y)
    North = 1,
    /// Up-right
    NorthEast = 2,
    /// Right (+X)
    East = 3,
    /// Down-right
    SouthEast = 4,
    /// Screen down (+Y)
    South = -1,
    /// Down-left
    SouthWest = -2,
    /// Left (-X)
    West = -3,
    /// Up-left
    NorthWest = -4,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }
}

/// 8-way compass direction of a vector.
///
/// The angle is rounded to whole degrees first, then classified with
/// half-open 45° sectors centred on each compass point.
pub fn majority_direction(v: Vec2) -> Direction {
    let degree = radians_to_degrees(angle_of_vector(v)) as f32;

    if degree > 337.5 || degree < 22.5 {
        Direction::East
    } else if degree > 22.5 && degree < 67.5 {
        Direction::NorthEast
    } else if degree > 67.5 && degree < 112.5 {
        Direction::North
    } else if degree > 112.5 && degree < 157.5 {
        Direction::NorthWest
    } else if degree > 157.5 && degree < 202.5 {
        Direction::West
    } else if degree > 202.5 && degree < 247.5 {
        Direction::SouthWest
    } else if degree > 247.5 && degree < 292.5 {
        Direction::South
    } else {
        Direction::SouthEast
    }
}

/// 4-way direction by dominant axis. Ties fall through to North/South,
/// and a zero (or purely tied) vertical component gives South.
pub fn majority_cardinal_direction(v: Vec2) -> Direction {
    if v.x > 0.0 && v.x > v.y.abs() {
        Direction::East
    } else if v.x < 0.0 && v.x.abs() > v.y.abs() {
        Direction::West
    } else if v.y < 0.0 {
        Direction::North
    } else {
        Direction::South
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_angle_of_vector_screen_convention() {
        assert_eq!(angle_of_vector(Vec2::RIGHT), 0.0);
        assert!((angle_of_vector(Vec2::UP) - PI / 2.0).abs() < EPS);
        assert!((angle_of_vector(Vec2::LEFT) - PI).abs() < EPS);
        assert!((angle_of_vector(Vec2::DOWN) - 3.0 * PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_angle_of_zero_vector() {
        assert_eq!(angle_of_vector(Vec2::ZERO), 0.0);
    }

    #[test]
    fn test_angle_to_vector_inverts_angle_of_vector() {
        for v in [Vec2::new(3.0, 4.0), Vec2::new(-2.0, 7.0), Vec2::new(-5.0, -1.0), Vec2::new(1.0, -9.0)] {
            let back = angle_to_vector(angle_of_vector(v), v.length());
            assert!((back.x - v.x).abs() < 1e-4, "{:?} -> {:?}", v, back);
            assert!((back.y - v.y).abs() < 1e-4, "{:?} -> {:?}", v, back);
        }
    }

    #[test]
    fn test_degree_conversions() {
        assert!((degrees_to_radians(180) - PI).abs() < EPS);
        assert_eq!(radians_to_degrees(PI), 180);
        assert_eq!(radians_to_degrees(degrees_to_radians(45)), 45);
        // 0.5° rounds away from zero in both directions
        assert_eq!(radians_to_degrees(0.5 * PI / 180.0), 1);
        assert_eq!(radians_to_degrees(-0.5 * PI / 180.0), -1);
    }

    #[test]
    fn test_unit_vector_of_zero() {
        assert_eq!(unit_vector(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_shortest_vector() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 2.0);
        assert_eq!(shortest_vector(a, b), a);
        assert_eq!(shortest_vector(b, a), a);
    }

    #[test]
    fn test_intersecting_rectangle_literal() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(intersecting_rectangle(&a, &b), Ok(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn test_intersecting_rectangle_disjoint_fails() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert_eq!(
            intersecting_rectangle(&a, &b),
            Err(GeometryError::NoIntersection { a, b })
        );
    }

    #[test]
    fn test_vector_between_rectangles() {
        let a = Rect::new(0, 0, 10, 10);

        // Right of a, overlapping vertically
        assert_eq!(vector_between_rectangles(&a, &Rect::new(15, 2, 5, 5)), Vec2::new(5.0, 0.0));
        // Up-left of a
        assert_eq!(vector_between_rectangles(&a, &Rect::new(-10, -20, 4, 4)), Vec2::new(-6.0, -16.0));
        // Overlapping
        assert_eq!(vector_between_rectangles(&a, &Rect::new(5, 5, 10, 10)), Vec2::ZERO);
        // Touching on an edge: no gap on either axis
        assert_eq!(vector_between_rectangles(&a, &Rect::new(10, 0, 5, 5)), Vec2::ZERO);

        assert_eq!(distance_between_rectangles(&a, &Rect::new(13, 14, 1, 1)), 5.0);
    }

    #[test]
    fn test_rotated_rectangle_identity() {
        let rect = Rect::new(10, 20, 30, 40);
        let corners = rotated_rectangle(Vec2::new(10.0, 20.0), &rect, 0.0);
        assert_eq!(corners[0], Point::new(10, 20));
        // Angle 0 along +X survives the polar round trip exactly
        assert_eq!(corners[1], Point::new(40, 20));
        // Other corners are subject to truncation of float error
        assert!((corners[2].x - 40).abs() <= 1 && (corners[2].y - 60).abs() <= 1);
        assert!((corners[3].x - 10).abs() <= 1 && (corners[3].y - 60).abs() <= 1);
    }

    #[test]
    fn test_rotated_rectangle_quarter_turn() {
        let rect = Rect::new(0, 0, 10, 10);
        let corners = rotated_rectangle(Vec2::ZERO, &rect, PI / 2.0);

        // Pivot corner stays put
        assert_eq!(corners[0], Point::new(0, 0));
        // +X corner swings to screen up
        assert_eq!(corners[1], Point::new(0, -10));
        // Remaining corners land within truncation error of the exact answer
        assert!((corners[2].x - 10).abs() <= 1 && (corners[2].y + 10).abs() <= 1);
        assert!((corners[3].x - 10).abs() <= 1 && corners[3].y.abs() <= 1);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];

        assert!(point_in_polygon(Point::new(5, 5), &square));
        assert!(!point_in_polygon(Point::new(15, 5), &square));
        assert!(!point_in_polygon(Point::new(-1, 5), &square));
        // Boundary points are inside
        assert!(point_in_polygon(Point::new(10, 5), &square));
        assert!(point_in_polygon(Point::new(0, 5), &square));
        assert!(point_in_polygon(Point::new(5, 10), &square));
    }

    #[test]
    fn test_point_in_diamond() {
        let diamond = [
            Point::new(10, 0),
            Point::new(0, 10),
            Point::new(-10, 0),
            Point::new(0, -10),
        ];

        // Ray from the center passes through the (10, 0) vertex
        assert!(point_in_polygon(Point::new(0, 0), &diamond));
        assert!(point_in_polygon(Point::new(-5, 0), &diamond));
        assert!(!point_in_polygon(Point::new(-11, 0), &diamond));
        assert!(!point_in_polygon(Point::new(8, 8), &diamond));
    }

    #[test]
    fn test_point_in_concave_polygon_level_with_edge() {
        let l_shape = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(20, 5),
            Point::new(20, 10),
            Point::new(0, 10),
        ];

        // Ray runs along the horizontal (10,5)-(20,5) edge
        assert!(point_in_polygon(Point::new(5, 5), &l_shape));
        assert!(point_in_polygon(Point::new(15, 7), &l_shape));
        assert!(point_in_polygon(Point::new(15, 5), &l_shape));
        assert!(!point_in_polygon(Point::new(15, 2), &l_shape));
        assert!(!point_in_polygon(Point::new(25, 5), &l_shape));
    }

    #[test]
    fn test_point_in_degenerate_polygon() {
        let line = [Point::new(0, 0), Point::new(10, 0)];
        assert!(!point_in_polygon(Point::new(5, 0), &line));
    }

    #[test]
    fn test_point_in_rotated_rectangle() {
        let rect = Rect::new(0, 0, 20, 4);
        let polygon = rotated_rectangle(Vec2::ZERO, &rect, PI);
        // Rotated half a turn about its top-left: now spans x in [-20, 0], y in [-4, 0]
        assert!(point_in_polygon(Point::new(-10, -2), &polygon));
        assert!(!point_in_polygon(Point::new(10, 2), &polygon));
    }

    #[test]
    fn test_majority_direction_sectors() {
        assert_eq!(majority_direction(Vec2::new(1.0, 0.0)), Direction::East);
        assert_eq!(majority_direction(Vec2::new(1.0, -1.0)), Direction::NorthEast);
        assert_eq!(majority_direction(Vec2::new(0.0, -1.0)), Direction::North);
        assert_eq!(majority_direction(Vec2::new(-1.0, -1.0)), Direction::NorthWest);
        assert_eq!(majority_direction(Vec2::new(-1.0, 0.0)), Direction::West);
        assert_eq!(majority_direction(Vec2::new(-1.0, 1.0)), Direction::SouthWest);
        assert_eq!(majority_direction(Vec2::new(0.0, 1.0)), Direction::South);
        assert_eq!(majority_direction(Vec2::new(1.0, 1.0)), Direction::SouthEast);
        // Just below the horizon still counts as East (359°)
        assert_eq!(majority_direction(Vec2::new(100.0, 1.0)), Direction::East);
    }

    #[test]
    fn test_majority_direction_sector_edges() {
        // 22° and 23° sit on either side of the 22.5° boundary
        assert_eq!(majority_direction(angle_to_vector(degrees_to_radians(22), 1.0)), Direction::East);
        assert_eq!(majority_direction(angle_to_vector(degrees_to_radians(23), 1.0)), Direction::NorthEast);
        assert_eq!(majority_direction(angle_to_vector(degrees_to_radians(292), 1.0)), Direction::South);
        assert_eq!(majority_direction(angle_to_vector(degrees_to_radians(293), 1.0)), Direction::SouthEast);
    }

    #[test]
    fn test_majority_cardinal_direction() {
        assert_eq!(majority_cardinal_direction(Vec2::new(5.0, 1.0)), Direction::East);
        assert_eq!(majority_cardinal_direction(Vec2::new(-5.0, 1.0)), Direction::West);
        assert_eq!(majority_cardinal_direction(Vec2::new(1.0, -5.0)), Direction::North);
        assert_eq!(majority_cardinal_direction(Vec2::new(1.0, 5.0)), Direction::South);
        // Ties and zero fall back to South
        assert_eq!(majority_cardinal_direction(Vec2::new(3.0, 3.0)), Direction::South);
        assert_eq!(majority_cardinal_direction(Vec2::ZERO), Direction::South);
        // Diagonal up-right ties resolve vertically
        assert_eq!(majority_cardinal_direction(Vec2::new(3.0, -3.0)), Direction::North);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::SouthWest.opposite(), Direction::NorthEast);
        assert_eq!(Direction::East.opposite() as i8, -(Direction::East as i8));
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (-200i32..200, -200i32..200, 1i32..60, 1i32..60).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_gap_between_disjoint_rects_points_from_a_to_b(
            a in rect_strategy(),
            side in 0u8..4,
            gap in 1i32..80,
            slide in -150i32..150,
            w in 1i32..60,
            h in 1i32..60,
        ) {
            let b = match side {
                0 => Rect::new(a.right() + gap, a.y + slide, w, h),
                1 => Rect::new(a.left() - gap - w, a.y + slide, w, h),
                2 => Rect::new(a.x + slide, a.bottom() + gap, w, h),
                _ => Rect::new(a.x + slide, a.top() - gap - h, w, h),
            };

            let v = vector_between_rectangles(&a, &b);
            prop_assert!(!v.is_zero());
            prop_assert!(v.dot(b.center() - a.center()) > 0.0);
            prop_assert!(intersecting_rectangle(&a, &b).is_err());
        }

        #[test]
        fn prop_overlapping_rects_have_zero_gap(
            a in rect_strategy(),
            px in 0i32..60,
            py in 0i32..60,
            bw in 1i32..60,
            bh in 1i32..60,
            bx in 0i32..60,
            by in 0i32..60,
        ) {
            // A point inside a, and a rectangle b that contains it
            let p = Point::new(a.x + px % a.width, a.y + py % a.height);
            let b = Rect::new(p.x - bx % bw, p.y - by % bh, bw, bh);

            prop_assert_eq!(vector_between_rectangles(&a, &b), Vec2::ZERO);

            let overlap = intersecting_rectangle(&a, &b).unwrap();
            prop_assert!(!overlap.is_empty());
            prop_assert!(overlap.contains(p));
            prop_assert!(overlap.left() >= a.left() && overlap.right() <= a.right());
            prop_assert!(overlap.top() >= b.top() && overlap.bottom() <= b.bottom());
        }
    }
}
