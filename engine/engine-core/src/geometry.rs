//! Planar geometry for footprints and map regions.
//!
//! Vehicles and static blocks are modelled as oriented rectangles. Overlap is
//! decided with the separating-axis theorem, which for two rectangles needs
//! only the four edge normals.

use nalgebra::{Point2, Vector2};
use std::f64::consts::{PI, TAU};

/// A point in world coordinates (meters).
pub type Point = Point2<f64>;

/// Oriented rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Geometric center
    pub center: Point,
    /// Orientation of the long axis (radians)
    pub heading: f64,
    /// Extent along the heading
    pub length: f64,
    /// Extent across the heading
    pub width: f64,
}

impl Rect {
    pub fn new(center: Point, heading: f64, length: f64, width: f64) -> Self {
        Self {
            center,
            heading,
            length,
            width,
        }
    }

    /// Axis-aligned rectangle spanning `[min_x, max_x] x [min_y, max_y]`.
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            heading: 0.0,
            length: max_x - min_x,
            width: max_y - min_y,
        }
    }

    /// Unit vectors along the length and width of the rectangle.
    #[inline]
    fn axes(&self) -> [Vector2<f64>; 2] {
        let (sin, cos) = self.heading.sin_cos();
        [Vector2::new(cos, sin), Vector2::new(-sin, cos)]
    }

    /// Corners in counter-clockwise order starting at the rear right.
    pub fn corners(&self) -> [Point; 4] {
        let [along, across] = self.axes();
        let half_l = along * (self.length / 2.0);
        let half_w = across * (self.width / 2.0);
        [
            self.center - half_l - half_w,
            self.center + half_l - half_w,
            self.center + half_l + half_w,
            self.center - half_l + half_w,
        ]
    }

    /// Half extent of the rectangle projected onto `axis`.
    #[inline]
    fn projected_radius(&self, axis: &Vector2<f64>) -> f64 {
        let [along, across] = self.axes();
        (self.length / 2.0) * along.dot(axis).abs() + (self.width / 2.0) * across.dot(axis).abs()
    }

    /// Separating-axis overlap test. Rectangles that only touch along an edge
    /// do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let offset = other.center - self.center;
        let [a0, a1] = self.axes();
        let [b0, b1] = other.axes();

        for axis in [a0, a1, b0, b1] {
            let distance = offset.dot(&axis).abs();
            if distance >= self.projected_radius(&axis) + other.projected_radius(&axis) {
                return false;
            }
        }
        true
    }

    /// Whether `point` lies inside or on the boundary of the rectangle.
    pub fn contains(&self, point: &Point) -> bool {
        let offset = point - self.center;
        let [along, across] = self.axes();
        offset.dot(&along).abs() <= self.length / 2.0 + 1e-9
            && offset.dot(&across).abs() <= self.width / 2.0 + 1e-9
    }
}

/// Pairwise collision predicate on footprints.
#[inline]
pub fn collides(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Distance from `point` to the segment `a -> b`.
pub fn distance_to_segment(point: &Point, a: &Point, b: &Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_axis_aligned_overlap() {
        let a = Rect::from_bounds(0.0, 0.0, 2.0, 2.0);
        let b = Rect::from_bounds(1.0, 1.0, 3.0, 3.0);
        let c = Rect::from_bounds(2.5, 2.5, 4.0, 4.0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&c));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::from_bounds(0.0, 0.0, 2.0, 2.0);
        let b = Rect::from_bounds(2.0, 0.0, 4.0, 2.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_rotated_rectangles() {
        // A 5x2 box rotated 45 degrees near the corner of an axis-aligned box.
        let block = Rect::from_bounds(0.0, 0.0, 10.0, 10.0);
        let far = Rect::new(Point::new(-2.0, -2.0), PI / 4.0, 5.0, 2.0);
        let near = Rect::new(Point::new(-0.5, -0.5), PI / 4.0, 5.0, 2.0);

        // Bounding boxes of `far` would touch the block, but the rotated body does not.
        assert!(!far.overlaps(&block));
        assert!(near.overlaps(&block));
    }

    #[test]
    fn test_corners_of_rotated_rect() {
        let rect = Rect::new(Point::new(0.0, 0.0), FRAC_PI_2, 4.0, 2.0);
        let corners = rect.corners();
        // Long axis points along +y after rotation.
        let max_y = corners.iter().map(|c| c.y).fold(f64::MIN, f64::max);
        let max_x = corners.iter().map(|c| c.x).fold(f64::MIN, f64::max);
        assert!((max_y - 2.0).abs() < 1e-9);
        assert!((max_x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains() {
        let rect = Rect::new(Point::new(1.0, 1.0), 0.0, 2.0, 2.0);
        assert!(rect.contains(&Point::new(1.5, 0.5)));
        assert!(rect.contains(&Point::new(2.0, 2.0)));
        assert!(!rect.contains(&Point::new(2.1, 1.0)));
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(FRAC_PI_2) - FRAC_PI_2).abs() < 1e-9);
        assert!((wrap_angle(-3.0 * FRAC_PI_2) - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(&Point::new(5.0, 3.0), &a, &b) - 3.0).abs() < 1e-9);
        assert!((distance_to_segment(&Point::new(-4.0, 3.0), &a, &b) - 5.0).abs() < 1e-9);
        // Degenerate segment
        assert!((distance_to_segment(&Point::new(3.0, 4.0), &a, &a) - 5.0).abs() < 1e-9);
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-20.0..20.0f64, -20.0..20.0f64, -PI..PI, 0.5..8.0f64, 0.5..4.0f64)
            .prop_map(|(x, y, h, l, w)| Rect::new(Point::new(x, y), h, l, w))
    }

    proptest! {
        #[test]
        fn prop_collision_is_symmetric(a in arb_rect(), b in arb_rect()) {
            prop_assert_eq!(collides(&a, &b), collides(&b, &a));
        }

        #[test]
        fn prop_rect_overlaps_itself(a in arb_rect()) {
            prop_assert!(a.overlaps(&a));
        }

        #[test]
        fn prop_corners_are_contained(a in arb_rect()) {
            for corner in a.corners() {
                prop_assert!(a.contains(&corner));
            }
        }

        #[test]
        fn prop_wrapped_angle_in_range(angle in -100.0..100.0f64) {
            let w = wrap_angle(angle);
            prop_assert!(w > -PI - 1e-12 && w <= PI + 1e-12);
            prop_assert!((w.sin() - angle.sin()).abs() < 1e-9);
            prop_assert!((w.cos() - angle.cos()).abs() < 1e-9);
        }
    }
}
