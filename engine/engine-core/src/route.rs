//! Reference paths from a vehicle's start to its goal.
//!
//! A route is a polyline. Turns are rounded with a circular arc so that the
//! tangent changes gradually through a junction. Progress is measured as arc
//! length along the route and the heading reference is the bearing to a
//! point a fixed distance further along it.

use crate::geometry::Point;
use nalgebra::Vector2;

/// Distance ahead along the route at which the heading reference is taken.
pub const HEADING_LOOKAHEAD: f64 = 5.0;

/// Segments used to approximate one rounded turn.
const ARC_SEGMENTS: usize = 8;

/// Closest point of a route to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Arc length of the closest point. Negative behind the start and past
    /// `length()` beyond the end.
    pub s: f64,
    /// Distance from the query point to the route
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<Point>,
    /// Arc length at every point
    cumulative: Vec<f64>,
}

impl Route {
    /// Polyline through `points`. Repeated points are dropped.
    pub fn new(points: Vec<Point>) -> Self {
        let mut kept: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            if kept.last().map_or(true, |last| (p - *last).norm() > 1e-9) {
                kept.push(p);
            }
        }

        let mut cumulative = Vec::with_capacity(kept.len());
        let mut total = 0.0;
        for (i, p) in kept.iter().enumerate() {
            if i > 0 {
                total += (p - kept[i - 1]).norm();
            }
            cumulative.push(total);
        }

        Self {
            points: kept,
            cumulative,
        }
    }

    pub fn straight(from: Point, to: Point) -> Self {
        Self::new(vec![from, to])
    }

    /// Straight approach from `from` along `heading`, a turn of `radius` and
    /// a straight exit along `exit_heading` that ends at `to`.
    ///
    /// Falls back to a straight line when the two directions are parallel or
    /// the corner lies behind either end.
    pub fn with_turn(from: Point, heading: f64, exit_heading: f64, to: Point, radius: f64) -> Self {
        let d = Vector2::new(heading.cos(), heading.sin());
        let e = Vector2::new(exit_heading.cos(), exit_heading.sin());
        let cross = d.perp(&e);
        if cross.abs() < 1e-6 {
            return Self::straight(from, to);
        }

        // Corner where the approach line meets the exit line: from + t·d = to - u·e
        let r = to - from;
        let t = r.perp(&e) / cross;
        let u = d.perp(&r) / cross;
        if t <= 0.0 || u <= 0.0 {
            return Self::straight(from, to);
        }
        let corner = from + d * t;

        let turn = cross.atan2(d.dot(&e));
        let half_tan = (turn.abs() / 2.0).tan();
        let radius = radius.min(t.min(u) / half_tan).max(0.0);
        if radius <= 1e-9 {
            return Self::new(vec![from, corner, to]);
        }

        let tangent = radius * half_tan;
        let arc_start = corner - d * tangent;
        let normal = Vector2::new(-d.y, d.x) * turn.signum();
        let center = arc_start + normal * radius;
        let start_angle = (arc_start.y - center.y).atan2(arc_start.x - center.x);

        let mut points = vec![from];
        for i in 0..=ARC_SEGMENTS {
            let angle = start_angle + turn * i as f64 / ARC_SEGMENTS as f64;
            points.push(center + Vector2::new(angle.cos(), angle.sin()) * radius);
        }
        points.push(to);
        Self::new(points)
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn start(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Closest point of the route to `p`. The first and last segments are
    /// extended past the route ends.
    pub fn project(&self, p: &Point) -> Projection {
        let n = self.points.len();
        if n < 2 {
            let offset = self.points.first().map_or(0.0, |q| (p - q).norm());
            return Projection { s: 0.0, offset };
        }

        let mut best = Projection {
            s: 0.0,
            offset: f64::INFINITY,
        };
        for i in 0..n - 1 {
            let (a, b) = (&self.points[i], &self.points[i + 1]);
            let ab = b - a;
            let len = ab.norm();
            let mut t = (p - a).dot(&ab) / (len * len);
            if i > 0 {
                t = t.max(0.0);
            }
            if i < n - 2 {
                t = t.min(1.0);
            }
            let offset = (p - (a + ab * t)).norm();
            if offset < best.offset {
                best = Projection {
                    s: self.cumulative[i] + t * len,
                    offset,
                };
            }
        }
        best
    }

    /// Point at arc length `s`, extrapolated along the end tangents outside
    /// `[0, length()]`.
    pub fn point_at(&self, s: f64) -> Point {
        let n = self.points.len();
        match n {
            0 => Point::origin(),
            1 => self.points[0],
            _ => {
                let i = match self.cumulative.binary_search_by(|c| c.total_cmp(&s)) {
                    Ok(i) => i.min(n - 2),
                    Err(i) => i.clamp(1, n - 1) - 1,
                };
                let (a, b) = (&self.points[i], &self.points[i + 1]);
                let len = self.cumulative[i + 1] - self.cumulative[i];
                a + (b - a) * ((s - self.cumulative[i]) / len)
            }
        }
    }

    /// Distance left to the end of the route: arc length plus the offset
    /// from the route.
    pub fn remaining(&self, p: &Point) -> f64 {
        let projection = self.project(p);
        (self.length() - projection.s).abs() + projection.offset
    }

    /// Bearing from `p` to the route point `lookahead` ahead of its
    /// projection.
    pub fn heading_reference(&self, p: &Point, lookahead: f64) -> f64 {
        let s = self.project(p).s.max(0.0) + lookahead;
        let ahead = self.point_at(s);
        let delta = ahead - p;
        if delta.norm() <= 1e-9 {
            return self.tangent_at(s);
        }
        delta.y.atan2(delta.x)
    }

    /// Direction of the route at arc length `s`.
    pub fn tangent_at(&self, s: f64) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let step = 1e-3;
        let (a, b) = (self.point_at(s - step), self.point_at(s + step));
        let delta = b - a;
        if delta.norm() <= 1e-12 {
            return 0.0;
        }
        delta.y.atan2(delta.x)
    }
}
