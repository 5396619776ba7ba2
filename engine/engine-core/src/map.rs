//! Static road maps.
//!
//! A map answers three questions: whether a point is on drivable surface,
//! whether an oriented footprint touches forbidden geometry, and which lane
//! path leads from a start pose to a goal.

use crate::geometry::{Point, Rect};
use crate::kinematics::State;
use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::sync::Arc;

/// Static road geometry queried by the world model and the planner.
pub trait RoadMap: Send + Sync + fmt::Debug {
    /// Half side of the square map `[-size, size]²`.
    fn map_size(&self) -> f64;

    /// Whether `point` lies on drivable surface.
    fn is_drivable(&self, point: &Point) -> bool;

    /// Forbidden static blocks.
    fn obstacles(&self) -> &[Rect];

    /// Whether `point` lies inside the map square.
    fn in_bounds(&self, point: &Point) -> bool {
        let s = self.map_size();
        point.x.abs() <= s && point.y.abs() <= s
    }

    /// Whether a footprint leaves the map or overlaps a forbidden block.
    fn static_collision(&self, footprint: &Rect) -> bool {
        footprint.corners().iter().any(|c| !self.in_bounds(c))
            || self.obstacles().iter().any(|block| block.overlaps(footprint))
    }

    /// Reference path from `start` to `goal`. A straight line by default.
    fn route(&self, start: &State, goal: &Point) -> Route {
        Route::straight(start.position(), *goal)
    }
}

/// Two perpendicular roads crossing at the origin.
///
/// Each road has half-width `lane_width` (one lane per direction); the four
/// corner blocks between the roads are forbidden.
#[derive(Debug, Clone)]
pub struct Crossroads {
    map_size: f64,
    lane_width: f64,
    blocks: [Rect; 4],
}

impl Crossroads {
    pub fn new(map_size: f64, lane_width: f64) -> Self {
        let (s, w) = (map_size, lane_width);
        let blocks = [
            Rect::from_bounds(w, w, s, s),
            Rect::from_bounds(-s, w, -w, s),
            Rect::from_bounds(-s, -s, -w, -w),
            Rect::from_bounds(w, -s, s, -w),
        ];
        Self {
            map_size,
            lane_width,
            blocks,
        }
    }

    pub fn lane_width(&self) -> f64 {
        self.lane_width
    }

    /// Direction of travel when leaving towards `goal`: along the arm the
    /// goal lies on, away from the junction. `None` inside the junction.
    fn exit_heading(&self, goal: &Point) -> Option<f64> {
        let w = self.lane_width;
        if goal.x.abs() > w && goal.y.abs() <= w {
            Some(if goal.x > 0.0 { 0.0 } else { PI })
        } else if goal.y.abs() > w && goal.x.abs() <= w {
            Some(if goal.y > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 })
        } else {
            None
        }
    }
}

impl RoadMap for Crossroads {
    fn map_size(&self) -> f64 {
        self.map_size
    }

    fn is_drivable(&self, point: &Point) -> bool {
        self.in_bounds(point)
            && (point.x.abs() <= self.lane_width || point.y.abs() <= self.lane_width)
    }

    fn obstacles(&self) -> &[Rect] {
        &self.blocks
    }

    /// Keep the approach lane, turn with a radius of one lane width inside
    /// the junction, then follow the goal's arm.
    fn route(&self, start: &State, goal: &Point) -> Route {
        match self.exit_heading(goal) {
            Some(exit) => {
                Route::with_turn(start.position(), start.heading, exit, *goal, self.lane_width)
            }
            None => Route::straight(start.position(), *goal),
        }
    }
}

/// Empty square map without obstacles.
#[derive(Debug, Clone)]
pub struct OpenRoad {
    map_size: f64,
}

impl OpenRoad {
    pub fn new(map_size: f64) -> Self {
        Self { map_size }
    }
}

impl RoadMap for OpenRoad {
    fn map_size(&self) -> f64 {
        self.map_size
    }

    fn is_drivable(&self, point: &Point) -> bool {
        self.in_bounds(point)
    }

    fn obstacles(&self) -> &[Rect] {
        &[]
    }
}

/// Map selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    #[default]
    Crossroads,
    Open,
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKind::Crossroads => f.write_str("crossroads"),
            MapKind::Open => f.write_str("open"),
        }
    }
}

/// Build a shared map of the given kind.
pub fn build_map(kind: MapKind, map_size: f64, lane_width: f64) -> Arc<dyn RoadMap> {
    match kind {
        MapKind::Crossroads => Arc::new(Crossroads::new(map_size, lane_width)),
        MapKind::Open => Arc::new(OpenRoad::new(map_size)),
    }
}
