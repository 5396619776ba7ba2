//! Immutable per-vehicle parameters and footprint construction.

use crate::geometry::{distance_to_segment, Point, Rect};
use crate::kinematics::State;
use serde::{Deserialize, Serialize};

/// Vehicle identifier: the position of the vehicle in the fleet.
pub type VehicleId = usize;

/// Circular goal region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Target {
    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the reference point of `state` lies within the acceptance radius.
    #[inline]
    pub fn contains(&self, state: &State) -> bool {
        self.distance(state) <= self.radius
    }

    #[inline]
    pub fn distance(&self, state: &State) -> f64 {
        (state.position() - self.position()).norm()
    }

    /// Whether the straight segment travelled from `from` to `to` passes
    /// within the acceptance radius. Catches fast vehicles stepping over the
    /// goal between two control steps.
    pub fn swept_by(&self, from: &State, to: &State) -> bool {
        distance_to_segment(&self.position(), &from.position(), &to.position()) <= self.radius
    }
}

/// Static description of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub id: VehicleId,
    pub name: String,
    pub color: String,
    /// Body length along the heading (m)
    pub length: f64,
    /// Body width (m)
    pub width: f64,
    /// Distance from the reference point to the body center along the heading
    pub center_offset: f64,
    /// Safety rectangle used for near-miss shaping
    pub safe_length: f64,
    pub safe_width: f64,
    pub max_speed: f64,
    pub init_state: State,
    pub target: Target,
    /// Reasoning level k
    pub level: u32,
}

impl VehicleParams {
    /// A 5 x 2 m car with an 8 x 2.4 m safety rectangle.
    pub fn new(id: VehicleId, name: impl Into<String>, init_state: State, target: Target) -> Self {
        Self {
            id,
            name: name.into(),
            color: "black".into(),
            length: 5.0,
            width: 2.0,
            center_offset: 1.0,
            safe_length: 8.0,
            safe_width: 2.4,
            max_speed: 8.0,
            init_state,
            target,
            level: 1,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[inline]
    fn body_center(&self, state: &State) -> Point {
        let (sin, cos) = state.heading.sin_cos();
        Point::new(
            state.x + self.center_offset * cos,
            state.y + self.center_offset * sin,
        )
    }

    /// Oriented body rectangle at `state`.
    pub fn footprint(&self, state: &State) -> Rect {
        Rect::new(
            self.body_center(state),
            state.heading,
            self.length,
            self.width,
        )
    }

    /// Oriented safety rectangle at `state`, sharing the body center.
    pub fn safety_footprint(&self, state: &State) -> Rect {
        Rect::new(
            self.body_center(state),
            state.heading,
            self.safe_length,
            self.safe_width,
        )
    }
}
