//! Discrete kinematic model: vehicle state, action set and one-step update.

use crate::geometry::{wrap_angle, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Planar pose plus scalar speed of one vehicle.
///
/// `(x, y)` is the reference point (rear axle) in meters, `heading` is in
/// radians and `v` in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub v: f64,
}

impl State {
    pub fn new(x: f64, y: f64, heading: f64, v: f64) -> Self {
        Self { x, y, heading, v }
    }

    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// False if any component is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading.is_finite() && self.v.is_finite()
    }
}

/// Discrete driving action chosen once per control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Maintain,
    Accelerate,
    Decelerate,
    TurnLeft,
    TurnRight,
    Brake,
}

impl Action {
    /// Every action in canonical order.
    pub const ALL: [Action; 6] = [
        Action::Maintain,
        Action::Accelerate,
        Action::Decelerate,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Brake,
    ];

    /// Stable snake_case name used in config files and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Maintain => "maintain",
            Action::Accelerate => "accelerate",
            Action::Decelerate => "decelerate",
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
            Action::Brake => "brake",
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Action::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// Speed and heading change applied by one action over a control step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionDelta {
    /// Speed change (m/s)
    pub dv: f64,
    /// Heading change (radians)
    pub dheading: f64,
}

impl ActionDelta {
    pub fn new(dv: f64, dheading: f64) -> Self {
        Self { dv, dheading }
    }
}

/// Lookup table from [`Action`] to its [`ActionDelta`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTable {
    deltas: [ActionDelta; 6],
}

impl ActionTable {
    pub fn new(deltas: [ActionDelta; 6]) -> Self {
        Self { deltas }
    }

    /// Build a table from `(action, delta)` pairs. Actions not listed keep a
    /// zero delta.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Action, ActionDelta)>,
    {
        let mut deltas = [ActionDelta::default(); 6];
        for (action, delta) in pairs {
            deltas[action.index()] = delta;
        }
        Self { deltas }
    }

    #[inline]
    pub fn delta(&self, action: Action) -> ActionDelta {
        self.deltas[action.index()]
    }
}

impl Default for ActionTable {
    /// 1 m/s speed steps, 22.5 degree turns and a 3 m/s brake.
    fn default() -> Self {
        let turn = 22.5_f64.to_radians();
        Self::from_pairs([
            (Action::Maintain, ActionDelta::new(0.0, 0.0)),
            (Action::Accelerate, ActionDelta::new(1.0, 0.0)),
            (Action::Decelerate, ActionDelta::new(-1.0, 0.0)),
            (Action::TurnLeft, ActionDelta::new(0.0, turn)),
            (Action::TurnRight, ActionDelta::new(0.0, -turn)),
            (Action::Brake, ActionDelta::new(-3.0, 0.0)),
        ])
    }
}

/// One-step state transition.
///
/// Speed is clamped to `[0, max_speed]` and heading wrapped before the
/// position is integrated with the new speed and heading.
pub fn apply(state: &State, delta: ActionDelta, dt: f64, max_speed: f64) -> State {
    let v = (state.v + delta.dv).clamp(0.0, max_speed);
    let heading = wrap_angle(state.heading + delta.dheading);
    let (sin, cos) = heading.sin_cos();
    State {
        x: state.x + v * cos * dt,
        y: state.y + v * sin * dt,
        heading,
        v,
    }
}
