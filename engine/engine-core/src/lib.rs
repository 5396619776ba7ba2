//! World model for the crossroads simulator
//!
//! This crate provides the deterministic pieces every planner and the
//! orchestrator share:
//! - `geometry`: oriented rectangles and separating-axis overlap
//! - `kinematics`: vehicle state, discrete actions and the one-step update
//! - `vehicle`: per-vehicle parameters, footprints and goal regions
//! - `map`: the `RoadMap` trait with crossroads and open-road maps
//! - `route`: lane-following reference paths used for progress and heading
//! - `joint`: the joint state of all vehicles
//! - `world`: map, fleet and action table bundled behind collision queries

pub mod geometry;
pub mod joint;
pub mod kinematics;
pub mod map;
pub mod route;
pub mod vehicle;
pub mod world;

// Re-export main types for convenience
pub use geometry::{collides, wrap_angle, Point, Rect};
pub use joint::JointState;
pub use kinematics::{apply, Action, ActionDelta, ActionTable, ParseActionError, State};
pub use map::{build_map, Crossroads, MapKind, OpenRoad, RoadMap};
pub use route::{Projection, Route, HEADING_LOOKAHEAD};
pub use vehicle::{Target, VehicleId, VehicleParams};
pub use world::World;
