//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time, so
//! the binary, the tests and the shipped scenario files agree on every value
//! a scenario leaves out.

use crate::structs::OpponentReplanMode;
use engine_core::{Action, MapKind};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    simulation: SimulationDefaults,
    map: MapDefaults,
    planner: PlannerDefaults,
    reward: RewardDefaults,
    vehicle: VehicleDefaults,
    action_model: BTreeMap<String, ActionModelDefaults>,
}

#[derive(Debug, Deserialize)]
struct SimulationDefaults {
    delta_t: f64,
    max_simulation_time: f64,
    seed: u64,
    rounds: u32,
    output_path: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MapDefaults {
    kind: MapKind,
    map_size: f64,
    lane_width: f64,
}

#[derive(Debug, Deserialize)]
struct PlannerDefaults {
    max_step: u32,
    computation_budget: u32,
    c_uct: f64,
    gamma: f64,
    action_set: Vec<Action>,
    inner_budget_divisor: u32,
    opponent_replan: OpponentReplanMode,
    max_level: u32,
}

#[derive(Debug, Deserialize)]
struct RewardDefaults {
    w_progress: f64,
    w_heading: f64,
    w_safety: f64,
    r_goal: f64,
    r_collision: f64,
}

#[derive(Debug, Deserialize)]
struct VehicleDefaults {
    length: f64,
    width: f64,
    center_offset: f64,
    safe_length: f64,
    safe_width: f64,
    max_speed: f64,
    goal_radius: f64,
    level: u32,
    color: String,
}

#[derive(Debug, Deserialize)]
struct ActionModelDefaults {
    dv: f64,
    dheading_deg: f64,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Simulation
pub fn delta_t() -> f64 {
    DEFAULTS.simulation.delta_t
}
pub fn max_simulation_time() -> f64 {
    DEFAULTS.simulation.max_simulation_time
}
pub fn seed() -> u64 {
    DEFAULTS.simulation.seed
}
pub fn rounds() -> u32 {
    DEFAULTS.simulation.rounds
}
pub fn output_path() -> &'static str {
    &DEFAULTS.simulation.output_path
}
pub fn log_level() -> &'static str {
    &DEFAULTS.simulation.log_level
}

// Map
pub fn map_kind() -> MapKind {
    DEFAULTS.map.kind
}
pub fn map_size() -> f64 {
    DEFAULTS.map.map_size
}
pub fn lane_width() -> f64 {
    DEFAULTS.map.lane_width
}

// Planner
pub fn max_step() -> u32 {
    DEFAULTS.planner.max_step
}
pub fn computation_budget() -> u32 {
    DEFAULTS.planner.computation_budget
}
pub fn c_uct() -> f64 {
    DEFAULTS.planner.c_uct
}
pub fn gamma() -> f64 {
    DEFAULTS.planner.gamma
}
pub fn action_set() -> &'static [Action] {
    &DEFAULTS.planner.action_set
}
pub fn inner_budget_divisor() -> u32 {
    DEFAULTS.planner.inner_budget_divisor
}
pub fn opponent_replan() -> OpponentReplanMode {
    DEFAULTS.planner.opponent_replan
}
pub fn max_level() -> u32 {
    DEFAULTS.planner.max_level
}

// Reward
pub fn w_progress() -> f64 {
    DEFAULTS.reward.w_progress
}
pub fn w_heading() -> f64 {
    DEFAULTS.reward.w_heading
}
pub fn w_safety() -> f64 {
    DEFAULTS.reward.w_safety
}
pub fn r_goal() -> f64 {
    DEFAULTS.reward.r_goal
}
pub fn r_collision() -> f64 {
    DEFAULTS.reward.r_collision
}

// Vehicle
pub fn vehicle_length() -> f64 {
    DEFAULTS.vehicle.length
}
pub fn vehicle_width() -> f64 {
    DEFAULTS.vehicle.width
}
pub fn center_offset() -> f64 {
    DEFAULTS.vehicle.center_offset
}
pub fn safe_length() -> f64 {
    DEFAULTS.vehicle.safe_length
}
pub fn safe_width() -> f64 {
    DEFAULTS.vehicle.safe_width
}
pub fn max_speed() -> f64 {
    DEFAULTS.vehicle.max_speed
}
pub fn goal_radius() -> f64 {
    DEFAULTS.vehicle.goal_radius
}
pub fn vehicle_level() -> u32 {
    DEFAULTS.vehicle.level
}
pub fn vehicle_color() -> &'static str {
    &DEFAULTS.vehicle.color
}

// Action model
/// Default `(dv, dheading_deg)` for an action.
pub fn action_model(action: Action) -> Option<(f64, f64)> {
    DEFAULTS
        .action_model
        .get(action.name())
        .map(|m| (m.dv, m.dheading_deg))
}
