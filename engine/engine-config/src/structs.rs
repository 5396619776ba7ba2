//! Configuration struct definitions.
//!
//! All scenario structs with serde support and default values. Every section
//! can be omitted from a scenario file; `vehicle_list` is the only part a
//! scenario must provide.

use crate::defaults;
use engine_core::{Action, MapKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_delta_t() -> f64 {
    defaults::delta_t()
}
fn d_max_sim_time() -> f64 {
    defaults::max_simulation_time()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_rounds() -> u32 {
    defaults::rounds()
}
fn d_output_path() -> String {
    defaults::output_path().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_map_kind() -> MapKind {
    defaults::map_kind()
}
fn d_map_size() -> f64 {
    defaults::map_size()
}
fn d_lane_width() -> f64 {
    defaults::lane_width()
}
fn d_max_step() -> u32 {
    defaults::max_step()
}
fn d_budget() -> u32 {
    defaults::computation_budget()
}
fn d_c_uct() -> f64 {
    defaults::c_uct()
}
fn d_gamma() -> f64 {
    defaults::gamma()
}
fn d_action_set() -> Vec<Action> {
    defaults::action_set().to_vec()
}
fn d_inner_divisor() -> u32 {
    defaults::inner_budget_divisor()
}
fn d_opponent_replan() -> OpponentReplanMode {
    defaults::opponent_replan()
}
fn d_max_level() -> u32 {
    defaults::max_level()
}
fn d_w_progress() -> f64 {
    defaults::w_progress()
}
fn d_w_heading() -> f64 {
    defaults::w_heading()
}
fn d_w_safety() -> f64 {
    defaults::w_safety()
}
fn d_r_goal() -> f64 {
    defaults::r_goal()
}
fn d_r_collision() -> f64 {
    defaults::r_collision()
}
fn d_length() -> f64 {
    defaults::vehicle_length()
}
fn d_width() -> f64 {
    defaults::vehicle_width()
}
fn d_center_offset() -> f64 {
    defaults::center_offset()
}
fn d_safe_length() -> f64 {
    defaults::safe_length()
}
fn d_safe_width() -> f64 {
    defaults::safe_width()
}
fn d_max_speed() -> f64 {
    defaults::max_speed()
}
fn d_goal_radius() -> f64 {
    defaults::goal_radius()
}
fn d_level() -> u32 {
    defaults::vehicle_level()
}
fn d_color() -> String {
    defaults::vehicle_color().into()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// How opponents are re-planned inside rollouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentReplanMode {
    /// Decide once at rollout entry and reuse for every rollout step
    #[default]
    Cached,
    /// Re-plan at every rollout step
    EveryStep,
}

/// Root configuration structure matching a scenario file
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub vehicle: VehicleDefaultsConfig,
    /// Per-action overrides keyed by snake_case action name
    #[serde(default)]
    pub action_model: BTreeMap<String, ActionModelEntry>,
    /// Vehicles keyed by name; ids follow the sorted name order
    #[serde(default)]
    pub vehicle_list: BTreeMap<String, VehicleEntry>,
}

/// Simulation loop settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    #[serde(default = "d_delta_t")]
    pub delta_t: f64,
    #[serde(default = "d_max_sim_time")]
    pub max_simulation_time: f64,
    #[serde(default = "d_seed")]
    pub seed: u64,
    #[serde(default = "d_rounds")]
    pub rounds: u32,
    #[serde(default = "d_output_path")]
    pub output_path: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delta_t: defaults::delta_t(),
            max_simulation_time: defaults::max_simulation_time(),
            seed: defaults::seed(),
            rounds: defaults::rounds(),
            output_path: defaults::output_path().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Road geometry
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    #[serde(default = "d_map_kind")]
    pub kind: MapKind,
    #[serde(default = "d_map_size")]
    pub map_size: f64,
    #[serde(default = "d_lane_width")]
    pub lane_width: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            kind: defaults::map_kind(),
            map_size: defaults::map_size(),
            lane_width: defaults::lane_width(),
        }
    }
}

/// MCTS planner configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    #[serde(default = "d_max_step")]
    pub max_step: u32,
    #[serde(default = "d_budget")]
    pub computation_budget: u32,
    /// Wall-clock budget per plan call; replaces `computation_budget` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
    #[serde(default = "d_c_uct")]
    pub c_uct: f64,
    #[serde(default = "d_gamma")]
    pub gamma: f64,
    #[serde(default = "d_action_set")]
    pub action_set: Vec<Action>,
    /// Planning control step; `simulation.delta_t` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_t_plan: Option<f64>,
    #[serde(default = "d_inner_divisor")]
    pub inner_budget_divisor: u32,
    #[serde(default = "d_opponent_replan")]
    pub opponent_replan: OpponentReplanMode,
    #[serde(default = "d_max_level")]
    pub max_level: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_step: defaults::max_step(),
            computation_budget: defaults::computation_budget(),
            time_budget_ms: None,
            c_uct: defaults::c_uct(),
            gamma: defaults::gamma(),
            action_set: defaults::action_set().to_vec(),
            delta_t_plan: None,
            inner_budget_divisor: defaults::inner_budget_divisor(),
            opponent_replan: defaults::opponent_replan(),
            max_level: defaults::max_level(),
        }
    }
}

/// Reward shaping weights
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    #[serde(default = "d_w_progress")]
    pub w_progress: f64,
    #[serde(default = "d_w_heading")]
    pub w_heading: f64,
    #[serde(default = "d_w_safety")]
    pub w_safety: f64,
    #[serde(default = "d_r_goal")]
    pub r_goal: f64,
    #[serde(default = "d_r_collision")]
    pub r_collision: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            w_progress: defaults::w_progress(),
            w_heading: defaults::w_heading(),
            w_safety: defaults::w_safety(),
            r_goal: defaults::r_goal(),
            r_collision: defaults::r_collision(),
        }
    }
}

/// Values shared by every vehicle unless its entry overrides them
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleDefaultsConfig {
    #[serde(default = "d_length")]
    pub length: f64,
    #[serde(default = "d_width")]
    pub width: f64,
    #[serde(default = "d_center_offset")]
    pub center_offset: f64,
    #[serde(default = "d_safe_length")]
    pub safe_length: f64,
    #[serde(default = "d_safe_width")]
    pub safe_width: f64,
    #[serde(default = "d_max_speed")]
    pub max_speed: f64,
    #[serde(default = "d_goal_radius")]
    pub goal_radius: f64,
    #[serde(default = "d_level")]
    pub level: u32,
    #[serde(default = "d_color")]
    pub color: String,
}

impl Default for VehicleDefaultsConfig {
    fn default() -> Self {
        Self {
            length: defaults::vehicle_length(),
            width: defaults::vehicle_width(),
            center_offset: defaults::center_offset(),
            safe_length: defaults::safe_length(),
            safe_width: defaults::safe_width(),
            max_speed: defaults::max_speed(),
            goal_radius: defaults::goal_radius(),
            level: defaults::vehicle_level(),
            color: defaults::vehicle_color().into(),
        }
    }
}

/// Override of one action's effect. Unset fields keep the built-in value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionModelEntry {
    /// Speed change per step (m/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv: Option<f64>,
    /// Heading change per step (degrees)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dheading_deg: Option<f64>,
}

/// Initial pose of a vehicle. Heading is given in degrees.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InitStateEntry {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default)]
    pub v: f64,
}

/// Goal of a vehicle. `radius` falls back to `vehicle.goal_radius`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// One entry of `vehicle_list`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VehicleEntry {
    pub init_state: InitStateEntry,
    pub target: TargetEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
}

impl ScenarioConfig {
    /// Planning control step, falling back to the simulation step.
    pub fn delta_t_plan(&self) -> f64 {
        self.planner.delta_t_plan.unwrap_or(self.simulation.delta_t)
    }

    /// Reasoning level of a vehicle entry.
    pub fn level_of(&self, entry: &VehicleEntry) -> u32 {
        entry.level.unwrap_or(self.vehicle.level)
    }

    /// Vehicle names in id order.
    pub fn vehicle_names(&self) -> impl Iterator<Item = &str> {
        self.vehicle_list.keys().map(String::as_str)
    }
}
