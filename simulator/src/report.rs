//! Per-round results, serializable for trajectory export.

use engine_core::{State, Target, VehicleId};
use serde::{Deserialize, Serialize};

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Every vehicle reached its goal
    Success,
    /// At least one vehicle collided. `pairs` lists vehicle-vehicle contacts;
    /// a static or numeric failure shows up only in the vehicle flags.
    Collision { pairs: Vec<(VehicleId, VehicleId)> },
    /// `max_simulation_time` elapsed first
    Timeout,
}

impl RoundOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RoundOutcome::Success)
    }
}

/// One vehicle's view of a finished round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleReport {
    pub id: VehicleId,
    pub name: String,
    pub color: String,
    pub level: u32,
    pub target: Target,
    /// Executed states, starting with the initial state
    pub footprint: Vec<State>,
    /// Principal variation of the vehicle's last search tree
    pub expected_trajectory: Vec<State>,
    pub reached_goal: bool,
    pub collided: bool,
}

/// Aggregate planning work of a round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningSummary {
    pub plans: u64,
    pub iterations: u64,
    pub tree_nodes: u64,
    pub fallbacks: u64,
    pub opponent_plans: u64,
    pub kinematic_steps: u64,
    pub plan_time_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub outcome: RoundOutcome,
    /// Simulated seconds at termination
    pub simulation_time: f64,
    /// Wall-clock seconds spent on the round
    pub wall_time: f64,
    pub ticks: u32,
    pub vehicles: Vec<VehicleReport>,
    pub planning: PlanningSummary,
}

impl RoundReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn collided(&self) -> impl Iterator<Item = &VehicleReport> {
        self.vehicles.iter().filter(|v| v.collided)
    }
}
