//! Per-tick orchestration of one round.
//!
//! Every tick the live joint state is frozen behind an `Arc`, all active
//! vehicles plan against that snapshot in parallel, and the chosen actions
//! are applied together. Vehicles never see each other's decisions for the
//! current tick.

use engine_core::{Action, JointState, State, VehicleId, World};
use mcts::{mix_seed, PlanOutcome, SearchStats};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::report::{PlanningSummary, RoundOutcome, RoundReport, VehicleReport};
use crate::scenario::Scenario;

/// Aggregated planning stats for a round.
#[derive(Debug, Default)]
struct RoundStats {
    plans: u64,
    iterations: u64,
    tree_nodes: u64,
    fallbacks: u64,
    search: SearchStats,
}

impl RoundStats {
    /// Add stats from a single plan call.
    fn add(&mut self, outcome: &PlanOutcome) {
        self.plans += 1;
        self.iterations += outcome.iterations as u64;
        self.tree_nodes += outcome.tree_nodes as u64;
        if outcome.fallback.is_some() {
            self.fallbacks += 1;
        }

        let stats = &outcome.stats;
        self.search.total_time_us += stats.total_time_us;
        self.search.selection_time_us += stats.selection_time_us;
        self.search.expansion_time_us += stats.expansion_time_us;
        self.search.rollout_time_us += stats.rollout_time_us;
        self.search.backprop_time_us += stats.backprop_time_us;
        self.search.kinematic_steps += stats.kinematic_steps;
        self.search.opponent_plans += stats.opponent_plans;
        self.search.opponent_iterations += stats.opponent_iterations;
        self.search.terminal_hits += stats.terminal_hits;
    }

    /// Log a summary of the round's planning work.
    fn log_summary(&self, round: u32) {
        if self.plans == 0 || self.search.total_time_us == 0 {
            return;
        }

        let total_us = self.search.total_time_us as f64;
        let pct = |part: u64| format!("{:.1}%", part as f64 / total_us * 100.0);

        debug!(
            round,
            plans = self.plans,
            total_ms = format!("{:.1}", total_us / 1000.0),
            avg_iterations = format!("{:.1}", self.iterations as f64 / self.plans as f64),
            selection_pct = pct(self.search.selection_time_us),
            expansion_pct = pct(self.search.expansion_time_us),
            rollout_pct = pct(self.search.rollout_time_us),
            backprop_pct = pct(self.search.backprop_time_us),
            kinematic_steps = self.search.kinematic_steps,
            opponent_plans = self.search.opponent_plans,
            opponent_iterations = self.search.opponent_iterations,
            terminal_hits = self.search.terminal_hits,
            fallbacks = self.fallbacks,
            "MCTS round stats"
        );
    }

    fn summary(&self) -> PlanningSummary {
        PlanningSummary {
            plans: self.plans,
            iterations: self.iterations,
            tree_nodes: self.tree_nodes,
            fallbacks: self.fallbacks,
            opponent_plans: self.search.opponent_plans as u64,
            kinematic_steps: self.search.kinematic_steps,
            plan_time_ms: self.search.total_time_us as f64 / 1000.0,
        }
    }
}

/// Collision flags after a tick.
#[derive(Debug, Default)]
struct CollisionCheck {
    pairs: Vec<(VehicleId, VehicleId)>,
    flagged: Vec<VehicleId>,
}

fn check_collisions(world: &World, joint: &JointState) -> CollisionCheck {
    let pairs = world.pairwise_collisions(joint);
    let mut flagged: Vec<VehicleId> = pairs.iter().flat_map(|&(i, j)| [i, j]).collect();

    for id in 0..joint.len() {
        if !joint.state(id).is_finite() {
            warn!(vehicle = %world.vehicle(id).name, "Numeric failure in vehicle state");
            flagged.push(id);
        } else if world.is_fatal(joint, id) {
            flagged.push(id);
        }
    }

    flagged.sort_unstable();
    flagged.dedup();
    CollisionCheck { pairs, flagged }
}

/// Seed for one plan call, derived from `(seed, round, tick, ego)`.
pub fn plan_seed(seed: u64, round: u32, tick: u32, ego: VehicleId) -> u64 {
    mix_seed(mix_seed(mix_seed(seed, round as u64), tick as u64), ego as u64)
}

/// Runs rounds of one scenario.
pub struct Orchestrator<'a> {
    scenario: &'a Scenario,
    animation: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            animation: false,
        }
    }

    /// Log one line per vehicle every tick.
    pub fn with_animation(mut self, animation: bool) -> Self {
        self.animation = animation;
        self
    }

    /// Run one round from the initial joint state until success, collision
    /// or timeout.
    pub fn run_round(&self, round: u32) -> RoundReport {
        let scenario = self.scenario;
        let world = scenario.world();
        let planner = &scenario.planner;
        let budget = planner.config().budget();
        let n = world.num_vehicles();

        let round_start = Instant::now();
        let mut live = Arc::new(world.initial_joint_state());
        let mut footprints: Vec<Vec<State>> = live.states.iter().map(|s| vec![*s]).collect();
        let mut expected: Vec<Vec<State>> = vec![Vec::new(); n];
        let mut collided = vec![false; n];
        let mut stats = RoundStats::default();
        let mut tick = 0u32;

        let outcome = loop {
            if live.all_parked() {
                break RoundOutcome::Success;
            }

            let check = check_collisions(world, &live);
            if !check.flagged.is_empty() {
                for &id in &check.flagged {
                    collided[id] = true;
                }
                break RoundOutcome::Collision { pairs: check.pairs };
            }

            if live.time > scenario.max_simulation_time {
                break RoundOutcome::Timeout;
            }

            let tick_start = Instant::now();
            let snapshot = Arc::clone(&live);
            let plans: Vec<Option<PlanOutcome>> = (0..n)
                .into_par_iter()
                .map(|ego| {
                    if snapshot.is_parked(ego) {
                        return None;
                    }
                    let seed = plan_seed(scenario.seed, round, tick, ego);
                    let level = world.vehicle(ego).level;
                    Some(planner.plan(ego, &snapshot, level, budget, seed))
                })
                .collect();

            let mut actions = Vec::with_capacity(n);
            for (ego, plan) in plans.into_iter().enumerate() {
                let action = match plan {
                    Some(plan) => {
                        stats.add(&plan);
                        if !plan.expected_trajectory.is_empty() {
                            expected[ego] = plan.expected_trajectory;
                        }
                        plan.action
                    }
                    None => Action::Brake,
                };
                actions.push(action);
            }

            let next = world.step_joint(&snapshot, &actions, scenario.delta_t);
            for (ego, state) in next.states.iter().enumerate() {
                if !snapshot.is_parked(ego) {
                    footprints[ego].push(*state);
                }
            }
            live = Arc::new(next);
            tick += 1;

            debug!(
                "simulation time {:.3} step cost {:.3} sec",
                live.time,
                tick_start.elapsed().as_secs_f64()
            );
            if self.animation {
                self.log_frame(&live, &actions);
            }
        };

        stats.log_summary(round);

        let vehicles = world
            .vehicles()
            .iter()
            .map(|params| VehicleReport {
                id: params.id,
                name: params.name.clone(),
                color: params.color.clone(),
                level: params.level,
                target: params.target,
                footprint: std::mem::take(&mut footprints[params.id]),
                expected_trajectory: std::mem::take(&mut expected[params.id]),
                reached_goal: live.is_parked(params.id),
                collided: collided[params.id],
            })
            .collect();

        RoundReport {
            round,
            outcome,
            simulation_time: live.time,
            wall_time: round_start.elapsed().as_secs_f64(),
            ticks: tick,
            vehicles,
            planning: stats.summary(),
        }
    }

    /// Text rendition of the current frame.
    fn log_frame(&self, joint: &JointState, actions: &[Action]) {
        let world = self.scenario.world();
        for (id, params) in world.vehicles().iter().enumerate() {
            let state = joint.state(id);
            let status = if joint.is_parked(id) { " (parked)" } else { "" };
            info!(
                "{} [level {}] x: {:.2}, y: {:.2}, v: {:.2}, action: {}{}",
                params.name, params.level, state.x, state.y, state.v, actions[id], status
            );
        }
    }
}
