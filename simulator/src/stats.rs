//! Experiment statistics across rounds.
//!
//! Counters are atomics so a progress reporter can read them while rounds
//! run. The snapshot is what `--save_fig` writes as `experiment_stats.json`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::report::{RoundOutcome, RoundReport};

/// Aggregated experiment statistics, designed for lock-free updates.
#[derive(Debug)]
pub struct ExperimentStats {
    scenario: String,
    rounds_completed: AtomicU32,
    successes: AtomicU32,
    collisions: AtomicU32,
    timeouts: AtomicU32,
    total_ticks: AtomicU64,
    /// Simulated time summed over rounds (microseconds)
    total_simulation_us: AtomicU64,
    total_iterations: AtomicU64,
    total_plans: AtomicU64,
    total_fallbacks: AtomicU64,
    start_time: Instant,
}

/// Serializable stats for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSnapshot {
    pub scenario: String,
    pub rounds_completed: u32,
    pub successes: u32,
    pub collisions: u32,
    pub timeouts: u32,
    /// Percentage of successful rounds
    pub success_rate: f64,
    pub avg_ticks: f64,
    pub avg_simulation_time: f64,
    pub avg_iterations_per_plan: f64,
    pub fallbacks: u64,
    pub runtime_seconds: f64,
    pub timestamp: u64,
}

impl ExperimentStats {
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            rounds_completed: AtomicU32::new(0),
            successes: AtomicU32::new(0),
            collisions: AtomicU32::new(0),
            timeouts: AtomicU32::new(0),
            total_ticks: AtomicU64::new(0),
            total_simulation_us: AtomicU64::new(0),
            total_iterations: AtomicU64::new(0),
            total_plans: AtomicU64::new(0),
            total_fallbacks: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a finished round.
    pub fn record(&self, report: &RoundReport) {
        self.rounds_completed.fetch_add(1, Ordering::Relaxed);
        let counter = match report.outcome {
            RoundOutcome::Success => &self.successes,
            RoundOutcome::Collision { .. } => &self.collisions,
            RoundOutcome::Timeout => &self.timeouts,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.total_ticks
            .fetch_add(report.ticks as u64, Ordering::Relaxed);
        self.total_simulation_us.fetch_add(
            (report.simulation_time * 1e6).round() as u64,
            Ordering::Relaxed,
        );
        self.total_iterations
            .fetch_add(report.planning.iterations, Ordering::Relaxed);
        self.total_plans
            .fetch_add(report.planning.plans, Ordering::Relaxed);
        self.total_fallbacks
            .fetch_add(report.planning.fallbacks, Ordering::Relaxed);
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed.load(Ordering::Relaxed)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::Relaxed)
    }

    /// Percentage of successful rounds; 0 before any round finished.
    pub fn success_rate(&self) -> f64 {
        let rounds = self.rounds_completed();
        if rounds == 0 {
            return 0.0;
        }
        self.successes() as f64 * 100.0 / rounds as f64
    }

    pub fn snapshot(&self) -> ExperimentSnapshot {
        let rounds = self.rounds_completed();
        let plans = self.total_plans.load(Ordering::Relaxed);
        let per_round = |total: f64| {
            if rounds > 0 {
                total / rounds as f64
            } else {
                0.0
            }
        };

        let avg_iterations_per_plan = if plans > 0 {
            self.total_iterations.load(Ordering::Relaxed) as f64 / plans as f64
        } else {
            0.0
        };

        ExperimentSnapshot {
            scenario: self.scenario.clone(),
            rounds_completed: rounds,
            successes: self.successes(),
            collisions: self.collisions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            success_rate: self.success_rate(),
            avg_ticks: per_round(self.total_ticks.load(Ordering::Relaxed) as f64),
            avg_simulation_time: per_round(
                self.total_simulation_us.load(Ordering::Relaxed) as f64 / 1e6,
            ),
            avg_iterations_per_plan,
            fallbacks: self.total_fallbacks.load(Ordering::Relaxed),
            runtime_seconds: self.start_time.elapsed().as_secs_f64(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Log the final experiment summary.
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!("\n=========================================");
        info!(
            "Experiment success {}/{}({:.2}%) rounds.",
            snapshot.successes, snapshot.rounds_completed, snapshot.success_rate
        );
        info!(
            collisions = snapshot.collisions,
            timeouts = snapshot.timeouts,
            avg_ticks = format!("{:.1}", snapshot.avg_ticks),
            avg_iterations = format!("{:.1}", snapshot.avg_iterations_per_plan),
            fallbacks = snapshot.fallbacks,
            runtime_s = format!("{:.1}", snapshot.runtime_seconds),
            "Experiment stats"
        );
    }
}
