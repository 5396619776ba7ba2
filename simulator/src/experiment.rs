//! Repeated rounds of one scenario with round logging and export.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::export::TrajectoryExporter;
use crate::orchestrator::Orchestrator;
use crate::report::RoundReport;
use crate::scenario::Scenario;
use crate::stats::{ExperimentSnapshot, ExperimentStats};

/// Settings for one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentOptions {
    pub rounds: u32,
    pub animation: bool,
    /// Export directory; `None` disables `--save_fig` output
    pub exporter: Option<TrajectoryExporter>,
    /// Show a progress bar over rounds when stderr is a TTY
    pub progress: bool,
}

impl ExperimentOptions {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds,
            animation: false,
            exporter: None,
            progress: false,
        }
    }
}

pub struct Experiment<'a> {
    scenario: &'a Scenario,
    options: ExperimentOptions,
    stats: ExperimentStats,
}

impl<'a> Experiment<'a> {
    pub fn new(scenario: &'a Scenario, options: ExperimentOptions) -> Self {
        Self {
            stats: ExperimentStats::new(&scenario.name),
            scenario,
            options,
        }
    }

    pub fn stats(&self) -> &ExperimentStats {
        &self.stats
    }

    /// Run every round and return the final stats. Fails only on export
    /// errors.
    pub fn run(&self) -> Result<ExperimentSnapshot> {
        let progress = self.progress_bar()?;
        let orchestrator = Orchestrator::new(self.scenario).with_animation(self.options.animation);

        if let Some(exporter) = &self.options.exporter {
            exporter.write_scenario(&self.scenario.config)?;
        }

        for round in 0..self.options.rounds {
            with_suspended(&progress, || self.log_round_start(round));

            let report = orchestrator.run_round(round);
            self.stats.record(&report);
            with_suspended(&progress, || log_round_end(&report));

            if let Some(exporter) = &self.options.exporter {
                exporter.write_round(&report)?;
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }

        self.stats.log_summary();
        let snapshot = self.stats.snapshot();
        if let Some(exporter) = &self.options.exporter {
            exporter.write_stats(&snapshot)?;
        }
        Ok(snapshot)
    }

    fn progress_bar(&self) -> Result<Option<ProgressBar>> {
        if !self.options.progress || !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            return Ok(None);
        }
        let pb = ProgressBar::new(self.options.rounds as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rounds ({eta})")?
                .progress_chars("#>-"),
        );
        Ok(Some(pb))
    }

    fn log_round_start(&self, round: u32) {
        info!("================== Round {} ==================", round);
        for params in self.scenario.world().vehicles() {
            let init = &params.init_state;
            info!(
                "{} >>> init_x: {:.2}, init_y: {:.2}, init_v: {:.2}",
                params.name, init.x, init.y, init.v
            );
        }
    }
}

/// Run `f` with the progress bar hidden so log lines stay readable.
fn with_suspended<F: FnOnce()>(progress: &Option<ProgressBar>, f: F) {
    match progress {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}

fn log_round_end(report: &RoundReport) {
    if report.is_success() {
        info!(
            "Round {} successed, simulation time: {:.3} s, actual timecost: {:.3} s",
            report.round, report.simulation_time, report.wall_time
        );
    } else {
        for vehicle in report.collided() {
            warn!(round = report.round, vehicle = %vehicle.name, "Vehicle collided");
        }
        info!(
            outcome = ?report.outcome,
            "Round {} failed, simulation time: {:.3} s, actual timecost: {:.3} s",
            report.round, report.simulation_time, report.wall_time
        );
    }
}
