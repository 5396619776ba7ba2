//! decision-making - level-k MCTS crossroads simulator
//!
//! Runs `--rounds` rounds of a scenario:
//! 1. Loads and validates the scenario file (bare names resolve under `config/`)
//! 2. Plans every vehicle in parallel each tick and advances the world
//! 3. Logs each round's outcome and the final success rate
//! 4. With `--save_fig`, writes per-round trajectories as JSON

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use simulator::config::Cli;
use simulator::{Experiment, ExperimentOptions, Scenario, TrajectoryExporter};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;

    init_tracing(cli.tracing_level())?;
    info!("log level : {}", cli.log_level);
    info!("config path: {}", cli.config);

    let scenario = Scenario::load(&cli.config)?;
    let rounds = cli.rounds.unwrap_or_else(|| scenario.rounds());
    let output_path = cli
        .output_path
        .clone()
        .unwrap_or_else(|| scenario.output_path().to_string());

    let exporter = if cli.save_fig {
        let exporter = TrajectoryExporter::create(Path::new(&output_path))
            .context("cannot prepare --save_fig output")?;
        Some(exporter)
    } else {
        None
    };

    info!(
        scenario = %scenario.name,
        vehicles = scenario.world().num_vehicles(),
        rounds,
        save_fig = cli.save_fig,
        "Starting experiment"
    );

    let options = ExperimentOptions {
        rounds,
        animation: cli.show_animation(),
        exporter,
        progress: true,
    };

    match Experiment::new(&scenario, options).run() {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Experiment failed: {:#}", e);
            Err(e)
        }
    }
}
