//! Command line configuration for the simulator binary.
//!
//! Defaults come from the embedded defaults file, overridden by environment
//! variables. CLI arguments take highest priority. Scenario keys live in the
//! scenario file and are handled by `engine_config`.

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

/// Scenario used when neither `--config` nor `LEVELK_CONFIG` is given.
pub const DEFAULT_SCENARIO: &str = "unprotected_left_turn.toml";

fn default_config() -> String {
    std::env::var("LEVELK_CONFIG").unwrap_or_else(|_| DEFAULT_SCENARIO.to_string())
}

fn default_log_level() -> String {
    std::env::var("LEVELK_SIMULATION_LOG_LEVEL")
        .unwrap_or_else(|_| engine_config::log_level().to_string())
}

#[derive(Parser, Debug, Clone)]
#[command(name = "decision-making")]
#[command(about = "Level-k MCTS decision making for vehicles at an unsignalized crossroads")]
#[command(
    long_about = "Runs repeated rounds of a crossroads scenario. Every tick each vehicle plans
its next action with a level-k Monte Carlo Tree Search against a frozen
snapshot of the world, then all vehicles move together.

Bare scenario names are resolved under the config/ directory."
)]
pub struct Cli {
    /// Number of rounds (defaults to the scenario's simulation.rounds)
    #[arg(long, short = 'r')]
    pub rounds: Option<u32>,

    /// Scenario file or bare scenario name
    #[arg(long, short = 'c', default_value_t = default_config())]
    pub config: String,

    /// Output directory (defaults to the scenario's simulation.output_path)
    #[arg(long = "output_path", short = 'o')]
    pub output_path: Option<String>,

    /// Log level (trace, debug, info, warn, err, critical)
    #[arg(long = "log_level", short = 'l', default_value_t = default_log_level())]
    pub log_level: String,

    /// Disable the per-tick vehicle status lines
    #[arg(long = "no_animation", short = 'n')]
    pub no_animation: bool,

    /// Write per-round trajectories and experiment stats as JSON
    #[arg(long = "save_fig", short = 'f')]
    pub save_fig: bool,
}

impl Cli {
    pub fn validate(&self) -> Result<()> {
        if self.rounds == Some(0) {
            return Err(anyhow!("rounds must be greater than 0"));
        }

        if self.config.trim().is_empty() {
            return Err(anyhow!("config cannot be empty"));
        }

        if matches!(self.output_path.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(anyhow!("output_path cannot be empty"));
        }

        if self.tracing_level().parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, err, critical",
                self.log_level
            ));
        }

        Ok(())
    }

    /// Log level in `tracing` terms: `err` and `critical` become `error`.
    pub fn tracing_level(&self) -> &str {
        match self.log_level.as_str() {
            "err" | "critical" => "error",
            other => other,
        }
    }

    pub fn show_animation(&self) -> bool {
        !self.no_animation
    }
}
