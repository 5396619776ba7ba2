//! Scenario configuration for the crossroads simulator.
//!
//! This crate provides the scenario structs, the embedded defaults and the
//! loading logic shared by the simulator binary, its tests and the benches.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`LEVELK_<SECTION>_<KEY>`)
//! 2. The scenario file
//! 3. Built-in defaults (config.defaults.toml)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! LEVELK_<SECTION>_<KEY>=value
//!
//! Examples:
//!     LEVELK_PLANNER_COMPUTATION_BUDGET=500
//!     LEVELK_PLANNER_OPPONENT_REPLAN=every_step
//!     LEVELK_SIMULATION_SEED=7
//!     LEVELK_MAP_KIND=open
//! ```

mod defaults;
mod error;
mod loader;
mod structs;
mod validation;

pub use defaults::*;
pub use error::ConfigError;
pub use loader::{
    apply_env_overrides, apply_overrides, load_config, load_from_path, parse_scenario,
    resolve_config_path, CONFIG_SEARCH_DIRS, ENV_PREFIX,
};
pub use structs::*;

#[cfg(test)]
mod tests;
