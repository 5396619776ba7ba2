//! Configuration loading logic.
//!
//! Handles locating scenario files, parsing them and applying environment
//! variable overrides.

use crate::error::ConfigError;
use crate::ScenarioConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directories searched for bare scenario names
pub const CONFIG_SEARCH_DIRS: &[&str] = &[
    "config",       // Current directory
    "../config",    // Parent directory (when running from a crate directory)
    "/app/config",  // Container image
];

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "LEVELK";

/// Locate a scenario file.
///
/// A path that exists is used as is. A bare file name is looked up in
/// [`CONFIG_SEARCH_DIRS`]; a missing `.toml` extension is added.
pub fn resolve_config_path(name: &str) -> Result<PathBuf, ConfigError> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }

    let is_bare = direct.components().count() == 1;
    if is_bare {
        let file_name = if direct.extension().is_some() {
            name.to_string()
        } else {
            format!("{name}.toml")
        };
        for dir in CONFIG_SEARCH_DIRS {
            let candidate = Path::new(dir).join(&file_name);
            if candidate.is_file() {
                debug!("Resolved {} to {}", name, candidate.display());
                return Ok(candidate);
            }
        }
    }

    Err(ConfigError::NotFound(
        name.to_string(),
        CONFIG_SEARCH_DIRS.join(", "),
    ))
}

/// Resolve, load and validate a scenario.
pub fn load_config(name: &str) -> Result<ScenarioConfig, ConfigError> {
    let path = resolve_config_path(name)?;
    load_from_path(&path)
}

/// Load, apply environment overrides and validate a scenario file.
pub fn load_from_path(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    info!("Loading scenario from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_scenario(&content, path)?;
    let config = apply_env_overrides(config);
    config.validate()?;
    Ok(config)
}

/// Parse scenario TOML without overrides or validation.
pub fn parse_scenario(content: &str, path: &Path) -> Result<ScenarioConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($lookup:expr, $config:expr, $section:ident . $field:ident) => {
        if let Some(v) = $lookup(&env_key(stringify!($section), stringify!($field))) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, etc.)
    ($lookup:expr, $config:expr, $section:ident . $field:ident, parse) => {
        let key = env_key(stringify!($section), stringify!($field));
        if let Some(raw) = $lookup(&key) {
            match raw.trim().parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", key, raw),
            }
        }
    };
    // Optional parseable field (Option<u64>, Option<f64>, etc.)
    ($lookup:expr, $config:expr, $section:ident . $field:ident, optional_parse) => {
        let key = env_key(stringify!($section), stringify!($field));
        if let Some(raw) = $lookup(&key) {
            match raw.trim().parse() {
                Ok(v) => $config.$section.$field = Some(v),
                Err(_) => warn!("Ignoring {}={}: not a valid value", key, raw),
            }
        }
    };
    // Serde-deserializable enum field given as its snake_case name
    ($lookup:expr, $config:expr, $section:ident . $field:ident, named) => {
        let key = env_key(stringify!($section), stringify!($field));
        if let Some(raw) = $lookup(&key) {
            let value = toml::Value::String(raw.trim().to_string());
            match value.try_into() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", key, raw),
            }
        }
    };
}

/// `LEVELK_<SECTION>_<KEY>`
fn env_key(section: &str, field: &str) -> String {
    format!(
        "{}_{}_{}",
        ENV_PREFIX,
        section.to_ascii_uppercase(),
        field.to_ascii_uppercase()
    )
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: LEVELK_<SECTION>_<KEY>
pub fn apply_env_overrides(config: ScenarioConfig) -> ScenarioConfig {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup.
pub fn apply_overrides<F>(mut config: ScenarioConfig, lookup: F) -> ScenarioConfig
where
    F: Fn(&str) -> Option<String>,
{
    // Simulation
    env_override!(lookup, config, simulation.delta_t, parse);
    env_override!(lookup, config, simulation.max_simulation_time, parse);
    env_override!(lookup, config, simulation.seed, parse);
    env_override!(lookup, config, simulation.rounds, parse);
    env_override!(lookup, config, simulation.output_path);
    env_override!(lookup, config, simulation.log_level);

    // Map
    env_override!(lookup, config, map.kind, named);
    env_override!(lookup, config, map.map_size, parse);
    env_override!(lookup, config, map.lane_width, parse);

    // Planner
    env_override!(lookup, config, planner.max_step, parse);
    env_override!(lookup, config, planner.computation_budget, parse);
    env_override!(lookup, config, planner.time_budget_ms, optional_parse);
    env_override!(lookup, config, planner.c_uct, parse);
    env_override!(lookup, config, planner.gamma, parse);
    env_override!(lookup, config, planner.delta_t_plan, optional_parse);
    env_override!(lookup, config, planner.inner_budget_divisor, parse);
    env_override!(lookup, config, planner.opponent_replan, named);
    env_override!(lookup, config, planner.max_level, parse);

    // Reward
    env_override!(lookup, config, reward.w_progress, parse);
    env_override!(lookup, config, reward.w_heading, parse);
    env_override!(lookup, config, reward.w_safety, parse);
    env_override!(lookup, config, reward.r_goal, parse);
    env_override!(lookup, config, reward.r_collision, parse);

    config
}
