//! Range checks and resolution of derived values.

use crate::error::ConfigError;
use crate::structs::ScenarioConfig;
use crate::{defaults, VehicleEntry};
use engine_core::Action;
use std::collections::HashSet;

type Result<T> = std::result::Result<T, ConfigError>;

fn positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be > 0, got {value}")))
    }
}

fn non_negative(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be >= 0, got {value}")))
    }
}

fn finite(key: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, "must be finite"))
    }
}

impl ScenarioConfig {
    /// Check every value for range and consistency.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        positive("simulation.delta_t", sim.delta_t)?;
        positive("simulation.max_simulation_time", sim.max_simulation_time)?;
        if sim.output_path.trim().is_empty() {
            return Err(ConfigError::invalid(
                "simulation.output_path",
                "cannot be empty",
            ));
        }

        let map = &self.map;
        positive("map.map_size", map.map_size)?;
        positive("map.lane_width", map.lane_width)?;
        if map.lane_width >= map.map_size {
            return Err(ConfigError::invalid(
                "map.lane_width",
                format!("must be smaller than map_size ({})", map.map_size),
            ));
        }

        let planner = &self.planner;
        if planner.max_step == 0 {
            return Err(ConfigError::invalid("planner.max_step", "must be >= 1"));
        }
        if planner.computation_budget == 0 {
            return Err(ConfigError::invalid(
                "planner.computation_budget",
                "must be >= 1",
            ));
        }
        if planner.time_budget_ms == Some(0) {
            return Err(ConfigError::invalid(
                "planner.time_budget_ms",
                "must be > 0 when set",
            ));
        }
        non_negative("planner.c_uct", planner.c_uct)?;
        if !(planner.gamma > 0.0 && planner.gamma <= 1.0) {
            return Err(ConfigError::invalid(
                "planner.gamma",
                format!("must be in (0, 1], got {}", planner.gamma),
            ));
        }
        if planner.action_set.is_empty() {
            return Err(ConfigError::invalid(
                "planner.action_set",
                "must list at least one action",
            ));
        }
        let mut seen = HashSet::new();
        for action in &planner.action_set {
            if !seen.insert(*action) {
                return Err(ConfigError::invalid(
                    "planner.action_set",
                    format!("duplicate action '{action}'"),
                ));
            }
        }
        if let Some(dt) = planner.delta_t_plan {
            positive("planner.delta_t_plan", dt)?;
        }
        if planner.inner_budget_divisor == 0 {
            return Err(ConfigError::invalid(
                "planner.inner_budget_divisor",
                "must be >= 1",
            ));
        }

        let reward = &self.reward;
        non_negative("reward.w_progress", reward.w_progress)?;
        non_negative("reward.w_heading", reward.w_heading)?;
        non_negative("reward.w_safety", reward.w_safety)?;
        non_negative("reward.r_goal", reward.r_goal)?;
        non_negative("reward.r_collision", reward.r_collision)?;

        let vehicle = &self.vehicle;
        positive("vehicle.length", vehicle.length)?;
        positive("vehicle.width", vehicle.width)?;
        finite("vehicle.center_offset", vehicle.center_offset)?;
        positive("vehicle.max_speed", vehicle.max_speed)?;
        positive("vehicle.goal_radius", vehicle.goal_radius)?;
        if vehicle.safe_length < vehicle.length || vehicle.safe_width < vehicle.width {
            return Err(ConfigError::invalid(
                "vehicle.safe_length",
                "safety rectangle must enclose the body",
            ));
        }

        self.action_table_degrees()?;

        if self.vehicle_list.is_empty() {
            return Err(ConfigError::invalid(
                "vehicle_list",
                "must contain at least one vehicle",
            ));
        }
        for (name, entry) in &self.vehicle_list {
            self.validate_vehicle(name, entry)?;
        }

        Ok(())
    }

    fn validate_vehicle(&self, name: &str, entry: &VehicleEntry) -> Result<()> {
        let key = |field: &str| format!("vehicle_list.{name}.{field}");

        finite(&key("init_state.x"), entry.init_state.x)?;
        finite(&key("init_state.y"), entry.init_state.y)?;
        finite(&key("init_state.heading_deg"), entry.init_state.heading_deg)?;
        finite(&key("target.x"), entry.target.x)?;
        finite(&key("target.y"), entry.target.y)?;
        if let Some(radius) = entry.target.radius {
            positive(&key("target.radius"), radius)?;
        }

        let max_speed = entry.max_speed.unwrap_or(self.vehicle.max_speed);
        positive(&key("max_speed"), max_speed)?;
        non_negative(&key("init_state.v"), entry.init_state.v)?;
        if entry.init_state.v > max_speed {
            return Err(ConfigError::invalid(
                key("init_state.v"),
                format!("exceeds max_speed {max_speed}"),
            ));
        }

        let level = self.level_of(entry);
        if level > self.planner.max_level {
            return Err(ConfigError::invalid(
                key("level"),
                format!(
                    "level {level} exceeds planner.max_level {}",
                    self.planner.max_level
                ),
            ));
        }

        if entry.color.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ConfigError::invalid(key("color"), "cannot be empty"));
        }
        Ok(())
    }

    /// Resolve the action model into `(action, dv, dheading_deg)` for every
    /// action, merging overrides over the built-in table.
    pub fn action_table_degrees(&self) -> Result<Vec<(Action, f64, f64)>> {
        let mut overrides = Vec::with_capacity(self.action_model.len());
        for (name, entry) in &self.action_model {
            let action: Action = name
                .parse()
                .map_err(|e| ConfigError::invalid(format!("action_model.{name}"), format!("{e}")))?;
            if let Some(dv) = entry.dv {
                finite(&format!("action_model.{name}.dv"), dv)?;
            }
            if let Some(dh) = entry.dheading_deg {
                finite(&format!("action_model.{name}.dheading_deg"), dh)?;
            }
            overrides.push((action, entry));
        }

        Action::ALL
            .into_iter()
            .map(|action| {
                let (base_dv, base_dh) = defaults::action_model(action).ok_or_else(|| {
                    ConfigError::invalid(
                        format!("action_model.{action}"),
                        "missing from built-in defaults",
                    )
                })?;
                let entry = overrides.iter().find(|(a, _)| *a == action).map(|(_, e)| *e);
                let dv = entry.and_then(|e| e.dv).unwrap_or(base_dv);
                let dh = entry.and_then(|e| e.dheading_deg).unwrap_or(base_dh);
                Ok((action, dv, dh))
            })
            .collect()
    }
}
