//! Turning a validated [`ScenarioConfig`] into a runnable scenario.

use anyhow::{Context, Result};
use engine_config::{OpponentReplanMode, ScenarioConfig};
use engine_core::{build_map, ActionDelta, ActionTable, State, Target, VehicleParams, World};
use mcts::{MctsConfig, OpponentReplan, Planner, RewardWeights};
use std::time::Duration;
use tracing::debug;

/// Everything a round needs: the world, the planner settings and the
/// simulation loop parameters.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Scenario name or path, as given on the command line
    pub name: String,
    pub config: ScenarioConfig,
    pub planner: Planner,
    /// Simulation step (s)
    pub delta_t: f64,
    pub max_simulation_time: f64,
    pub seed: u64,
}

impl Scenario {
    /// Resolve, load and build a scenario by name or path.
    pub fn load(name: &str) -> Result<Self> {
        let config = engine_config::load_config(name)
            .with_context(|| format!("failed to load scenario '{name}'"))?;
        Self::from_config(name, config)
    }

    /// Build from an already loaded configuration. The configuration is
    /// validated again here so callers may construct it in code.
    pub fn from_config(name: &str, config: ScenarioConfig) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("scenario '{name}' is invalid"))?;

        let actions = action_table(&config)?;
        let vehicles = vehicle_params(&config);
        let map = build_map(config.map.kind, config.map.map_size, config.map.lane_width);
        let world = World::new(map, vehicles, actions);
        let mcts = mcts_config(&config);

        debug!(
            scenario = name,
            vehicles = world.num_vehicles(),
            budget = ?mcts.budget(),
            max_step = mcts.max_step,
            "Scenario built"
        );

        Ok(Self {
            name: name.to_string(),
            delta_t: config.simulation.delta_t,
            max_simulation_time: config.simulation.max_simulation_time,
            seed: config.simulation.seed,
            planner: Planner::new(world, mcts),
            config,
        })
    }

    pub fn world(&self) -> &World {
        self.planner.world()
    }

    pub fn rounds(&self) -> u32 {
        self.config.simulation.rounds
    }

    pub fn output_path(&self) -> &str {
        &self.config.simulation.output_path
    }
}

fn action_table(config: &ScenarioConfig) -> Result<ActionTable> {
    let entries = config
        .action_table_degrees()
        .context("invalid action model")?;
    Ok(ActionTable::from_pairs(entries.into_iter().map(
        |(action, dv, dheading_deg)| (action, ActionDelta::new(dv, dheading_deg.to_radians())),
    )))
}

/// Vehicle parameters in id order (sorted by name).
fn vehicle_params(config: &ScenarioConfig) -> Vec<VehicleParams> {
    let defaults = &config.vehicle;
    config
        .vehicle_list
        .iter()
        .enumerate()
        .map(|(id, (name, entry))| {
            let init = &entry.init_state;
            let init_state = State::new(init.x, init.y, init.heading_deg.to_radians(), init.v);
            let target = Target {
                x: entry.target.x,
                y: entry.target.y,
                radius: entry.target.radius.unwrap_or(defaults.goal_radius),
            };

            let mut params = VehicleParams::new(id, name.as_str(), init_state, target)
                .with_level(config.level_of(entry))
                .with_color(entry.color.as_deref().unwrap_or(&defaults.color));
            params.length = defaults.length;
            params.width = defaults.width;
            params.center_offset = defaults.center_offset;
            params.safe_length = defaults.safe_length;
            params.safe_width = defaults.safe_width;
            params.max_speed = entry.max_speed.unwrap_or(defaults.max_speed);
            params
        })
        .collect()
}

fn mcts_config(config: &ScenarioConfig) -> MctsConfig {
    let planner = &config.planner;
    let reward = &config.reward;
    let replan = match planner.opponent_replan {
        OpponentReplanMode::Cached => OpponentReplan::Cached,
        OpponentReplanMode::EveryStep => OpponentReplan::EveryStep,
    };

    MctsConfig::default()
        .with_budget(planner.computation_budget)
        .with_time_budget(planner.time_budget_ms.map(Duration::from_millis))
        .with_max_step(planner.max_step)
        .with_c_uct(planner.c_uct)
        .with_gamma(planner.gamma)
        .with_action_set(planner.action_set.clone())
        .with_dt_plan(config.delta_t_plan())
        .with_inner_budget_divisor(planner.inner_budget_divisor)
        .with_opponent_replan(replan)
        .with_rewards(RewardWeights {
            w_progress: reward.w_progress,
            w_heading: reward.w_heading,
            w_safety: reward.w_safety,
            r_goal: reward.r_goal,
            r_collision: reward.r_collision,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::{InitStateEntry, TargetEntry, VehicleEntry};
    use engine_core::{Action, MapKind};
    use mcts::Budget;
    use std::f64::consts::FRAC_PI_2;

    fn entry(x: f64, y: f64, heading_deg: f64) -> VehicleEntry {
        VehicleEntry {
            init_state: InitStateEntry {
                x,
                y,
                heading_deg,
                v: 3.0,
            },
            target: TargetEntry {
                x: -x,
                y: -y,
                radius: None,
            },
            level: None,
            color: None,
            max_speed: None,
        }
    }

    fn two_vehicle_config() -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config
            .vehicle_list
            .insert("zulu".into(), entry(0.0, -20.0, 90.0));
        let mut alpha = entry(-20.0, -2.0, 0.0);
        alpha.level = Some(2);
        alpha.color = Some("blue".into());
        alpha.max_speed = Some(6.0);
        config.vehicle_list.insert("alpha".into(), alpha);
        config
    }

    #[test]
    fn vehicles_are_ordered_by_name() {
        let scenario = Scenario::from_config("test", two_vehicle_config()).unwrap();
        let world = scenario.world();

        assert_eq!(world.num_vehicles(), 2);
        assert_eq!(world.vehicle(0).name, "alpha");
        assert_eq!(world.vehicle(1).name, "zulu");
    }

    #[test]
    fn entries_override_vehicle_defaults() {
        let config = two_vehicle_config();
        let defaults = config.vehicle.clone();
        let scenario = Scenario::from_config("test", config).unwrap();

        let alpha = scenario.world().vehicle(0);
        assert_eq!(alpha.level, 2);
        assert_eq!(alpha.color, "blue");
        assert_eq!(alpha.max_speed, 6.0);

        let zulu = scenario.world().vehicle(1);
        assert_eq!(zulu.level, defaults.level);
        assert_eq!(zulu.color, defaults.color);
        assert_eq!(zulu.max_speed, defaults.max_speed);
        assert_eq!(zulu.target.radius, defaults.goal_radius);
        assert_eq!(zulu.length, defaults.length);
    }

    #[test]
    fn headings_are_converted_to_radians() {
        let scenario = Scenario::from_config("test", two_vehicle_config()).unwrap();
        let zulu = scenario.world().vehicle(1);
        assert!((zulu.init_state.heading - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn action_model_overrides_reach_the_world() {
        let mut config = two_vehicle_config();
        config.action_model.insert(
            "turn_left".into(),
            engine_config::ActionModelEntry {
                dv: None,
                dheading_deg: Some(30.0),
            },
        );
        let scenario = Scenario::from_config("test", config).unwrap();
        let delta = scenario.world().actions().delta(Action::TurnLeft);
        assert!((delta.dheading - 30f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn planner_settings_follow_the_config() {
        let mut config = two_vehicle_config();
        config.planner.computation_budget = 77;
        config.planner.max_step = 5;
        config.planner.delta_t_plan = Some(0.25);
        config.planner.opponent_replan = OpponentReplanMode::EveryStep;
        config.reward.r_goal = 42.0;

        let scenario = Scenario::from_config("test", config).unwrap();
        let mcts = scenario.planner.config();
        assert_eq!(mcts.budget(), Budget::Iterations(77));
        assert_eq!(mcts.max_step, 5);
        assert_eq!(mcts.dt_plan, 0.25);
        assert_eq!(mcts.opponent_replan, OpponentReplan::EveryStep);
        assert_eq!(mcts.rewards.r_goal, 42.0);
    }

    #[test]
    fn time_budget_selects_deadline() {
        let mut config = two_vehicle_config();
        config.planner.time_budget_ms = Some(20);
        let scenario = Scenario::from_config("test", config).unwrap();
        assert_eq!(
            scenario.planner.config().budget(),
            Budget::Deadline(Duration::from_millis(20))
        );
    }

    #[test]
    fn open_map_kind_is_honoured() {
        let mut config = two_vehicle_config();
        config.map.kind = MapKind::Open;
        let scenario = Scenario::from_config("test", config).unwrap();
        // Off-road on a crossroads map, still drivable on an open one.
        assert!(scenario
            .world()
            .is_inside_drivable(&engine_core::Point::new(10.0, 10.0)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = two_vehicle_config();
        config.simulation.delta_t = 0.0;
        let err = Scenario::from_config("broken", config).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[test]
    fn shipped_scenarios_load() {
        for name in [
            "unprotected_left_turn.toml",
            "solo_straight.toml",
            "head_on.toml",
            "four_way.toml",
        ] {
            let path = format!("{}/../config/{name}", env!("CARGO_MANIFEST_DIR"));
            let scenario = Scenario::load(&path).unwrap();
            assert!(scenario.world().num_vehicles() >= 1, "{name}");
        }
    }
}
