//! Tests for the configuration module.

use super::*;
use engine_core::{Action, MapKind};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

const MINIMAL: &str = r#"
[vehicle_list.ego]
init_state = { x = -20.0, y = -2.0, heading_deg = 0.0, v = 4.0 }
target = { x = 20.0, y = -2.0 }
"#;

fn parse(content: &str) -> Result<ScenarioConfig, ConfigError> {
    parse_scenario(content, Path::new("inline.toml"))
}

#[test]
fn test_default_config() {
    let config = ScenarioConfig::default();
    assert!((config.simulation.delta_t - 0.5).abs() < f64::EPSILON);
    assert!((config.simulation.max_simulation_time - 30.0).abs() < f64::EPSILON);
    assert_eq!(config.simulation.seed, 42);
    assert_eq!(config.simulation.rounds, 5);
    assert_eq!(config.simulation.log_level, "info");
    assert_eq!(config.map.kind, MapKind::Crossroads);
    assert_eq!(config.planner.computation_budget, 200);
    assert_eq!(config.planner.time_budget_ms, None);
    assert_eq!(config.planner.opponent_replan, OpponentReplanMode::Cached);
    assert!(config.vehicle_list.is_empty());
}

#[test]
fn test_default_config_needs_vehicles() {
    let err = ScenarioConfig::default().validate().unwrap_err();
    assert!(err.to_string().contains("vehicle_list"));
}

#[test]
fn test_minimal_scenario_fills_defaults() {
    let config = parse(MINIMAL).unwrap();
    config.validate().unwrap();

    let ego = &config.vehicle_list["ego"];
    assert_eq!(ego.target.radius, None);
    assert_eq!(config.level_of(ego), 1);
    assert_eq!(config.planner.action_set, Action::ALL.to_vec());
    assert!((config.delta_t_plan() - config.simulation.delta_t).abs() < f64::EPSILON);
}

#[test]
fn test_sections_override_defaults() {
    let content = format!(
        r#"
[simulation]
delta_t = 0.25
seed = 7

[map]
kind = "open"

[planner]
computation_budget = 64
time_budget_ms = 50
action_set = ["maintain", "brake"]
delta_t_plan = 0.5
opponent_replan = "every_step"
{MINIMAL}"#
    );
    let config = parse(&content).unwrap();
    config.validate().unwrap();

    assert!((config.simulation.delta_t - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.simulation.seed, 7);
    assert!((config.simulation.max_simulation_time - 30.0).abs() < f64::EPSILON);
    assert_eq!(config.map.kind, MapKind::Open);
    assert_eq!(config.planner.computation_budget, 64);
    assert_eq!(config.planner.time_budget_ms, Some(50));
    assert_eq!(
        config.planner.action_set,
        vec![Action::Maintain, Action::Brake]
    );
    assert!((config.delta_t_plan() - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.planner.opponent_replan, OpponentReplanMode::EveryStep);
}

#[test]
fn test_vehicle_ids_follow_name_order() {
    let content = r#"
[vehicle_list.zeta]
init_state = { x = 0.0, y = -20.0 }
target = { x = 0.0, y = 20.0 }

[vehicle_list.alpha]
init_state = { x = -20.0, y = -2.0 }
target = { x = 20.0, y = -2.0 }
level = 2
color = "red"
"#;
    let config = parse(content).unwrap();
    let names: Vec<&str> = config.vehicle_names().collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(config.level_of(&config.vehicle_list["alpha"]), 2);
}

#[test]
fn test_unknown_field_is_parse_error() {
    let content = format!("[planner]\ncomputation_budjet = 10\n{MINIMAL}");
    let err = parse(&content).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_wrong_type_is_parse_error() {
    let content = format!("[planner]\nmax_step = \"eight\"\n{MINIMAL}");
    assert!(matches!(parse(&content), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_validate_rejects_out_of_range_values() {
    let cases: &[(&str, &str)] = &[
        ("[simulation]\ndelta_t = 0.0\n", "simulation.delta_t"),
        ("[planner]\ngamma = 1.5\n", "planner.gamma"),
        ("[planner]\nmax_step = 0\n", "planner.max_step"),
        ("[planner]\ncomputation_budget = 0\n", "planner.computation_budget"),
        ("[planner]\ninner_budget_divisor = 0\n", "planner.inner_budget_divisor"),
        ("[planner]\ntime_budget_ms = 0\n", "planner.time_budget_ms"),
        ("[planner]\naction_set = []\n", "planner.action_set"),
        (
            "[planner]\naction_set = [\"brake\", \"brake\"]\n",
            "planner.action_set",
        ),
        ("[map]\nlane_width = 30.0\n", "map.lane_width"),
        ("[reward]\nw_safety = -1.0\n", "reward.w_safety"),
        ("[vehicle]\nsafe_width = 1.0\n", "vehicle.safe_length"),
    ];

    for (section, key) in cases {
        let config = parse(&format!("{section}{MINIMAL}")).unwrap();
        match config.validate() {
            Err(ConfigError::Invalid { key: got, .. }) => assert_eq!(&got, key, "{section}"),
            other => panic!("expected Invalid for {key}, got {other:?}"),
        }
    }
}

#[test]
fn test_validate_rejects_level_above_max() {
    let content = r#"
[planner]
max_level = 2

[vehicle_list.ego]
init_state = { x = -20.0, y = -2.0 }
target = { x = 20.0, y = -2.0 }
level = 3
"#;
    let err = parse(content).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("vehicle_list.ego.level"));
}

#[test]
fn test_validate_rejects_initial_speed_above_max() {
    let content = r#"
[vehicle_list.ego]
init_state = { x = -20.0, y = -2.0, v = 9.0 }
target = { x = 20.0, y = -2.0 }
max_speed = 6.0
"#;
    let err = parse(content).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("init_state.v"));
}

#[test]
fn test_action_model_override_merges_per_field() {
    let content = format!("[action_model.turn_left]\ndheading_deg = 30.0\n{MINIMAL}");
    let config = parse(&content).unwrap();
    let table = config.action_table_degrees().unwrap();

    assert_eq!(table.len(), Action::ALL.len());
    let turn_left = table.iter().find(|(a, _, _)| *a == Action::TurnLeft).unwrap();
    assert_eq!((turn_left.1, turn_left.2), (0.0, 30.0));
    let brake = table.iter().find(|(a, _, _)| *a == Action::Brake).unwrap();
    assert_eq!((brake.1, brake.2), (-3.0, 0.0));
}

#[test]
fn test_action_model_rejects_unknown_action() {
    let content = format!("[action_model.reverse]\ndv = -1.0\n{MINIMAL}");
    let err = parse(&content).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("action_model.reverse"));
}

#[test]
fn test_overrides_from_lookup() {
    let env: HashMap<&str, &str> = [
        ("LEVELK_PLANNER_COMPUTATION_BUDGET", "500"),
        ("LEVELK_PLANNER_OPPONENT_REPLAN", "every_step"),
        ("LEVELK_PLANNER_TIME_BUDGET_MS", "25"),
        ("LEVELK_MAP_KIND", "open"),
        ("LEVELK_SIMULATION_OUTPUT_PATH", "/tmp/out"),
        ("LEVELK_REWARD_W_SAFETY", "0.25"),
    ]
    .into_iter()
    .collect();

    let config = apply_overrides(parse(MINIMAL).unwrap(), |key| {
        env.get(key).map(|v| v.to_string())
    });
    assert_eq!(config.planner.computation_budget, 500);
    assert_eq!(config.planner.opponent_replan, OpponentReplanMode::EveryStep);
    assert_eq!(config.planner.time_budget_ms, Some(25));
    assert_eq!(config.map.kind, MapKind::Open);
    assert_eq!(config.simulation.output_path, "/tmp/out");
    assert!((config.reward.w_safety - 0.25).abs() < f64::EPSILON);
}

#[test]
fn test_invalid_override_is_ignored() {
    let config = apply_overrides(parse(MINIMAL).unwrap(), |key| match key {
        "LEVELK_PLANNER_MAX_STEP" => Some("many".to_string()),
        "LEVELK_PLANNER_OPPONENT_REPLAN" => Some("sometimes".to_string()),
        _ => None,
    });
    assert_eq!(config.planner.max_step, 8);
    assert_eq!(config.planner.opponent_replan, OpponentReplanMode::Cached);
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "[planner]\nmax_step = 5\n{MINIMAL}").unwrap();

    let config = load_from_path(file.path()).unwrap();
    assert_eq!(config.planner.max_step, 5);
    assert_eq!(config.vehicle_list.len(), 1);

    let resolved = resolve_config_path(file.path().to_str().unwrap()).unwrap();
    assert_eq!(resolved, file.path());
}

#[test]
fn test_load_from_path_rejects_invalid_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, format!("[planner]\ngamma = 0.0\n{MINIMAL}")).unwrap();
    assert!(matches!(
        load_from_path(&path),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    let err = resolve_config_path("definitely_not_a_scenario").unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(..)));
}

#[test]
fn test_shipped_scenarios_are_valid() {
    let shipped = [
        (
            "unprotected_left_turn",
            include_str!("../../../config/unprotected_left_turn.toml"),
        ),
        (
            "solo_straight",
            include_str!("../../../config/solo_straight.toml"),
        ),
        ("head_on", include_str!("../../../config/head_on.toml")),
        ("four_way", include_str!("../../../config/four_way.toml")),
    ];
    for (name, content) in shipped {
        let config = parse(content).unwrap_or_else(|e| panic!("{name}: {e}"));
        config
            .validate()
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}
