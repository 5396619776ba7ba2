//! Level-k opponent models.
//!
//! A level-k vehicle assumes every other vehicle reasons at level k-1. Level 0
//! is a fixed reactive policy; every higher level runs its own tree search
//! with a reduced budget. Policies are plain functions in a table indexed by
//! `min(level, 1)`, so recursion happens through [`Planner::plan`] rather than
//! through nested planner objects.

use engine_core::{Action, JointState, VehicleId};

use crate::config::Budget;
use crate::search::{mix_seed, Planner};

/// One opponent decision to be made on a joint state.
#[derive(Debug, Clone, Copy)]
pub struct OpponentQuery<'a> {
    /// Vehicle whose action is predicted
    pub opponent: VehicleId,
    pub joint: &'a JointState,
    /// Reasoning level the opponent is modelled at
    pub level: u32,
    /// Budget of the opponent's own search
    pub budget: Budget,
    pub seed: u64,
}

/// A predicted action and the search work it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub action: Action,
    pub iterations: u32,
}

/// Predicted actions of a whole fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predictions {
    /// One action per vehicle; the ego slot holds `Maintain`
    pub actions: Vec<Action>,
    /// Iterations spent in nested searches
    pub iterations: u64,
}

pub type LevelPolicy = fn(&Planner, &OpponentQuery<'_>) -> Prediction;

/// `[reactive, tree search]`
pub const POLICIES: [LevelPolicy; 2] = [reactive_policy, tree_policy];

/// Policy for a vehicle reasoning at `level`.
pub fn policy_for(level: u32) -> LevelPolicy {
    POLICIES[level.min(1) as usize]
}

/// Level 0: keep the current speed and heading.
pub fn reactive_policy(_planner: &Planner, _query: &OpponentQuery<'_>) -> Prediction {
    Prediction {
        action: Action::Maintain,
        iterations: 0,
    }
}

/// Level k ≥ 1: search with the query budget, the opponent as ego.
pub fn tree_policy(planner: &Planner, query: &OpponentQuery<'_>) -> Prediction {
    let outcome = planner.plan(query.opponent, query.joint, query.level, query.budget, query.seed);
    Prediction {
        action: outcome.action,
        iterations: outcome.iterations,
    }
}

/// Predicted actions of every vehicle other than `ego`, which reasons at
/// `ego_level` under `budget`.
///
/// Opponents search with [`MctsConfig::inner_budget`] of that budget. The ego
/// slot holds `Maintain` as a placeholder for the caller to overwrite. Parked
/// vehicles brake.
///
/// [`MctsConfig::inner_budget`]: crate::config::MctsConfig::inner_budget
pub fn opponent_actions(
    planner: &Planner,
    ego: VehicleId,
    joint: &JointState,
    ego_level: u32,
    budget: Budget,
    seed: u64,
) -> Predictions {
    let level = ego_level.saturating_sub(1);
    let policy = policy_for(level);
    let inner = planner.config().inner_budget(budget);

    let mut iterations = 0u64;
    let actions = (0..joint.len())
        .map(|id| {
            if id == ego {
                Action::Maintain
            } else if joint.is_parked(id) {
                Action::Brake
            } else {
                let query = OpponentQuery {
                    opponent: id,
                    joint,
                    level,
                    budget: inner,
                    seed: mix_seed(seed, id as u64),
                };
                let prediction = policy(planner, &query);
                iterations += prediction.iterations as u64;
                prediction.action
            }
        })
        .collect();

    Predictions {
        actions,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MctsConfig;
    use engine_core::{ActionTable, OpenRoad, State, Target, VehicleParams, World};
    use std::f64::consts::PI;
    use std::sync::Arc;

    fn world() -> World {
        let vehicles = vec![
            VehicleParams::new(
                0,
                "a",
                State::new(-20.0, -2.0, 0.0, 4.0),
                Target {
                    x: 20.0,
                    y: -2.0,
                    radius: 2.0,
                },
            ),
            VehicleParams::new(
                1,
                "b",
                State::new(20.0, 2.0, PI, 4.0),
                Target {
                    x: -20.0,
                    y: 2.0,
                    radius: 2.0,
                },
            ),
            VehicleParams::new(
                2,
                "c",
                State::new(0.0, -20.0, PI / 2.0, 0.0),
                Target {
                    x: 0.0,
                    y: -20.0,
                    radius: 2.0,
                },
            ),
        ];
        World::new(
            Arc::new(OpenRoad::new(25.0)),
            vehicles,
            ActionTable::default(),
        )
    }

    fn planner() -> Planner {
        Planner::new(world(), MctsConfig::for_testing().with_budget(20))
    }

    #[test]
    fn test_policy_table_dispatch() {
        let planner = planner();
        let joint = planner.world().initial_joint_state();
        let query = |level| OpponentQuery {
            opponent: 1,
            joint: &joint,
            level,
            budget: Budget::Iterations(5),
            seed: 17,
        };

        let reactive = policy_for(0)(&planner, &query(0));
        assert_eq!(reactive.action, Action::Maintain);
        assert_eq!(reactive.iterations, 0);

        // Every level above zero goes through the tree search.
        let nested = tree_policy(&planner, &query(3));
        assert_eq!(policy_for(3)(&planner, &query(3)), nested);
        assert_eq!(nested.iterations, 5);
    }

    #[test]
    fn test_level_one_ego_sees_reactive_opponents() {
        let planner = planner();
        let joint = planner.world().initial_joint_state();
        // Vehicle 2 starts inside its goal.
        assert!(joint.is_parked(2));

        let predictions = opponent_actions(&planner, 0, &joint, 1, Budget::Iterations(20), 3);
        assert_eq!(
            predictions.actions,
            vec![Action::Maintain, Action::Maintain, Action::Brake]
        );
        assert_eq!(predictions.iterations, 0);
    }

    #[test]
    fn test_level_two_ego_searches_for_opponents() {
        let planner = planner();
        let joint = planner.world().initial_joint_state();

        let first = opponent_actions(&planner, 0, &joint, 2, Budget::Iterations(20), 3);
        let second = opponent_actions(&planner, 0, &joint, 2, Budget::Iterations(20), 3);

        assert_eq!(first.actions.len(), 3);
        assert_eq!(first.actions[2], Action::Brake);
        assert_eq!(first, second);
        // One searching opponent at 20 / 4 iterations.
        assert_eq!(first.iterations, 5);
    }

    #[test]
    fn test_nested_budget_follows_the_call_budget() {
        // A large configured budget must not leak into nested searches of a
        // small plan call.
        let planner = Planner::new(world(), MctsConfig::for_testing().with_budget(1000));
        let joint = planner.world().initial_joint_state();

        let small = opponent_actions(&planner, 0, &joint, 2, Budget::Iterations(8), 3);
        assert_eq!(small.iterations, 2);

        let starved = opponent_actions(&planner, 0, &joint, 2, Budget::Iterations(1), 3);
        assert_eq!(starved.iterations, 1);

        let nested = planner.plan(1, &joint, 1, Budget::Iterations(2), mix_seed(3, 1));
        assert_eq!(small.actions[1], nested.action);
    }
}
