//! Per-step reward shaping for the ego vehicle.

use engine_core::{wrap_angle, JointState, VehicleId, World};

use crate::config::RewardWeights;

/// Why a node or rollout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The ego reached its goal region
    GoalReached,
    /// The ego hit a vehicle or static geometry, left the map or went non-finite
    Collision,
    /// The search horizon was reached
    Horizon,
}

/// Reward of one control step and whether it ended the rollout for the ego.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub terminal: Option<Terminal>,
}

/// Terminal status of the ego in a joint state, ignoring the horizon.
pub fn terminal_status(world: &World, ego: VehicleId, joint: &JointState) -> Option<Terminal> {
    if world.is_fatal(joint, ego) {
        Some(Terminal::Collision)
    } else if joint.is_parked(ego) {
        Some(Terminal::GoalReached)
    } else {
        None
    }
}

/// Reward for the ego moving from `before` to `after`.
///
/// Collisions are checked first and replace every other term. Reaching the
/// goal adds `r_goal` on top of the progress term. Otherwise the reward is
/// progress along the ego's route minus the heading error to the route
/// tangent ahead minus a penalty per near miss.
pub fn step_reward(
    world: &World,
    ego: VehicleId,
    before: &JointState,
    after: &JointState,
    weights: &RewardWeights,
) -> StepOutcome {
    if world.is_fatal(after, ego) {
        return StepOutcome {
            reward: -weights.r_collision,
            terminal: Some(Terminal::Collision),
        };
    }

    let prev = before.state(ego);
    let next = after.state(ego);
    let progress = weights.w_progress
        * (world.distance_to_goal(ego, prev) - world.distance_to_goal(ego, next));

    if after.is_parked(ego) && !before.is_parked(ego) {
        return StepOutcome {
            reward: progress + weights.r_goal,
            terminal: Some(Terminal::GoalReached),
        };
    }

    let heading_error = wrap_angle(world.heading_reference(ego, next) - next.heading).abs();
    let near_misses = world.near_misses(after, ego) as f64;

    StepOutcome {
        reward: progress - weights.w_heading * heading_error - weights.w_safety * near_misses,
        terminal: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Action, ActionTable, Crossroads, OpenRoad, State, Target, VehicleParams};
    use std::f64::consts::PI;
    use std::sync::Arc;

    fn world(vehicles: Vec<VehicleParams>) -> World {
        World::new(
            Arc::new(OpenRoad::new(25.0)),
            vehicles,
            ActionTable::default(),
        )
    }

    fn ego() -> VehicleParams {
        VehicleParams::new(
            0,
            "ego",
            State::new(-20.0, 0.0, 0.0, 4.0),
            Target {
                x: 20.0,
                y: 0.0,
                radius: 2.0,
            },
        )
    }

    #[test]
    fn test_progress_towards_goal() {
        let world = world(vec![ego()]);
        let before = world.initial_joint_state();
        let after = world.step_joint(&before, &[Action::Maintain], 0.5);

        let outcome = step_reward(&world, 0, &before, &after, &RewardWeights::default());
        assert_eq!(outcome.terminal, None);
        assert!((outcome.reward - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_error_is_penalised() {
        let world = world(vec![ego()]);
        let before = world.initial_joint_state();
        let straight = world.step_joint(&before, &[Action::Maintain], 0.5);
        let turned = world.step_joint(&before, &[Action::TurnLeft], 0.5);

        let w = RewardWeights::default();
        let r_straight = step_reward(&world, 0, &before, &straight, &w).reward;
        let r_turned = step_reward(&world, 0, &before, &turned, &w).reward;
        assert!(r_straight > r_turned);
    }

    #[test]
    fn test_left_turn_rewards_following_the_lane() {
        // Turning towards a goal up the north arm too early heads for the
        // corner block; keeping the lane is the better step.
        let turner = VehicleParams::new(
            0,
            "ego",
            State::new(-20.0, -2.0, 0.0, 4.0),
            Target {
                x: 0.0,
                y: 20.0,
                radius: 2.0,
            },
        );
        let world = World::new(
            Arc::new(Crossroads::new(25.0, 4.0)),
            vec![turner],
            ActionTable::default(),
        );
        let before = world.initial_joint_state();
        let keep_lane = world.step_joint(&before, &[Action::Maintain], 0.5);
        let cut_corner = world.step_joint(&before, &[Action::TurnLeft], 0.5);

        let w = RewardWeights::default();
        let r_keep = step_reward(&world, 0, &before, &keep_lane, &w);
        let r_cut = step_reward(&world, 0, &before, &cut_corner, &w);
        assert!((r_keep.reward - 2.0).abs() < 1e-9);
        assert!(r_keep.reward > r_cut.reward);
    }

    #[test]
    fn test_goal_bonus() {
        let world = world(vec![ego()]);
        let mut before = world.initial_joint_state();
        before.states[0] = State::new(17.0, 0.0, 0.0, 4.0);
        let after = world.step_joint(&before, &[Action::Maintain], 0.5);

        let outcome = step_reward(&world, 0, &before, &after, &RewardWeights::default());
        assert_eq!(outcome.terminal, Some(Terminal::GoalReached));
        assert!((outcome.reward - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_collision_penalty() {
        let other = VehicleParams::new(
            1,
            "other",
            State::new(-15.0, 0.0, PI, 0.0),
            Target {
                x: -25.0,
                y: 0.0,
                radius: 2.0,
            },
        );
        let world = world(vec![ego(), other]);
        let before = world.initial_joint_state();
        let after = world.step_joint(&before, &[Action::Accelerate, Action::Maintain], 0.5);
        assert!(world.is_fatal(&after, 0));

        let w = RewardWeights::default();
        let outcome = step_reward(&world, 0, &before, &after, &w);
        assert_eq!(outcome.terminal, Some(Terminal::Collision));
        assert_eq!(outcome.reward, -w.r_collision);
    }

    #[test]
    fn test_near_miss_penalty() {
        let other = VehicleParams::new(
            1,
            "other",
            State::new(-10.0, 0.0, PI, 0.0),
            Target {
                x: -25.0,
                y: 0.0,
                radius: 2.0,
            },
        );
        let world = world(vec![ego(), other]);
        let before = world.initial_joint_state();
        let after = world.step_joint(&before, &[Action::Maintain, Action::Maintain], 0.5);
        assert_eq!(world.near_misses(&after, 0), 1);

        let w = RewardWeights::default();
        let outcome = step_reward(&world, 0, &before, &after, &w);
        assert_eq!(outcome.terminal, None);
        assert!((outcome.reward - (2.0 - w.w_safety)).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_status() {
        let world = world(vec![ego()]);
        let mut joint = world.initial_joint_state();
        assert_eq!(terminal_status(&world, 0, &joint), None);

        joint.parked[0] = true;
        assert_eq!(
            terminal_status(&world, 0, &joint),
            Some(Terminal::GoalReached)
        );

        joint.states[0] = State::new(30.0, 0.0, 0.0, 0.0);
        assert_eq!(terminal_status(&world, 0, &joint), Some(Terminal::Collision));
    }
}
