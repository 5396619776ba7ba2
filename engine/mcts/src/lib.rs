//! Monte Carlo Tree Search (MCTS) planner with level-k opponent models.
//!
//! This crate plans one control action for one vehicle of an
//! [`engine_core::World`], treating every other vehicle as a level-(k-1)
//! reasoner.
//!
//! # Overview
//!
//! Each planning iteration consists of four phases:
//!
//! 1. **Selection**: Traverse the tree using UCT (Upper Confidence bounds
//!    applied to Trees) until a node with untried actions or a terminal node
//! 2. **Expansion**: Step the joint state with one untried ego action while
//!    the opponents take their predicted actions
//! 3. **Rollout**: Play random feasible ego actions up to the horizon,
//!    summing discounted shaped rewards
//! 4. **Backpropagation**: Update visit counts and values from the expanded
//!    node to the root; each node's return is its own step reward plus the
//!    discounted return of the child below it
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcts::{Budget, MctsConfig, Planner};
//!
//! let planner = Planner::new(world, MctsConfig::default());
//! let joint = planner.world().initial_joint_state();
//!
//! let outcome = planner.plan(0, &joint, 1, Budget::Iterations(200), 42);
//! println!("Action: {}", outcome.action);
//! println!("Iterations: {}", outcome.iterations);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `computation_budget`: Iterations per plan call (default: 200)
//! - `max_step`: Search horizon in control steps (default: 8)
//! - `c_uct`: Exploration constant (default: 5.0)
//! - `gamma`: Discount per control step (default: 0.9)
//! - `opponent_replan`: Whether rollouts re-plan opponents every step
//!
//! # Levels
//!
//! Level 0 vehicles keep their speed and heading. A level-k vehicle runs the
//! search above and predicts opponents by planning for them at level k-1
//! with `max(1, N / inner_budget_divisor)` iterations, where `N` is the
//! budget of the plan call doing the predicting, see [`levelk`].

pub mod config;
pub mod levelk;
pub mod node;
pub mod reward;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::{Budget, MctsConfig, OpponentReplan, RewardWeights};
pub use levelk::{
    opponent_actions, policy_for, LevelPolicy, OpponentQuery, Prediction, Predictions,
};
pub use node::{MctsNode, NodeId};
pub use reward::{step_reward, terminal_status, StepOutcome, Terminal};
pub use search::{
    mix_seed, run_mcts, Fallback, MctsSearch, PlanOutcome, Planner, SearchError, SearchStats,
};
pub use tree::{MctsTree, TreeStats};
