//! MCTS configuration parameters.

use engine_core::Action;
use std::time::Duration;

/// How much work a single `plan` call may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Fixed number of iterations. Deterministic.
    Iterations(u32),
    /// Wall-clock deadline, checked at the top of every iteration.
    Deadline(Duration),
}

/// How opponents are re-planned inside rollouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpponentReplan {
    /// Opponent actions decided at rollout entry are reused for every step.
    #[default]
    Cached,
    /// Opponents are re-planned at every rollout step.
    EveryStep,
}

/// Reward shaping weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardWeights {
    /// Weight of the per-step reduction in distance to the goal
    pub w_progress: f64,
    /// Weight of the absolute heading error to the route direction
    pub w_heading: f64,
    /// Penalty per vehicle inside the ego's safety rectangle
    pub w_safety: f64,
    /// Bonus for reaching the goal
    pub r_goal: f64,
    /// Penalty for a collision, leaving the map or a numeric failure
    pub r_collision: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            w_progress: 1.0,
            w_heading: 0.5,
            w_safety: 2.0,
            r_goal: 10.0,
            r_collision: 50.0,
        }
    }
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Iterations per plan call when no time budget is set.
    pub computation_budget: u32,

    /// Optional wall-clock budget; replaces `computation_budget` when set.
    pub time_budget: Option<Duration>,

    /// Search horizon in control steps.
    pub max_step: u32,

    /// Exploration constant of the UCT formula.
    pub c_uct: f64,

    /// Discount applied per control step.
    pub gamma: f64,

    /// Allowed actions, in the order children are considered.
    pub action_set: Vec<Action>,

    /// Planning control step (seconds).
    pub dt_plan: f64,

    /// Divisor of the iteration budget used for nested opponent searches.
    pub inner_budget_divisor: u32,

    /// Opponent re-planning mode inside rollouts.
    pub opponent_replan: OpponentReplan,

    pub rewards: RewardWeights,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            computation_budget: 200,
            time_budget: None,
            max_step: 8,
            c_uct: 5.0,
            gamma: 0.9,
            action_set: Action::ALL.to_vec(),
            dt_plan: 0.5,
            inner_budget_divisor: 4,
            opponent_replan: OpponentReplan::Cached,
            rewards: RewardWeights::default(),
        }
    }
}

impl MctsConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            computation_budget: 50,
            max_step: 4,
            ..Self::default()
        }
    }

    /// Budget of a top-level plan call.
    pub fn budget(&self) -> Budget {
        match self.time_budget {
            Some(deadline) => Budget::Deadline(deadline),
            None => Budget::Iterations(self.computation_budget),
        }
    }

    /// Budget of an opponent search nested in a search running under
    /// `outer`: `max(1, N / B_inner)` iterations.
    ///
    /// Always an iteration budget. A deadline outer search divides the
    /// configured iteration count instead.
    pub fn inner_budget(&self, outer: Budget) -> Budget {
        let divisor = self.inner_budget_divisor.max(1);
        let n = match outer {
            Budget::Iterations(n) => n,
            Budget::Deadline(_) => self.computation_budget,
        };
        Budget::Iterations((n / divisor).max(1))
    }

    /// Builder pattern: set the iteration budget.
    pub fn with_budget(mut self, n: u32) -> Self {
        self.computation_budget = n;
        self
    }

    /// Builder pattern: set a wall-clock budget.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// Builder pattern: set the search horizon.
    pub fn with_max_step(mut self, max_step: u32) -> Self {
        self.max_step = max_step;
        self
    }

    /// Builder pattern: set the UCT exploration constant.
    pub fn with_c_uct(mut self, c: f64) -> Self {
        self.c_uct = c;
        self
    }

    /// Builder pattern: set the discount.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder pattern: set the allowed actions.
    pub fn with_action_set(mut self, actions: Vec<Action>) -> Self {
        self.action_set = actions;
        self
    }

    /// Builder pattern: set the planning control step.
    pub fn with_dt_plan(mut self, dt: f64) -> Self {
        self.dt_plan = dt;
        self
    }

    /// Builder pattern: set the nested budget divisor.
    pub fn with_inner_budget_divisor(mut self, divisor: u32) -> Self {
        self.inner_budget_divisor = divisor;
        self
    }

    /// Builder pattern: set the rollout opponent mode.
    pub fn with_opponent_replan(mut self, mode: OpponentReplan) -> Self {
        self.opponent_replan = mode;
        self
    }

    /// Builder pattern: set the reward weights.
    pub fn with_rewards(mut self, rewards: RewardWeights) -> Self {
        self.rewards = rewards;
        self
    }
}
