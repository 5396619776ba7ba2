//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm for one ego vehicle:
//! 1. Selection: Traverse tree using UCT to find a node with untried actions
//! 2. Expansion: Step the joint state with one untried ego action
//! 3. Rollout: Random ego actions, level-(k-1) opponents, discounted rewards
//! 4. Backpropagation: Update statistics along the path

use std::time::{Duration, Instant};

use engine_core::{Action, JointState, State, VehicleId, World};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::config::{Budget, MctsConfig, OpponentReplan};
use crate::levelk;
use crate::node::NodeId;
use crate::reward::{step_reward, terminal_status, Terminal};
use crate::tree::MctsTree;

const ROLLOUT_SALT: u64 = 0x524f_4c4c_4f55_5400;
const SHUFFLE_SALT: u64 = 0x5348_5546_464c_4500;
pub(crate) const NESTING_SALT: u64 = 0x4e45_5354_494e_4700;

/// Errors that reject a planning request before any search happens.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("ego id {ego} out of range for a fleet of {fleet}")]
    EgoOutOfRange { ego: VehicleId, fleet: usize },

    #[error("snapshot holds {snapshot} vehicles but the fleet has {fleet}")]
    FleetMismatch { snapshot: usize, fleet: usize },

    #[error("action set is empty")]
    EmptyActionSet,
}

/// Why a plan returned `Brake` without consulting a search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The budget ran out before a single iteration completed
    EmptyBudget,
    /// The ego is already parked or collided
    TerminalRoot,
    /// The request was rejected, see [`SearchError`]
    InvalidRequest,
}

/// Search timing and work counters.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub total_time_us: u64,
    pub selection_time_us: u64,
    pub expansion_time_us: u64,
    pub rollout_time_us: u64,
    pub backprop_time_us: u64,
    /// Joint-state steps taken during expansion and rollouts
    pub kinematic_steps: u64,
    /// Opponent decisions computed (memoized ones are not counted)
    pub opponent_plans: u32,
    /// Iterations spent in nested opponent searches
    pub opponent_iterations: u64,
    /// Iterations whose selection ended on a terminal node
    pub terminal_hits: u32,
}

/// Result of a planning request.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Action to take this tick
    pub action: Action,

    /// Completed iterations
    pub iterations: u32,

    pub root_visits: u32,
    pub root_value: f64,
    pub tree_nodes: usize,
    pub max_depth: u32,

    /// Ego states along the most visited path, starting at the root state
    pub expected_trajectory: Vec<State>,

    /// Wall-clock time spent planning
    pub elapsed: Duration,

    /// Set when the action did not come from a search tree
    pub fallback: Option<Fallback>,

    pub stats: SearchStats,
}

impl PlanOutcome {
    fn without_tree(action: Action, root: Option<State>, fallback: Option<Fallback>) -> Self {
        Self {
            action,
            iterations: 0,
            root_visits: 0,
            root_value: 0.0,
            tree_nodes: 0,
            max_depth: 0,
            expected_trajectory: root.into_iter().collect(),
            elapsed: Duration::ZERO,
            fallback,
            stats: SearchStats::default(),
        }
    }
}

/// Level-k planner for any vehicle of a world.
///
/// Holds no per-request state; one planner is shared by every vehicle and
/// thread.
#[derive(Debug, Clone)]
pub struct Planner {
    world: World,
    config: MctsConfig,
}

impl Planner {
    pub fn new(world: World, config: MctsConfig) -> Self {
        Self { world, config }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Choose an action for `ego` at reasoning `level`.
    ///
    /// Never fails: level 0 answers `Maintain` without a tree, and rejected
    /// requests, terminal roots and empty budgets answer `Brake`.
    pub fn plan(
        &self,
        ego: VehicleId,
        joint: &JointState,
        level: u32,
        budget: Budget,
        seed: u64,
    ) -> PlanOutcome {
        if level == 0 {
            let query = levelk::OpponentQuery {
                opponent: ego,
                joint,
                level,
                budget,
                seed,
            };
            let action = levelk::policy_for(level)(self, &query).action;
            return PlanOutcome::without_tree(action, joint.states.get(ego).copied(), None);
        }

        match MctsSearch::new(self, ego, joint, level, seed) {
            Ok(mut search) => search.run(budget),
            Err(e) => {
                error!(ego, level, error = %e, "Planning request rejected, braking");
                PlanOutcome::without_tree(
                    Action::Brake,
                    joint.states.get(ego).copied(),
                    Some(Fallback::InvalidRequest),
                )
            }
        }
    }
}

/// MCTS search state for one planning request.
pub struct MctsSearch<'a> {
    planner: &'a Planner,
    tree: MctsTree,
    ego: VehicleId,
    level: u32,
    seed: u64,
    /// Budget of the running search, divided down for opponent searches
    budget: Budget,
    stats: SearchStats,
}

impl<'a> MctsSearch<'a> {
    /// Create a new search rooted at `joint` with `ego` as the planning vehicle.
    pub fn new(
        planner: &'a Planner,
        ego: VehicleId,
        joint: &JointState,
        level: u32,
        seed: u64,
    ) -> Result<Self, SearchError> {
        let world = planner.world();
        let fleet = world.num_vehicles();
        if joint.len() != fleet || joint.parked.len() != fleet {
            return Err(SearchError::FleetMismatch {
                snapshot: joint.len(),
                fleet,
            });
        }
        if ego >= fleet {
            return Err(SearchError::EgoOutOfRange { ego, fleet });
        }
        if planner.config().action_set.is_empty() {
            return Err(SearchError::EmptyActionSet);
        }

        let terminal = terminal_status(world, ego, joint);
        let untried = shuffled_actions(&planner.config().action_set, seed, 0, 0);
        let tree = MctsTree::new(joint.clone(), untried, terminal);

        Ok(Self {
            planner,
            tree,
            ego,
            level,
            seed,
            budget: planner.config().budget(),
            stats: SearchStats::default(),
        })
    }

    /// Run iterations until the budget is spent.
    pub fn run(&mut self, budget: Budget) -> PlanOutcome {
        let start = Instant::now();
        self.budget = budget;
        let root_state = *self.tree.get(self.tree.root()).joint.state(self.ego);

        if self.tree.get(self.tree.root()).is_terminal() {
            debug!(ego = self.ego, "Root is terminal, braking");
            return PlanOutcome::without_tree(
                Action::Brake,
                Some(root_state),
                Some(Fallback::TerminalRoot),
            );
        }

        let mut iterations = 0u32;
        loop {
            let exhausted = match budget {
                Budget::Iterations(n) => iterations >= n,
                Budget::Deadline(limit) => start.elapsed() >= limit,
            };
            if exhausted {
                break;
            }
            self.simulate(iterations);
            iterations += 1;
        }

        debug_assert!(self.tree.visits_conserved());

        let (action, fallback) = match self.tree.best_action() {
            Some((action, _)) => (action, None),
            None => {
                warn!(
                    ego = self.ego,
                    ?budget,
                    "Planning budget exhausted before the first iteration, braking"
                );
                (Action::Brake, Some(Fallback::EmptyBudget))
            }
        };

        let tree_stats = self.tree.stats();
        let expected_trajectory = self
            .tree
            .principal_variation()
            .into_iter()
            .map(|id| *self.tree.get(id).joint.state(self.ego))
            .collect();
        let elapsed = start.elapsed();
        self.stats.total_time_us = elapsed.as_micros() as u64;

        debug!(
            ego = self.ego,
            level = self.level,
            action = %action,
            iterations,
            tree_nodes = tree_stats.total_nodes,
            max_depth = tree_stats.max_depth,
            root_value = format!("{:.3}", tree_stats.root_value),
            elapsed_ms = format!("{:.1}", elapsed.as_secs_f64() * 1000.0),
            "Plan complete"
        );

        PlanOutcome {
            action,
            iterations,
            root_visits: tree_stats.root_visits,
            root_value: tree_stats.root_value,
            tree_nodes: tree_stats.total_nodes,
            max_depth: tree_stats.max_depth,
            expected_trajectory,
            elapsed,
            fallback,
            stats: self.stats.clone(),
        }
    }

    /// Run a single simulation (select -> expand -> rollout -> backpropagate).
    fn simulate(&mut self, iteration: u32) {
        let gamma = self.planner.config().gamma;

        // Selection: descend while the node is fully expanded
        let t = Instant::now();
        let selected = self.select();
        self.stats.selection_time_us += t.elapsed().as_micros() as u64;

        let (leaf_id, value) = if self.tree.get(selected).is_terminal() {
            self.stats.terminal_hits += 1;
            (selected, self.tree.get(selected).edge_reward)
        } else {
            let t = Instant::now();
            let expanded = self.expand(selected, iteration);
            self.stats.expansion_time_us += t.elapsed().as_micros() as u64;

            match expanded {
                Some(child_id) => {
                    let child = self.tree.get(child_id);
                    let edge = child.edge_reward;
                    if child.is_terminal() {
                        (child_id, edge)
                    } else {
                        let t = Instant::now();
                        let future = self.rollout(child_id, iteration);
                        self.stats.rollout_time_us += t.elapsed().as_micros() as u64;
                        (child_id, edge + future)
                    }
                }
                None => (selected, 0.0),
            }
        };

        // Backpropagation
        let t = Instant::now();
        self.tree.backpropagate(leaf_id, value, gamma);
        self.stats.backprop_time_us += t.elapsed().as_micros() as u64;

        trace!(
            ego = self.ego,
            iteration,
            leaf = leaf_id.0,
            depth = self.tree.get(leaf_id).depth,
            value,
            "MCTS simulation complete"
        );
    }

    /// Descend with UCT until a terminal node or one with untried actions.
    fn select(&self) -> NodeId {
        let c_uct = self.planner.config().c_uct;
        let mut current = self.tree.root();

        loop {
            let node = self.tree.get(current);
            if node.is_terminal() || !node.is_fully_expanded() {
                break;
            }
            match self.tree.best_child(current, c_uct) {
                Some(child_id) => current = child_id,
                None => break,
            }
        }

        current
    }

    /// Expand one untried ego action of `node_id`.
    fn expand(&mut self, node_id: NodeId, iteration: u32) -> Option<NodeId> {
        let action = self.tree.get_mut(node_id).untried.pop()?;
        let mut actions = self.node_opponent_actions(node_id);
        actions[self.ego] = action;

        let planner = self.planner;
        let config = planner.config();
        let world = planner.world();

        let parent = self.tree.get(node_id);
        let depth = parent.depth + 1;
        let next = world.step_joint(&parent.joint, &actions, config.dt_plan);
        let outcome = step_reward(world, self.ego, &parent.joint, &next, &config.rewards);
        self.stats.kinematic_steps += 1;

        let terminal = outcome
            .terminal
            .or_else(|| (depth >= config.max_step).then_some(Terminal::Horizon));
        let untried = if terminal.is_some() {
            Vec::new()
        } else {
            let child_index = self.tree.len() as u64;
            shuffled_actions(&config.action_set, self.seed, child_index, iteration)
        };

        Some(
            self.tree
                .add_child(node_id, action, next, outcome.reward, terminal, untried),
        )
    }

    /// Discounted return of a random playout from `node_id`: `Σ_{t≥1} γ^t r_t`.
    fn rollout(&mut self, node_id: NodeId, iteration: u32) -> f64 {
        let planner = self.planner;
        let config = planner.config();
        let world = planner.world();

        let node = self.tree.get(node_id);
        let steps = config.max_step.saturating_sub(node.depth);
        if steps == 0 {
            return 0.0;
        }
        let mut joint = node.joint.clone();
        let entry_actions = self.node_opponent_actions(node_id);

        let rollout_seed = mix_seed(mix_seed(self.seed, ROLLOUT_SALT), iteration as u64);
        let mut rng = ChaCha20Rng::seed_from_u64(rollout_seed);

        let mut total = 0.0;
        let mut discount = 1.0;
        for t in 1..=steps {
            discount *= config.gamma;

            let mut actions = match config.opponent_replan {
                OpponentReplan::EveryStep if t > 1 => {
                    let predictions = levelk::opponent_actions(
                        planner,
                        self.ego,
                        &joint,
                        self.level,
                        self.budget,
                        mix_seed(rollout_seed, t as u64),
                    );
                    self.stats.opponent_plans += opponent_count(&joint, self.ego);
                    self.stats.opponent_iterations += predictions.iterations;
                    predictions.actions
                }
                _ => entry_actions.clone(),
            };
            actions[self.ego] = self.rollout_action(&joint, &mut rng);

            let next = world.step_joint(&joint, &actions, config.dt_plan);
            let outcome = step_reward(world, self.ego, &joint, &next, &config.rewards);
            self.stats.kinematic_steps += 1;

            total += discount * outcome.reward;
            if outcome.terminal.is_some() {
                break;
            }
            joint = next;
        }

        total
    }

    /// Uniform choice among feasible ego actions; `Brake` when there is none.
    fn rollout_action(&self, joint: &JointState, rng: &mut ChaCha20Rng) -> Action {
        let config = self.planner.config();
        let state = joint.state(self.ego);

        let feasible: Vec<Action> = config
            .action_set
            .iter()
            .copied()
            .filter(|&a| is_feasible(self.planner.world(), self.ego, state, a, config.dt_plan))
            .collect();

        feasible.choose(rng).copied().unwrap_or(Action::Brake)
    }

    /// Opponent actions at a node, computed once and shared by all children.
    fn node_opponent_actions(&mut self, node_id: NodeId) -> Vec<Action> {
        if let Some(actions) = &self.tree.get(node_id).opponent_actions {
            return actions.clone();
        }

        let joint = &self.tree.get(node_id).joint;
        let seed = mix_seed(mix_seed(self.seed, NESTING_SALT), node_id.0 as u64);
        let predictions =
            levelk::opponent_actions(self.planner, self.ego, joint, self.level, self.budget, seed);
        self.stats.opponent_plans += opponent_count(joint, self.ego);
        self.stats.opponent_iterations += predictions.iterations;

        self.tree.get_mut(node_id).opponent_actions = Some(predictions.actions.clone());
        predictions.actions
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }
}

/// Whether `action` keeps the vehicle on drivable surface with its whole
/// body clear of static geometry.
fn is_feasible(
    world: &World,
    id: VehicleId,
    state: &State,
    action: Action,
    dt: f64,
) -> bool {
    let next = world.advance(id, state, action, dt);
    world.is_inside_drivable(&next.position())
        && !world.static_collision(&world.footprint(id, &next))
}

fn opponent_count(joint: &JointState, ego: VehicleId) -> u32 {
    (0..joint.len())
        .filter(|&id| id != ego && !joint.is_parked(id))
        .count() as u32
}

/// Action set in a seeded random order, popped from the back on expansion.
fn shuffled_actions(action_set: &[Action], seed: u64, node: u64, iteration: u32) -> Vec<Action> {
    let node_seed = mix_seed(mix_seed(mix_seed(seed, SHUFFLE_SALT), node), iteration as u64);
    let mut rng = ChaCha20Rng::seed_from_u64(node_seed);
    let mut actions = action_set.to_vec();
    actions.shuffle(&mut rng);
    actions
}

/// Combine two seeds (SplitMix64 finalizer over `a + golden * (b + 1)`).
pub fn mix_seed(a: u64, b: u64) -> u64 {
    let mut z = a.wrapping_add(b.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Convenience function to run a single planning request with the
/// configured budget.
pub fn run_mcts(
    world: &World,
    config: MctsConfig,
    ego: VehicleId,
    joint: &JointState,
    level: u32,
    seed: u64,
) -> PlanOutcome {
    let budget = config.budget();
    Planner::new(world.clone(), config).plan(ego, joint, level, budget, seed)
}
