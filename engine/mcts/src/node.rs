//! MCTS tree node representation.
//!
//! Each node holds the joint state reached by taking an ego action from its
//! parent, with the other vehicles moving as their level-k models predict.
//! Nodes store visit statistics used for UCT selection.

use engine_core::{Action, JointState};

use crate::reward::Terminal;

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Ego action that led to this node (None for root)
    pub action: Option<Action>,

    /// Joint state of every vehicle at this node
    pub joint: JointState,

    /// Number of control steps from the root
    pub depth: u32,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of discounted returns backpropagated through this node.
    /// Q = value_sum / visit_count
    pub value_sum: f64,

    /// Immediate ego reward of the step from the parent into this node
    pub edge_reward: f64,

    /// Set when the ego collided, reached its goal or hit the horizon here
    pub terminal: Option<Terminal>,

    /// Actions not yet expanded, popped from the back
    pub untried: Vec<Action>,

    /// Children: (action, NodeId) pairs in expansion order.
    pub children: Vec<(Action, NodeId)>,

    /// Opponent actions predicted at this node, filled on first use
    pub opponent_actions: Option<Vec<Action>>,
}

impl MctsNode {
    /// Create a new root node.
    pub fn new_root(joint: JointState, untried: Vec<Action>, terminal: Option<Terminal>) -> Self {
        Self {
            parent: NodeId::NONE,
            action: None,
            joint,
            depth: 0,
            visit_count: 0,
            value_sum: 0.0,
            edge_reward: 0.0,
            terminal,
            untried,
            children: Vec::new(),
            opponent_actions: None,
        }
    }

    /// Create a new child node.
    pub fn new_child(
        parent: NodeId,
        action: Action,
        joint: JointState,
        depth: u32,
        edge_reward: f64,
        terminal: Option<Terminal>,
        untried: Vec<Action>,
    ) -> Self {
        Self {
            parent,
            action: Some(action),
            joint,
            depth,
            visit_count: 0,
            value_sum: 0.0,
            edge_reward,
            terminal,
            untried: if terminal.is_some() { Vec::new() } else { untried },
            children: Vec::new(),
            opponent_actions: None,
        }
    }

    /// Mean value Q(s,a) = W(s,a) / N(s,a).
    /// Returns 0 for unvisited nodes.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f64
        }
    }

    /// UCT score for child selection.
    ///
    /// UCT(s,a) = Q(s,a) + c * sqrt(ln N(s) / N(s,a))
    ///
    /// Unvisited children score +infinity.
    #[inline]
    pub fn uct_score(&self, parent_visits: u32, c_uct: f64) -> f64 {
        if self.visit_count == 0 {
            return f64::INFINITY;
        }
        let n = self.visit_count as f64;
        let ln_parent = (parent_visits.max(1) as f64).ln();
        self.mean_value() + c_uct * (ln_parent / n).sqrt()
    }

    /// Whether every allowed action has a child.
    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}
