//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices.

use engine_core::{Action, JointState};

use crate::node::{MctsNode, NodeId};
use crate::reward::Terminal;

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Root node index (always 0 after initialization)
    root: NodeId,
}

impl MctsTree {
    /// Create a new tree rooted at the given joint state.
    pub fn new(joint: JointState, untried: Vec<Action>, terminal: Option<Terminal>) -> Self {
        let root_node = MctsNode::new_root(joint, untried, terminal);
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Select the child with the highest UCT score.
    ///
    /// Ties go to the child expanded first.
    pub fn best_child(&self, node_id: NodeId, c_uct: f64) -> Option<NodeId> {
        let node = self.get(node_id);
        let parent_visits = node.visit_count;

        let mut best: Option<(f64, NodeId)> = None;
        for &(_, child_id) in &node.children {
            let score = self.get(child_id).uct_score(parent_visits, c_uct);
            match best {
                Some((best_score, _)) if score <= best_score => {}
                _ => best = Some((score, child_id)),
            }
        }
        best.map(|(_, id)| id)
    }

    /// Add a child to a parent node.
    /// Returns the new child's NodeId.
    pub fn add_child(
        &mut self,
        parent_id: NodeId,
        action: Action,
        joint: JointState,
        edge_reward: f64,
        terminal: Option<Terminal>,
        untried: Vec<Action>,
    ) -> NodeId {
        let depth = self.get(parent_id).depth + 1;
        let child = MctsNode::new_child(
            parent_id,
            action,
            joint,
            depth,
            edge_reward,
            terminal,
            untried,
        );
        let child_id = self.allocate(child);

        // Add to parent's children
        self.get_mut(parent_id).children.push((action, child_id));

        child_id
    }

    /// Backpropagate a simulation return from a leaf to the root.
    ///
    /// The leaf receives `value`, the return from its own edge onwards. Each
    /// ancestor receives its own edge reward plus `gamma` times the return
    /// of the child below it.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f64, gamma: f64) {
        let mut current_id = leaf_id;
        let mut current_return = value;

        loop {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += current_return;

            let parent = node.parent;
            if parent.is_none() {
                break;
            }
            current_return = self.get(parent).edge_reward + gamma * current_return;
            current_id = parent;
        }
    }

    /// Most visited child of a node.
    ///
    /// Ties are broken by mean value, then by expansion order.
    pub fn robust_child(&self, node_id: NodeId) -> Option<(Action, NodeId)> {
        let mut best: Option<(Action, NodeId)> = None;
        for &(action, child_id) in &self.get(node_id).children {
            let child = self.get(child_id);
            let better = match best {
                None => true,
                Some((_, best_id)) => {
                    let incumbent = self.get(best_id);
                    child.visit_count > incumbent.visit_count
                        || (child.visit_count == incumbent.visit_count
                            && child.mean_value() > incumbent.mean_value())
                }
            };
            if better {
                best = Some((action, child_id));
            }
        }
        best
    }

    /// Best action at the root by visit count.
    /// Returns (action, visit_count) or None if root has no children.
    pub fn best_action(&self) -> Option<(Action, u32)> {
        self.robust_child(self.root)
            .map(|(action, id)| (action, self.get(id).visit_count))
    }

    /// Path from the root following the most visited child at every level.
    pub fn principal_variation(&self) -> Vec<NodeId> {
        let mut path = vec![self.root];
        let mut current = self.root;
        while let Some((_, child)) = self.robust_child(current) {
            path.push(child);
            current = child;
        }
        path
    }

    /// Visit counts are consistent with the tree shape.
    ///
    /// The root has exactly as many visits as its children combined. Every
    /// other non-terminal node has one more: the visit that created it.
    pub fn visits_conserved(&self) -> bool {
        self.nodes.iter().enumerate().all(|(idx, node)| {
            let child_visits: u32 = node
                .children
                .iter()
                .map(|(_, id)| self.get(*id).visit_count)
                .sum();
            if NodeId(idx as u32) == self.root {
                node.is_terminal() || node.visit_count == child_visits
            } else if node.is_terminal() {
                node.children.is_empty()
            } else {
                node.visit_count == child_visits + 1
            }
        })
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        let node = self.get(node_id);
        if node.children.is_empty() {
            return current_depth;
        }

        node.children
            .iter()
            .map(|(_, id)| self.compute_max_depth(*id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f64,
    pub max_depth: u32,
}
