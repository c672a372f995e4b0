//! Cluster merge tree over traced processes.
//!
//! The tree is an arena of nodes indexed by [`NodeId`]: leaves hold a single
//! process, internal nodes hold the merge of their children. "Current root"
//! queries walk parent indices until a node with no parent is reached. The
//! arena is owned by [`ClusterTree`] and discarded wholesale when clustering
//! is re-run; nothing outside the tree retains node handles across rebuilds.
//!
//! After construction the tree is immutable except for the display-only
//! open/closed flag, which the rendering collaborator toggles to expand or
//! collapse subtrees without affecting algorithmic state.

mod build;
mod stats;

use std::collections::BTreeMap;

use crate::{distance::Dissimilarity, trace::ProcessId};

pub use self::stats::StepStats;

/// Stable handle of a node in the cluster arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }
}

/// One node of the merge tree: a single process (leaf) or a merge of two
/// child subtrees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    members: Vec<ProcessId>,
    merge_distance: Option<Dissimilarity>,
    max_metric: i64,
    open: bool,
    stats: Vec<StepStats>,
}

impl ClusterNode {
    /// Returns the parent handle, or `None` for the current root.
    #[rustfmt::skip]
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> { self.parent }

    /// Returns the child handles (empty for leaves).
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the member processes of this subtree in display order: a
    /// leaf's single process, or the left child's members followed by the
    /// right child's.
    #[must_use]
    pub fn members(&self) -> &[ProcessId] {
        &self.members
    }

    /// Returns the distance at which this node was formed (`None` for
    /// leaves).
    #[rustfmt::skip]
    #[must_use]
    pub const fn merge_distance(&self) -> Option<Dissimilarity> { self.merge_distance }

    /// Returns the maximum metric value observed across the subtree's
    /// events.
    #[rustfmt::skip]
    #[must_use]
    pub const fn max_metric(&self) -> i64 { self.max_metric }

    /// Returns whether this node holds a single process.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the display-state flag.
    #[rustfmt::skip]
    #[must_use]
    pub const fn is_open(&self) -> bool { self.open }

    /// Returns the per-step aggregate statistics of this subtree, sorted by
    /// step.
    #[must_use]
    pub fn stats(&self) -> &[StepStats] {
        &self.stats
    }
}

/// The merge hierarchy produced by [`crate::Lockstep::cluster`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterTree {
    nodes: Vec<ClusterNode>,
    root: NodeId,
    leaves: BTreeMap<ProcessId, NodeId>,
    seed: ProcessId,
}

impl ClusterTree {
    /// Returns the handle of the tree root.
    #[rustfmt::skip]
    #[must_use]
    pub const fn root(&self) -> NodeId { self.root }

    /// Resolves a node handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ClusterNode> {
        self.nodes.get(id.0)
    }

    /// Returns the total number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the leaf handle for `process`, if it was part of the build.
    #[must_use]
    pub fn leaf(&self, process: ProcessId) -> Option<NodeId> {
        self.leaves.get(&process).copied()
    }

    /// Returns `(process, leaf)` pairs in ascending process order.
    pub fn leaves(&self) -> impl Iterator<Item = (ProcessId, NodeId)> + '_ {
        self.leaves.iter().map(|(&process, &id)| (process, id))
    }

    /// Returns the process with the globally largest metric value, recorded
    /// while the leaves were built. It is the default seed for
    /// representative selection.
    #[rustfmt::skip]
    #[must_use]
    pub const fn seed(&self) -> ProcessId { self.seed }

    /// Walks parent handles from `id` to the subtree's current root.
    #[must_use]
    pub fn current_root(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?;
        Some(build::walk_root(&self.nodes, id))
    }

    /// Returns the node that visually represents `process` given the current
    /// open flags: the shallowest closed node on the root-to-leaf path, or
    /// the leaf itself when the whole path is open. Used by the renderer to
    /// route messages between drawn clusters.
    #[must_use]
    pub fn closed_root(&self, process: ProcessId) -> Option<NodeId> {
        let leaf = self.leaf(process)?;
        let mut path = vec![leaf];
        let mut cursor = leaf;
        while let Some(parent) = self.node(cursor).and_then(ClusterNode::parent) {
            path.push(parent);
            cursor = parent;
        }
        path.into_iter().rev().find(|&id| {
            self.node(id)
                .is_some_and(|node| !node.is_open() || node.is_leaf())
        })
    }

    /// Sets the display-state flag of one node. Returns whether the handle
    /// resolved.
    pub fn set_open(&mut self, id: NodeId, open: bool) -> bool {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.open = open;
            true
        } else {
            false
        }
    }

    /// Closes a node and every node below it. Returns whether the handle
    /// resolved.
    pub fn close_subtree(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0) {
                node.open = false;
                stack.extend(node.children.iter().copied());
            }
        }
        true
    }

    /// Counts the nodes a renderer would draw given the current open flags:
    /// closed nodes and leaves count as one, open internal nodes recurse.
    #[must_use]
    pub fn visible_clusters(&self) -> usize {
        self.visible_below(self.root)
    }

    fn visible_below(&self, id: NodeId) -> usize {
        let Some(node) = self.node(id) else { return 0 };
        if node.is_open() && !node.is_leaf() {
            node.children
                .iter()
                .map(|&child| self.visible_below(child))
                .sum()
        } else {
            1
        }
    }

    /// Returns the depth of the deepest chain of open internal nodes from
    /// the root.
    #[must_use]
    pub fn max_open_depth(&self) -> usize {
        self.open_depth_below(self.root)
    }

    fn open_depth_below(&self, id: NodeId) -> usize {
        let Some(node) = self.node(id) else { return 0 };
        if node.is_open() && !node.is_leaf() {
            1 + node
                .children
                .iter()
                .map(|&child| self.open_depth_below(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Returns whether any leaf is directly visible through a chain of open
    /// ancestors.
    #[must_use]
    pub fn leaf_open(&self) -> bool {
        self.leaf_open_below(self.root)
    }

    fn leaf_open_below(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.is_leaf() {
            return true;
        }
        node.is_open()
            && node
                .children
                .iter()
                .any(|&child| self.leaf_open_below(child))
    }
}
