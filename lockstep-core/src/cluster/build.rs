//! Agglomerative construction of the cluster tree.
//!
//! Single-linkage-style agglomeration over an explicit pair list: every
//! unordered process pair is scored once, the pairs are sorted ascending by
//! (distance, left, right), and each pair whose endpoints sit in distinct
//! subtrees merges their current roots under a new arena node. Root lookups
//! walk parent indices without path compression, so the merge sequence is
//! exactly the sorted pair order and the resulting tree shape is identical
//! on every run over the same input.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    distance::{Dissimilarity, sequence_distance},
    error::LockstepError,
    trace::{ProcessId, SequenceView, Trace},
};

use super::{ClusterNode, ClusterTree, NodeId};
use super::stats::{leaf_stats, merge_stats};

/// A scored process pair awaiting the merge walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CandidatePair {
    distance: Dissimilarity,
    left: ProcessId,
    right: ProcessId,
}

impl Ord for CandidatePair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.left.cmp(&other.left))
            .then_with(|| self.right.cmp(&other.right))
    }
}

impl PartialOrd for CandidatePair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(super) fn walk_root(nodes: &[ClusterNode], id: NodeId) -> NodeId {
    let mut current = id;
    while let Some(parent) = nodes.get(current.0).and_then(ClusterNode::parent) {
        current = parent;
    }
    current
}

impl ClusterNode {
    fn leaf(trace: &Trace, view: SequenceView<'_>, metric: &str) -> Self {
        let max_metric = view
            .events()
            .iter()
            .map(|event| event.metric(metric))
            .fold(i64::MIN, i64::max);
        Self {
            parent: None,
            children: Vec::new(),
            members: vec![view.process()],
            merge_distance: None,
            max_metric,
            open: false,
            stats: leaf_stats(trace, view, metric),
        }
    }
}

fn merged_node(
    nodes: &[ClusterNode],
    left: NodeId,
    right: NodeId,
    distance: Dissimilarity,
) -> Option<ClusterNode> {
    let left_node = nodes.get(left.0)?;
    let right_node = nodes.get(right.0)?;
    let mut members =
        Vec::with_capacity(left_node.members.len().saturating_add(right_node.members.len()));
    members.extend_from_slice(&left_node.members);
    members.extend_from_slice(&right_node.members);
    Some(ClusterNode {
        parent: None,
        children: vec![left, right],
        members,
        merge_distance: Some(distance),
        max_metric: left_node.max_metric.max(right_node.max_metric),
        open: false,
        stats: merge_stats(&left_node.stats, &right_node.stats),
    })
}

fn pair_indices(len: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(len.saturating_mul(len.saturating_sub(1)) / 2);
    for left in 0..len {
        for right in (left + 1)..len {
            pairs.push((left, right));
        }
    }
    pairs
}

fn score_pair(
    views: &[SequenceView<'_>],
    left: usize,
    right: usize,
    metric: &str,
) -> Option<CandidatePair> {
    let left_view = views.get(left)?;
    let right_view = views.get(right)?;
    Some(CandidatePair {
        distance: sequence_distance(*left_view, *right_view, metric),
        left: left_view.process(),
        right: right_view.process(),
    })
}

#[cfg(feature = "parallel")]
fn score_pairs(views: &[SequenceView<'_>], metric: &str) -> Vec<CandidatePair> {
    use rayon::prelude::*;

    pair_indices(views.len())
        .into_par_iter()
        .filter_map(|(left, right)| score_pair(views, left, right, metric))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn score_pairs(views: &[SequenceView<'_>], metric: &str) -> Vec<CandidatePair> {
    pair_indices(views.len())
        .into_iter()
        .filter_map(|(left, right)| score_pair(views, left, right, metric))
        .collect()
}

impl ClusterTree {
    /// Runs the agglomeration over every process of `trace` for `metric`.
    pub(crate) fn build(trace: &Trace, metric: &str) -> Result<Self, LockstepError> {
        let views: Vec<SequenceView<'_>> = trace.sequences().collect();
        let Some(first) = views.first() else {
            return Err(LockstepError::EmptyTrace);
        };

        let capacity = views.len().saturating_mul(2).saturating_sub(1);
        let mut nodes: Vec<ClusterNode> = Vec::with_capacity(capacity);
        let mut leaves = BTreeMap::new();
        let mut seed = first.process();
        let mut seed_metric = i64::MIN;
        for view in &views {
            let id = NodeId(nodes.len());
            let node = ClusterNode::leaf(trace, *view, metric);
            if node.max_metric > seed_metric {
                seed_metric = node.max_metric;
                seed = view.process();
            }
            leaves.insert(view.process(), id);
            nodes.push(node);
        }

        let mut pairs = score_pairs(&views, metric);
        pairs.sort_unstable();
        debug!(
            processes = views.len(),
            pairs = pairs.len(),
            "scored candidate pairs"
        );

        for pair in &pairs {
            let (Some(&left_leaf), Some(&right_leaf)) =
                (leaves.get(&pair.left), leaves.get(&pair.right))
            else {
                continue;
            };
            let left_root = walk_root(&nodes, left_leaf);
            let right_root = walk_root(&nodes, right_leaf);
            if left_root == right_root {
                continue;
            }
            let id = NodeId(nodes.len());
            let Some(node) = merged_node(&nodes, left_root, right_root, pair.distance) else {
                continue;
            };
            if let Some(child) = nodes.get_mut(left_root.0) {
                child.parent = Some(id);
            }
            if let Some(child) = nodes.get_mut(right_root.0) {
                child.parent = Some(id);
            }
            nodes.push(node);
        }

        let root = walk_root(&nodes, NodeId(0));
        debug_assert_eq!(
            {
                let mut members = nodes
                    .get(root.0)
                    .map(|node| node.members.clone())
                    .unwrap_or_default();
                members.sort_unstable();
                members
            },
            views.iter().map(|view| view.process()).collect::<Vec<_>>(),
            "the root must contain every process exactly once",
        );

        Ok(Self {
            nodes,
            root,
            leaves,
            seed,
        })
    }
}
