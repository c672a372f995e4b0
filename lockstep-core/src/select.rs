//! Representative ("top process") selection.
//!
//! A seed process is chosen inside a cluster — either the member with the
//! largest observed metric or the member closest to the cluster's synthetic
//! average sequence — and the selection then expands breadth-first along the
//! message graph for a configured number of hops. Every process reached
//! within the radius is part of the result, the seed included.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use crate::{
    cluster::{ClusterNode, ClusterTree},
    distance::{Dissimilarity, centroid_distance},
    error::LockstepError,
    trace::{EventRef, ProcessId, Trace},
};

/// Picks the member with the largest leaf `max_metric`.
///
/// The comparison starts from the first member and only a strictly larger
/// metric displaces it, so ties keep the earliest member and an all-negative
/// cluster still yields its genuine maximum.
pub(crate) fn max_metric_member(
    tree: &ClusterTree,
    node: &ClusterNode,
    node_index: usize,
) -> Result<ProcessId, LockstepError> {
    let leaf_metric = |process: ProcessId| {
        tree.leaf(process)
            .and_then(|leaf| tree.node(leaf))
            .map_or(i64::MIN, ClusterNode::max_metric)
    };

    let mut members = node.members().iter().copied();
    let first = members
        .next()
        .ok_or(LockstepError::EmptySelection { node: node_index })?;
    let mut best = first;
    let mut best_metric = leaf_metric(first);
    for member in members {
        let metric = leaf_metric(member);
        if metric > best_metric {
            best = member;
            best_metric = metric;
        }
    }
    Ok(best)
}

/// Picks the member whose own sequence is closest to the cluster's synthetic
/// average sequence. Ties break towards the smaller process id.
pub(crate) fn centroid_member(
    trace: &Trace,
    node: &ClusterNode,
    node_index: usize,
    metric: &str,
) -> Result<ProcessId, LockstepError> {
    let centroid = node.step_averages();
    node.members()
        .iter()
        .copied()
        .map(|member| {
            let distance = trace.sequence(member).map_or(Dissimilarity::Undefined, |view| {
                centroid_distance(view, &centroid, metric)
            });
            (distance, member)
        })
        .min()
        .map(|(_, member)| member)
        .ok_or(LockstepError::EmptySelection { node: node_index })
}

/// Expands breadth-first from `seed` along the message graph for exactly
/// `radius` hops, returning every reached process in ascending order.
pub(crate) fn expand(trace: &Trace, seed: ProcessId, radius: NonZeroUsize) -> Vec<ProcessId> {
    let mut selected = BTreeSet::from([seed]);
    let mut frontier = BTreeSet::from([seed]);
    for _ in 0..radius.get() {
        let mut next = BTreeSet::new();
        for &process in &frontier {
            let Some(events) = trace.events(process) else {
                continue;
            };
            for (index, event) in events.iter().enumerate() {
                let here = EventRef::new(process, index);
                for &id in event.messages() {
                    let Some(message) = trace.message(id) else {
                        continue;
                    };
                    let other = if message.sender() == here {
                        message.receiver().process()
                    } else {
                        message.sender().process()
                    };
                    selected.insert(other);
                    next.insert(other);
                }
            }
        }
        frontier = next;
    }
    selected.into_iter().collect()
}
