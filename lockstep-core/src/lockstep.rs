//! Clustering and selection orchestration for the Lockstep library.
//!
//! Provides the [`Lockstep`] entry point: a validated configuration that runs
//! the agglomeration over a trace and selects representative processes from
//! the resulting hierarchy. Both operations are deterministic batch
//! computations over read-only input; re-running `cluster` discards the
//! previous tree entirely.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::SeedStrategy,
    cluster::{ClusterTree, NodeId},
    error::LockstepError,
    select,
    trace::{ProcessId, Trace},
};

/// Entry point for clustering a trace and selecting its top processes.
///
/// # Examples
/// ```
/// use lockstep_core::{Event, EventRef, LockstepBuilder, ProcessId, Trace};
///
/// let trace = Trace::builder()
///     .with_process(ProcessId::new(0), vec![Event::new(0).with_metric("Lateness", 3)])
///     .with_process(ProcessId::new(1), vec![Event::new(0).with_metric("Lateness", 4)])
///     .with_message(
///         EventRef::new(ProcessId::new(0), 0),
///         EventRef::new(ProcessId::new(1), 0),
///     )
///     .build()?;
///
/// let lockstep = LockstepBuilder::new().build()?;
/// let tree = lockstep.cluster(&trace)?;
/// assert_eq!(tree.node(tree.root()).map(|root| root.members().len()), Some(2));
///
/// let top = lockstep.representatives(&trace, &tree);
/// assert_eq!(top, vec![ProcessId::new(0), ProcessId::new(1)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Lockstep {
    metric: Arc<str>,
    radius: NonZeroUsize,
    seed_strategy: SeedStrategy,
}

impl Lockstep {
    pub(crate) fn new(
        metric: Arc<str>,
        radius: NonZeroUsize,
        seed_strategy: SeedStrategy,
    ) -> Self {
        Self {
            metric,
            radius,
            seed_strategy,
        }
    }

    /// Returns the metric this instance clusters on.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Returns the neighbourhood radius used for representative expansion.
    #[rustfmt::skip]
    #[must_use]
    pub const fn radius(&self) -> NonZeroUsize { self.radius }

    /// Returns the default seed-choice strategy.
    #[rustfmt::skip]
    #[must_use]
    pub const fn seed_strategy(&self) -> SeedStrategy { self.seed_strategy }

    /// Builds the cluster hierarchy over every process of `trace`.
    ///
    /// Any previously built tree must simply be dropped; trees are never
    /// updated incrementally.
    ///
    /// # Errors
    /// Returns [`LockstepError::EmptyTrace`] when the trace contains no
    /// processes.
    #[instrument(
        name = "core.cluster",
        err,
        skip(self, trace),
        fields(processes = trace.process_count(), metric = %self.metric),
    )]
    pub fn cluster(&self, trace: &Trace) -> Result<ClusterTree> {
        if trace.is_empty() {
            warn!("trace contains no processes, returning error");
            return Err(LockstepError::EmptyTrace);
        }
        let tree = ClusterTree::build(trace, &self.metric)?;
        info!(
            nodes = tree.node_count(),
            seed = %tree.seed(),
            "clustering completed"
        );
        Ok(tree)
    }

    /// Selects the top processes around the build-time seed (the process
    /// with the globally largest metric), expanding along the message graph
    /// for the configured radius.
    #[instrument(
        name = "core.representatives",
        skip(self, trace, tree),
        fields(seed = %tree.seed(), radius = self.radius.get()),
    )]
    #[must_use]
    pub fn representatives(&self, trace: &Trace, tree: &ClusterTree) -> Vec<ProcessId> {
        select::expand(trace, tree.seed(), self.radius)
    }

    /// Re-selects the top processes inside one sub-cluster, seeding with the
    /// given strategy.
    ///
    /// # Errors
    /// Returns [`LockstepError::UnknownNode`] when `focus` is not part of the
    /// tree and [`LockstepError::EmptySelection`] when the node has no
    /// members.
    #[instrument(
        name = "core.representatives_within",
        err,
        skip(self, trace, tree),
        fields(node = focus.get(), strategy = ?strategy, radius = self.radius.get()),
    )]
    pub fn representatives_within(
        &self,
        trace: &Trace,
        tree: &ClusterTree,
        focus: NodeId,
        strategy: SeedStrategy,
    ) -> Result<Vec<ProcessId>> {
        let node = tree
            .node(focus)
            .ok_or(LockstepError::UnknownNode { node: focus.get() })?;
        let seed = match strategy {
            SeedStrategy::MaxMetric => select::max_metric_member(tree, node, focus.get())?,
            SeedStrategy::Centroid => {
                select::centroid_member(trace, node, focus.get(), &self.metric)?
            }
        };
        info!(seed = %seed, "selected representative seed");
        Ok(select::expand(trace, seed, self.radius))
    }
}
