//! Lockstep core library.
//!
//! Groups the processes of a parallel execution trace by the similarity of
//! their per-step metric behaviour: a gap-tolerant distance over partially
//! misaligned event sequences drives a deterministic agglomerative merge
//! tree, and a breadth-first expansion over the message graph selects a
//! small set of representative processes for detailed display. Trace import
//! and rendering live outside this crate; it performs no I/O.

mod builder;
mod cluster;
mod distance;
mod error;
mod lockstep;
mod select;
mod trace;

pub use crate::{
    builder::{LockstepBuilder, SeedStrategy},
    cluster::{ClusterNode, ClusterTree, NodeId, StepStats},
    distance::{Dissimilarity, StepAverage, centroid_distance, sequence_distance},
    error::{LockstepError, LockstepErrorCode, Result, TraceError, TraceErrorCode},
    lockstep::Lockstep,
    trace::{
        DEFAULT_METRIC, Event, EventRef, Message, MessageId, ProcessId, SequenceView, Trace,
        TraceBuilder,
    },
};
