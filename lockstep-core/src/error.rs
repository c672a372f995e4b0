//! Error types for the Lockstep core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::trace::ProcessId;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while assembling a [`crate::Trace`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TraceError {
    /// The same process id was supplied more than once.
    #[error("process {process} was supplied more than once")]
    DuplicateProcess {
        /// Process id that appeared twice.
        process: ProcessId,
    },
    /// A process was supplied without any events.
    #[error("process {process} has an empty event sequence")]
    EmptySequence {
        /// Process id that owned no events.
        process: ProcessId,
    },
    /// A process's events were not ordered by non-decreasing step.
    #[error("events for process {process} are not step-ordered at index {index}")]
    UnsortedSteps {
        /// Process id whose sequence was out of order.
        process: ProcessId,
        /// Index of the first event that broke the ordering.
        index: usize,
    },
    /// An event reference did not resolve to an existing event.
    #[error("event reference ({process}, {index}) does not resolve")]
    DanglingRef {
        /// Process id named by the unresolvable reference.
        process: ProcessId,
        /// Sequence index named by the unresolvable reference.
        index: usize,
    },
    /// A `comm_prev` link pointed at another process's sequence.
    #[error("comm_prev for event ({process}, {index}) leaves its own process")]
    CrossProcessCommPrev {
        /// Process id owning the offending event.
        process: ProcessId,
        /// Sequence index of the offending event.
        index: usize,
    },
    /// A `comm_prev` link did not point at an earlier event.
    #[error("comm_prev for event ({process}, {index}) is not an earlier event")]
    CommPrevNotPreceding {
        /// Process id owning the offending event.
        process: ProcessId,
        /// Sequence index of the offending event.
        index: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`TraceError`] variants.
    enum TraceErrorCode for TraceError {
        /// The same process id was supplied more than once.
        DuplicateProcess => DuplicateProcess { .. } => "TRACE_DUPLICATE_PROCESS",
        /// A process was supplied without any events.
        EmptySequence => EmptySequence { .. } => "TRACE_EMPTY_SEQUENCE",
        /// A process's events were not ordered by non-decreasing step.
        UnsortedSteps => UnsortedSteps { .. } => "TRACE_UNSORTED_STEPS",
        /// An event reference did not resolve to an existing event.
        DanglingRef => DanglingRef { .. } => "TRACE_DANGLING_REF",
        /// A `comm_prev` link pointed at another process's sequence.
        CrossProcessCommPrev => CrossProcessCommPrev { .. } => "TRACE_CROSS_PROCESS_COMM_PREV",
        /// A `comm_prev` link did not point at an earlier event.
        CommPrevNotPreceding => CommPrevNotPreceding { .. } => "TRACE_COMM_PREV_NOT_PRECEDING",
    }
}

/// Error type produced when configuring or running [`crate::Lockstep`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LockstepError {
    /// The clustering metric name must not be empty.
    #[error("the clustering metric name must not be empty")]
    EmptyMetricName,
    /// Clustering was requested for a trace with no processes.
    #[error("the trace contains no processes")]
    EmptyTrace,
    /// An operation referenced a process the trace does not contain.
    #[error("the trace does not contain process {process}")]
    UnknownProcess {
        /// Process id that was not present in the trace.
        process: ProcessId,
    },
    /// An operation referenced a node outside the cluster tree's arena.
    #[error("the cluster tree does not contain node {node}")]
    UnknownNode {
        /// Arena index that was out of bounds.
        node: usize,
    },
    /// Representative selection was requested for a memberless sub-cluster.
    #[error("node {node} has no member processes to select from")]
    EmptySelection {
        /// Arena index of the memberless node.
        node: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`LockstepError`] variants.
    enum LockstepErrorCode for LockstepError {
        /// The clustering metric name must not be empty.
        EmptyMetricName => EmptyMetricName => "LOCKSTEP_EMPTY_METRIC_NAME",
        /// Clustering was requested for a trace with no processes.
        EmptyTrace => EmptyTrace => "LOCKSTEP_EMPTY_TRACE",
        /// An operation referenced a process the trace does not contain.
        UnknownProcess => UnknownProcess { .. } => "LOCKSTEP_UNKNOWN_PROCESS",
        /// An operation referenced a node outside the cluster tree's arena.
        UnknownNode => UnknownNode { .. } => "LOCKSTEP_UNKNOWN_NODE",
        /// Representative selection was requested for a memberless sub-cluster.
        EmptySelection => EmptySelection { .. } => "LOCKSTEP_EMPTY_SELECTION",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, LockstepError>;
