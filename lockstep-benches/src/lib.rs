//! Benchmark support crate for lockstep.
//!
//! Provides seeded synthetic traces and a setup error type used by the
//! Criterion benchmarks for the two core stages: cluster tree construction
//! and representative selection.

pub mod error;
pub mod source;
