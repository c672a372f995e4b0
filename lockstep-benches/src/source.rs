//! Synthetic traces for benchmarking.
//!
//! Provides [`SyntheticTrace`], a generator of seeded random traces: every
//! process steps through the same range with random metric values and a
//! `comm_prev` chain, and neighbouring processes exchange a message every
//! few steps so the selection stage has a communication graph to expand
//! over. Data is seeded for reproducibility across benchmark runs.

use lockstep_core::{DEFAULT_METRIC, Event, EventRef, ProcessId, Trace, TraceError};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Steps between two messages on the synthetic ring.
const MESSAGE_STRIDE: usize = 4;

/// Errors that may occur during synthetic trace generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntheticError {
    /// The requested process count was zero.
    #[error("process count must be greater than zero")]
    ZeroProcesses,
    /// The requested step count was zero.
    #[error("step count must be greater than zero")]
    ZeroSteps,
    /// The generated trace failed model validation.
    #[error("generated trace was invalid: {0}")]
    Invalid(#[from] TraceError),
}

/// Configuration for synthetic trace generation.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of processes to generate.
    pub process_count: u32,
    /// Number of logical steps per process.
    pub step_count: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Generates a seeded random [`Trace`] for benchmarking.
///
/// # Examples
///
/// ```
/// use lockstep_benches::source::{SyntheticConfig, synthetic_trace};
///
/// let config = SyntheticConfig { process_count: 4, step_count: 8, seed: 42 };
/// let trace = synthetic_trace(&config).expect("valid config");
/// assert_eq!(trace.process_count(), 4);
/// ```
///
/// # Errors
///
/// Returns [`SyntheticError::ZeroProcesses`] or [`SyntheticError::ZeroSteps`]
/// for degenerate configurations.
pub fn synthetic_trace(config: &SyntheticConfig) -> Result<Trace, SyntheticError> {
    if config.process_count == 0 {
        return Err(SyntheticError::ZeroProcesses);
    }
    if config.step_count == 0 {
        return Err(SyntheticError::ZeroSteps);
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let steps: Vec<i64> = (0..config.step_count)
        .map(|index| i64::try_from(index).unwrap_or(i64::MAX))
        .collect();

    let mut builder = Trace::builder();
    for process in 0..config.process_count {
        let id = ProcessId::new(process);
        let mut events = Vec::with_capacity(steps.len());
        for (index, &step) in steps.iter().enumerate() {
            let mut event = Event::new(step).with_metric(DEFAULT_METRIC, rng.gen_range(0..1_000));
            if index > 0 {
                event = event.with_comm_prev(EventRef::new(id, index - 1));
            }
            events.push(event);
        }
        builder = builder.with_process(id, events);
    }

    if config.process_count > 1 {
        for process in 0..config.process_count {
            let next = (process + 1) % config.process_count;
            for index in (0..config.step_count).step_by(MESSAGE_STRIDE) {
                builder = builder.with_message(
                    EventRef::new(ProcessId::new(process), index),
                    EventRef::new(ProcessId::new(next), index),
                );
            }
        }
    }

    Ok(builder.build()?)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "test assertions may panic on setup failure"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 4)]
    #[case(6, 12)]
    fn generates_the_requested_shape(#[case] processes: u32, #[case] steps: usize) {
        let trace = synthetic_trace(&SyntheticConfig {
            process_count: processes,
            step_count: steps,
            seed: 7,
        })
        .expect("configuration is valid");
        assert_eq!(trace.process_count(), processes as usize);
    }

    #[test]
    fn generation_is_reproducible() {
        let config = SyntheticConfig {
            process_count: 5,
            step_count: 16,
            seed: 99,
        };
        let first = synthetic_trace(&config).expect("configuration is valid");
        let second = synthetic_trace(&config).expect("configuration is valid");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_degenerate_configurations() {
        let err = synthetic_trace(&SyntheticConfig {
            process_count: 0,
            step_count: 4,
            seed: 0,
        })
        .expect_err("zero processes are invalid");
        assert_eq!(err, SyntheticError::ZeroProcesses);
    }
}
