//! Benchmark setup error type.
//!
//! Aggregates the error types that may arise during benchmark data
//! preparation so that setup functions can propagate failures with `?`
//! instead of using `.expect()`.

use crate::source::SyntheticError;
use lockstep_core::LockstepError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic trace generation failed.
    #[error("synthetic trace generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Configuring or running the core failed.
    #[error("core operation failed: {0}")]
    Core(#[from] LockstepError),
}
