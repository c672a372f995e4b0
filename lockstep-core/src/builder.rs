//! Builder utilities for configuring Lockstep analyses.
//!
//! Exposes the seed-strategy selection surface and the validation performed
//! before constructing [`Lockstep`] instances. Configuration is always
//! threaded as explicit values into the operations; nothing is stored as
//! ambient state, so repeated runs with different settings cannot interfere.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::{Result, error::LockstepError, lockstep::Lockstep, trace::DEFAULT_METRIC};

/// Indicates how [`Lockstep`] picks the seed process when selecting
/// representatives inside a sub-cluster.
///
/// # Examples
/// ```
/// use lockstep_core::SeedStrategy;
///
/// let strategy = SeedStrategy::default();
/// assert_eq!(strategy, SeedStrategy::MaxMetric);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeedStrategy {
    /// Seed from the member with the largest observed metric value.
    #[default]
    MaxMetric,
    /// Seed from the member closest to the cluster's average sequence.
    Centroid,
}

/// Configures and constructs [`Lockstep`] instances.
///
/// # Examples
/// ```
/// use lockstep_core::{LockstepBuilder, SeedStrategy};
///
/// let lockstep = LockstepBuilder::new()
///     .with_metric("Imbalance")
///     .with_radius(2)
///     .with_seed_strategy(SeedStrategy::Centroid)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(lockstep.metric(), "Imbalance");
/// assert_eq!(lockstep.radius().get(), 2);
/// assert_eq!(lockstep.seed_strategy(), SeedStrategy::Centroid);
/// ```
#[derive(Debug, Clone)]
pub struct LockstepBuilder {
    metric: String,
    radius: usize,
    seed_strategy: SeedStrategy,
}

impl Default for LockstepBuilder {
    fn default() -> Self {
        Self {
            metric: DEFAULT_METRIC.to_owned(),
            radius: 1,
            seed_strategy: SeedStrategy::MaxMetric,
        }
    }
}

impl LockstepBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use lockstep_core::{LockstepBuilder, SeedStrategy};
    ///
    /// let builder = LockstepBuilder::new();
    /// assert_eq!(builder.metric(), "Lateness");
    /// assert_eq!(builder.radius(), 1);
    /// assert_eq!(builder.seed_strategy(), SeedStrategy::MaxMetric);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the metric the engine clusters on.
    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    /// Returns the configured metric name.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Overrides the neighbourhood radius used for representative expansion.
    ///
    /// A radius of zero is coerced to one hop when the configuration is
    /// built; at least one hop is always performed.
    #[must_use]
    pub const fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Returns the configured neighbourhood radius, before coercion.
    #[rustfmt::skip]
    #[must_use]
    pub const fn radius(&self) -> usize { self.radius }

    /// Sets the seed-choice strategy for representative selection.
    #[must_use]
    pub const fn with_seed_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.seed_strategy = strategy;
        self
    }

    /// Returns the configured seed-choice strategy.
    #[rustfmt::skip]
    #[must_use]
    pub const fn seed_strategy(&self) -> SeedStrategy { self.seed_strategy }

    /// Validates the configuration and constructs a [`Lockstep`] instance.
    ///
    /// # Errors
    /// Returns [`LockstepError::EmptyMetricName`] when the metric name is
    /// empty.
    ///
    /// # Examples
    /// ```
    /// use lockstep_core::LockstepBuilder;
    ///
    /// let lockstep = LockstepBuilder::new().with_radius(0).build()
    ///     .expect("configuration is valid");
    /// assert_eq!(lockstep.radius().get(), 1, "a zero radius is coerced to one hop");
    /// ```
    pub fn build(self) -> Result<Lockstep> {
        if self.metric.is_empty() {
            return Err(LockstepError::EmptyMetricName);
        }
        let radius = NonZeroUsize::new(self.radius).unwrap_or(NonZeroUsize::MIN);
        Ok(Lockstep::new(
            Arc::from(self.metric),
            radius,
            self.seed_strategy,
        ))
    }
}
