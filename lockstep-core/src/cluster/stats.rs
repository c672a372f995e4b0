//! Per-step aggregate statistics carried by cluster nodes.
//!
//! Leaf statistics are folded from the process's events during the build;
//! internal nodes combine their children's entries elementwise by step. The
//! centroid seed strategy reads these aggregates back as a synthetic average
//! sequence.

use crate::{
    distance::StepAverage,
    trace::{EventRef, SequenceView, Trace},
};

use super::ClusterNode;

/// Aggregate statistics for one logical step of a cluster subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    step: i64,
    count: u64,
    metric_sum: i64,
    aggregate_sum: i64,
    send_count: u64,
    recv_count: u64,
}

impl StepStats {
    const fn at(step: i64) -> Self {
        Self {
            step,
            count: 0,
            metric_sum: 0,
            aggregate_sum: 0,
            send_count: 0,
            recv_count: 0,
        }
    }

    fn record(&mut self, value: i64, aggregate: i64, sends: bool, receives: bool) {
        self.count = self.count.saturating_add(1);
        self.metric_sum = self.metric_sum.saturating_add(value);
        self.aggregate_sum = self.aggregate_sum.saturating_add(aggregate);
        self.send_count = self.send_count.saturating_add(u64::from(sends));
        self.recv_count = self.recv_count.saturating_add(u64::from(receives));
    }

    fn combine(left: Self, right: Self) -> Self {
        Self {
            step: left.step,
            count: left.count.saturating_add(right.count),
            metric_sum: left.metric_sum.saturating_add(right.metric_sum),
            aggregate_sum: left.aggregate_sum.saturating_add(right.aggregate_sum),
            send_count: left.send_count.saturating_add(right.send_count),
            recv_count: left.recv_count.saturating_add(right.recv_count),
        }
    }

    /// Returns the logical step these statistics cover.
    #[rustfmt::skip]
    #[must_use]
    pub const fn step(self) -> i64 { self.step }

    /// Returns how many events reported this step across the subtree.
    #[rustfmt::skip]
    #[must_use]
    pub const fn count(self) -> u64 { self.count }

    /// Returns the summed per-event metric at this step.
    #[rustfmt::skip]
    #[must_use]
    pub const fn metric_sum(self) -> i64 { self.metric_sum }

    /// Returns the summed aggregated (inter-step) metric at this step.
    #[rustfmt::skip]
    #[must_use]
    pub const fn aggregate_sum(self) -> i64 { self.aggregate_sum }

    /// Returns how many events at this step send at least one message.
    #[rustfmt::skip]
    #[must_use]
    pub const fn send_count(self) -> u64 { self.send_count }

    /// Returns how many events at this step receive at least one message.
    #[rustfmt::skip]
    #[must_use]
    pub const fn recv_count(self) -> u64 { self.recv_count }

    /// Returns the average metric at this step (truncating division, staying
    /// in the accumulation's integer domain).
    #[must_use]
    pub fn mean_metric(self) -> i64 {
        match i64::try_from(self.count) {
            Ok(count) if count > 0 => self.metric_sum / count,
            _ => 0,
        }
    }
}

/// Folds one process's events into per-step statistics.
///
/// Consecutive events at the same step share an entry; the sequence is step
/// ordered, so a linear fold suffices.
pub(super) fn leaf_stats(trace: &Trace, view: SequenceView<'_>, metric: &str) -> Vec<StepStats> {
    let mut stats: Vec<StepStats> = Vec::new();
    for (index, event) in view.events().iter().enumerate() {
        let here = EventRef::new(view.process(), index);
        let mut sends = false;
        let mut receives = false;
        for &id in event.messages() {
            let Some(message) = trace.message(id) else {
                continue;
            };
            if message.sender() == here {
                sends = true;
            }
            if message.receiver() == here {
                receives = true;
            }
        }
        if stats.last().is_none_or(|last| last.step() != event.step()) {
            stats.push(StepStats::at(event.step()));
        }
        if let Some(entry) = stats.last_mut() {
            entry.record(
                event.metric(metric),
                event.aggregate_metric(metric),
                sends,
                receives,
            );
        }
    }
    stats
}

/// Combines two step-sorted statistic lists elementwise by step.
pub(super) fn merge_stats(left: &[StepStats], right: &[StepStats]) -> Vec<StepStats> {
    let mut merged = Vec::with_capacity(left.len().saturating_add(right.len()));
    let mut left_at = 0;
    let mut right_at = 0;
    loop {
        match (left.get(left_at), right.get(right_at)) {
            (Some(&l), Some(&r)) if l.step() == r.step() => {
                merged.push(StepStats::combine(l, r));
                left_at += 1;
                right_at += 1;
            }
            (Some(&l), Some(&r)) => {
                if l.step() < r.step() {
                    merged.push(l);
                    left_at += 1;
                } else {
                    merged.push(r);
                    right_at += 1;
                }
            }
            (Some(&l), None) => {
                merged.push(l);
                left_at += 1;
            }
            (None, Some(&r)) => {
                merged.push(r);
                right_at += 1;
            }
            (None, None) => break,
        }
    }
    merged
}

impl ClusterNode {
    /// Derives the synthetic average sequence of this subtree: for each step,
    /// the summed metric divided by the number of events reporting it.
    #[must_use]
    pub fn step_averages(&self) -> Vec<StepAverage> {
        self.stats
            .iter()
            .map(|entry| StepAverage::new(entry.step(), entry.mean_metric()))
            .collect()
    }
}
