//! Gap-tolerant dissimilarity between step-ordered event sequences.
//!
//! Processes take different numbers of logical steps, so their sequences are
//! only partially aligned. The walk below merges two sequences by step in a
//! single pass: matched steps score the squared metric difference directly,
//! while a step present on one side only scores a one-sided estimate from the
//! other side's last seen value. The estimate is charged only when the event
//! being passed over has a valid anchor (a causal predecessor on its own
//! process), which keeps sequence starts from incurring spurious penalties.
//! Trailing unmatched steps score nothing.

use crate::trace::{Event, SequenceView};

/// Dissimilarity score between two event sequences.
///
/// `Undefined` marks a pair with no overlapping or estimable step. It orders
/// after every measured value, so such pairs sort last and merge last rather
/// than being dropped.
///
/// # Examples
/// ```
/// use lockstep_core::Dissimilarity;
///
/// assert!(Dissimilarity::Measured(u64::MAX) < Dissimilarity::Undefined);
/// assert_eq!(Dissimilarity::Measured(9).measured(), Some(9));
/// assert_eq!(Dissimilarity::Undefined.measured(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dissimilarity {
    /// Mean squared per-step metric difference, floored to an integer.
    Measured(u64),
    /// No step could be scored; treated as the maximum possible distance.
    Undefined,
}

impl Dissimilarity {
    /// Returns whether no step could be scored.
    #[must_use]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the measured value, or `None` when undefined.
    #[must_use]
    pub const fn measured(self) -> Option<u64> {
        match self {
            Self::Measured(value) => Some(value),
            Self::Undefined => None,
        }
    }
}

/// One entry of a synthetic average sequence derived from cluster statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepAverage {
    step: i64,
    value: i64,
}

impl StepAverage {
    /// Creates an average metric value for one step.
    #[must_use]
    pub const fn new(step: i64, value: i64) -> Self {
        Self { step, value }
    }

    /// Returns the logical step.
    #[rustfmt::skip]
    #[must_use]
    pub const fn step(self) -> i64 { self.step }

    /// Returns the average metric value at this step.
    #[rustfmt::skip]
    #[must_use]
    pub const fn value(self) -> i64 { self.value }
}

/// Running state of the merge walk.
///
/// The last seen values double as the one-sided estimates for gap steps, so
/// they are refreshed on every event a cursor passes, matched or not.
#[derive(Default)]
struct GapWalk {
    sum: u128,
    counted: u64,
    last_left: i64,
    last_right: i64,
}

impl GapWalk {
    fn score(&mut self) {
        let diff = i128::from(self.last_left) - i128::from(self.last_right);
        let squared = diff.unsigned_abs().saturating_mul(diff.unsigned_abs());
        self.sum = self.sum.saturating_add(squared);
        self.counted = self.counted.saturating_add(1);
    }

    fn finish(self) -> Dissimilarity {
        if self.counted == 0 {
            return Dissimilarity::Undefined;
        }
        let mean = self.sum / u128::from(self.counted);
        Dissimilarity::Measured(u64::try_from(mean).unwrap_or(u64::MAX))
    }
}

fn anchored(event: &Event, view: SequenceView<'_>) -> bool {
    event
        .comm_prev()
        .is_some_and(|prev| prev.process() == view.process())
}

/// Computes the dissimilarity between two processes' sequences for one metric.
///
/// Single merge-style pass, `O(len_left + len_right)`. The walk stops when
/// either cursor exhausts its sequence; whatever remains on the other side is
/// not scored. A pair with zero scored steps yields
/// [`Dissimilarity::Undefined`].
///
/// # Examples
/// ```
/// use lockstep_core::{Dissimilarity, Event, ProcessId, SequenceView, sequence_distance};
///
/// let left = [Event::new(0).with_metric("Lateness", 5)];
/// let right = [Event::new(0).with_metric("Lateness", 2)];
/// let distance = sequence_distance(
///     SequenceView::new(ProcessId::new(0), &left),
///     SequenceView::new(ProcessId::new(1), &right),
///     "Lateness",
/// );
/// assert_eq!(distance, Dissimilarity::Measured(9));
/// ```
#[must_use]
pub fn sequence_distance(
    left: SequenceView<'_>,
    right: SequenceView<'_>,
    metric: &str,
) -> Dissimilarity {
    let mut walk = GapWalk::default();
    let mut left_at = 0;
    let mut right_at = 0;
    while let (Some(l), Some(r)) = (left.events().get(left_at), right.events().get(right_at)) {
        if l.step() == r.step() {
            walk.last_left = l.metric(metric);
            walk.last_right = r.metric(metric);
            walk.score();
            left_at += 1;
            right_at += 1;
        } else if l.step() > r.step() {
            // Left skipped right's current step; estimate left as its last
            // seen value, anchored only when the right event has a causal
            // predecessor on its own process.
            walk.last_right = r.metric(metric);
            if anchored(r, right) {
                walk.score();
            }
            right_at += 1;
        } else {
            walk.last_left = l.metric(metric);
            if anchored(l, left) {
                walk.score();
            }
            left_at += 1;
        }
    }
    walk.finish()
}

/// Computes the dissimilarity between one process's sequence and a synthetic
/// average sequence.
///
/// Same walk and gap rules as [`sequence_distance`], except the synthetic
/// side has no message graph: its estimation gate is "not the first aggregate
/// entry" instead of a `comm_prev` check.
#[must_use]
pub fn centroid_distance(
    sequence: SequenceView<'_>,
    centroid: &[StepAverage],
    metric: &str,
) -> Dissimilarity {
    let mut walk = GapWalk::default();
    let mut event_at = 0;
    let mut average_at = 0;
    while let (Some(event), Some(average)) =
        (sequence.events().get(event_at), centroid.get(average_at))
    {
        if event.step() == average.step() {
            walk.last_left = event.metric(metric);
            walk.last_right = average.value();
            walk.score();
            event_at += 1;
            average_at += 1;
        } else if event.step() > average.step() {
            walk.last_right = average.value();
            if average_at > 0 {
                walk.score();
            }
            average_at += 1;
        } else {
            walk.last_left = event.metric(metric);
            if anchored(event, sequence) {
                walk.score();
            }
            event_at += 1;
        }
    }
    walk.finish()
}
