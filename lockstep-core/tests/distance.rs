//! Integration tests validating the distance surface exported by
//! `lockstep-core`.

mod common;

use lockstep_core::{
    Dissimilarity, Event, ProcessId, SequenceView, Trace, sequence_distance,
};
use rstest::rstest;

use common::{METRIC, chained, pid};

fn view(process: u32, events: &[Event]) -> SequenceView<'_> {
    SequenceView::new(pid(process), events)
}

#[rstest]
#[case::flat(&[(0, 4), (1, 4), (2, 4)])]
#[case::ramp(&[(0, 0), (1, 10), (2, 20)])]
#[case::negative(&[(0, -3), (1, -7)])]
fn distance_to_an_identical_sequence_is_zero(#[case] points: &[(i64, i64)]) {
    let left = chained(0, points);
    let right = chained(1, points);
    assert_eq!(
        sequence_distance(view(0, &left), view(1, &right), METRIC),
        Dissimilarity::Measured(0)
    );
}

#[rstest]
#[case::aligned(&[(0, 5), (1, 6)], &[(0, 2), (1, 9)])]
#[case::left_longer(&[(0, 5), (1, 6), (2, 7), (3, 8)], &[(0, 2), (2, 9)])]
#[case::gap_on_each_side(&[(0, 5), (2, 7)], &[(0, 2), (1, 9), (3, 4)])]
#[case::disjoint(&[(0, 1)], &[(5, 2)])]
fn distance_is_symmetric(#[case] left: &[(i64, i64)], #[case] right: &[(i64, i64)]) {
    let left_events = chained(0, left);
    let right_events = chained(1, right);
    assert_eq!(
        sequence_distance(view(0, &left_events), view(1, &right_events), METRIC),
        sequence_distance(view(1, &right_events), view(0, &left_events), METRIC),
    );
}

#[test]
fn missing_step_without_anchor_is_not_estimated() {
    // The shorter sequence ends at step 0 and its only event has no
    // comm_prev, so the step-1 gap contributes nothing.
    let left = chained(0, &[(0, 5), (1, 5)]);
    let right = vec![Event::new(0).with_metric(METRIC, 5)];
    assert_eq!(
        sequence_distance(view(0, &left), view(1, &right), METRIC),
        Dissimilarity::Measured(0)
    );
}

#[test]
fn non_overlapping_sequences_sort_last() {
    let left = vec![Event::new(0).with_metric(METRIC, 1)];
    let right = vec![Event::new(7).with_metric(METRIC, 1)];
    let unrelated = sequence_distance(view(0, &left), view(1, &right), METRIC);
    assert!(unrelated.is_undefined());
    assert!(unrelated > Dissimilarity::Measured(u64::MAX));
}

#[test]
fn trace_distance_matches_the_sequence_walk() {
    let trace = Trace::builder()
        .with_process(pid(0), chained(0, &[(0, 5), (1, 6)]))
        .with_process(pid(1), chained(1, &[(0, 2), (1, 9)]))
        .build()
        .expect("trace is valid");
    let via_trace = trace
        .metric_distance(pid(0), pid(1), METRIC)
        .expect("both processes exist");
    // (5-2)^2 = 9 and (6-9)^2 = 9 over two steps.
    assert_eq!(via_trace, Dissimilarity::Measured(9));
}

#[test]
fn trace_distance_rejects_unknown_processes() {
    let trace = Trace::builder()
        .with_process(pid(0), chained(0, &[(0, 5)]))
        .build()
        .expect("trace is valid");
    let err = trace
        .metric_distance(pid(0), pid(9), METRIC)
        .expect_err("process 9 is not part of the trace");
    assert_eq!(err.code().as_str(), "LOCKSTEP_UNKNOWN_PROCESS");
    assert_eq!(err, lockstep_core::LockstepError::UnknownProcess { process: ProcessId::new(9) });
}

#[test]
fn metric_absent_everywhere_reads_as_zero() {
    let left = vec![Event::new(0).with_metric(METRIC, 3)];
    let right = vec![Event::new(0)];
    assert_eq!(
        sequence_distance(view(0, &left), view(1, &right), "NoSuchMetric"),
        Dissimilarity::Measured(0)
    );
}
