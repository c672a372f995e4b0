//! Integration tests for representative selection and neighbourhood
//! expansion.

mod common;

use std::collections::BTreeSet;

use lockstep_core::{
    Event, EventRef, LockstepBuilder, ProcessId, SeedStrategy, Trace,
};
use rstest::rstest;

use common::{METRIC, chained, pid};

/// Processes 4, 7, and 9 in a message chain: 4 sends to 7, 7 sends to 9.
/// Process 4 carries the largest metric, so it is the global seed.
fn message_chain() -> Trace {
    Trace::builder()
        .with_process(pid(4), vec![Event::new(0).with_metric(METRIC, 10)])
        .with_process(pid(7), vec![Event::new(0).with_metric(METRIC, 5)])
        .with_process(pid(9), vec![Event::new(0).with_metric(METRIC, 1)])
        .with_message(EventRef::new(pid(4), 0), EventRef::new(pid(7), 0))
        .with_message(EventRef::new(pid(7), 0), EventRef::new(pid(9), 0))
        .build()
        .expect("trace is valid")
}

#[test]
fn one_hop_reaches_the_direct_neighbour() {
    let trace = message_chain();
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    assert_eq!(tree.seed(), pid(4));
    assert_eq!(
        lockstep.representatives(&trace, &tree),
        vec![pid(4), pid(7)]
    );
}

#[test]
fn two_hops_reach_the_neighbours_neighbour() {
    let trace = message_chain();
    let lockstep = LockstepBuilder::new()
        .with_radius(2)
        .build()
        .expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    assert_eq!(
        lockstep.representatives(&trace, &tree),
        vec![pid(4), pid(7), pid(9)]
    );
}

#[test]
fn zero_radius_is_coerced_to_one_hop() {
    let trace = message_chain();
    let lockstep = LockstepBuilder::new()
        .with_radius(0)
        .build()
        .expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    assert_eq!(
        lockstep.representatives(&trace, &tree),
        vec![pid(4), pid(7)],
        "a zero-hop request still returns immediate neighbours",
    );
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn expansion_is_monotonic_in_the_radius(#[case] radius: usize) {
    let trace = message_chain();
    let smaller = LockstepBuilder::new()
        .with_radius(radius)
        .build()
        .expect("configuration is valid");
    let larger = LockstepBuilder::new()
        .with_radius(radius + 1)
        .build()
        .expect("configuration is valid");
    let tree = smaller.cluster(&trace).expect("clustering succeeds");

    let inner: BTreeSet<ProcessId> = smaller.representatives(&trace, &tree).into_iter().collect();
    let outer: BTreeSet<ProcessId> = larger.representatives(&trace, &tree).into_iter().collect();
    assert!(
        inner.is_subset(&outer),
        "radius {radius} must select a subset of radius {}",
        radius + 1
    );
}

#[test]
fn a_process_without_messages_does_not_expand() {
    let trace = Trace::builder()
        .with_process(pid(0), vec![Event::new(0).with_metric(METRIC, 8)])
        .with_process(pid(1), vec![Event::new(0).with_metric(METRIC, 2)])
        .build()
        .expect("trace is valid");
    let lockstep = LockstepBuilder::new()
        .with_radius(3)
        .build()
        .expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    assert_eq!(lockstep.representatives(&trace, &tree), vec![pid(0)]);
}

#[test]
fn max_metric_selection_keeps_the_first_member_on_ties() {
    let trace = Trace::builder()
        .with_process(pid(3), chained(3, &[(0, 9), (1, 9)]))
        .with_process(pid(5), chained(5, &[(0, 9), (1, 9)]))
        .build()
        .expect("trace is valid");
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let top = lockstep
        .representatives_within(&trace, &tree, tree.root(), SeedStrategy::MaxMetric)
        .expect("selection succeeds");
    assert_eq!(top, vec![pid(3)]);
}

#[test]
fn max_metric_selection_handles_all_negative_clusters() {
    let trace = Trace::builder()
        .with_process(pid(0), chained(0, &[(0, -9), (1, -11)]))
        .with_process(pid(1), chained(1, &[(0, -2), (1, -4)]))
        .build()
        .expect("trace is valid");
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let top = lockstep
        .representatives_within(&trace, &tree, tree.root(), SeedStrategy::MaxMetric)
        .expect("selection succeeds");
    assert_eq!(top, vec![pid(1)], "-2 is the genuine maximum");
}

#[test]
fn centroid_selection_picks_the_member_nearest_the_average() {
    // Averages are (0+6+12)/3 = 6 at both steps; process 1 sits on them.
    let trace = Trace::builder()
        .with_process(pid(0), chained(0, &[(0, 0), (1, 0)]))
        .with_process(pid(1), chained(1, &[(0, 6), (1, 6)]))
        .with_process(pid(2), chained(2, &[(0, 12), (1, 12)]))
        .build()
        .expect("trace is valid");
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let top = lockstep
        .representatives_within(&trace, &tree, tree.root(), SeedStrategy::Centroid)
        .expect("selection succeeds");
    assert_eq!(top, vec![pid(1)]);
}

#[test]
fn centroid_selection_breaks_ties_towards_the_smaller_id() {
    // Both members are equidistant from their shared average.
    let trace = Trace::builder()
        .with_process(pid(6), chained(6, &[(0, 0)]))
        .with_process(pid(8), chained(8, &[(0, 10)]))
        .build()
        .expect("trace is valid");
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let top = lockstep
        .representatives_within(&trace, &tree, tree.root(), SeedStrategy::Centroid)
        .expect("selection succeeds");
    assert_eq!(top, vec![pid(6)]);
}

#[test]
fn single_member_clusters_return_that_member_under_both_strategies() {
    let trace = message_chain();
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let leaf = tree.leaf(pid(9)).expect("leaf exists");

    let by_max = lockstep
        .representatives_within(&trace, &tree, leaf, SeedStrategy::MaxMetric)
        .expect("selection succeeds");
    let by_centroid = lockstep
        .representatives_within(&trace, &tree, leaf, SeedStrategy::Centroid)
        .expect("selection succeeds");
    // Process 9 only receives, so one hop reaches back to its sender.
    assert_eq!(by_max, vec![pid(7), pid(9)]);
    assert_eq!(by_max, by_centroid);
}

#[test]
fn unknown_focus_nodes_are_rejected() {
    let trace = message_chain();
    let lockstep = LockstepBuilder::new().build().expect("configuration is valid");
    let tree = lockstep.cluster(&trace).expect("clustering succeeds");
    let bogus = {
        // A handle from a larger, unrelated tree.
        let bigger = Trace::builder()
            .with_process(pid(0), chained(0, &[(0, 1)]))
            .with_process(pid(1), chained(1, &[(0, 2)]))
            .with_process(pid(2), chained(2, &[(0, 3)]))
            .with_process(pid(3), chained(3, &[(0, 4)]))
            .build()
            .expect("trace is valid");
        let bigger_tree = lockstep.cluster(&bigger).expect("clustering succeeds");
        bigger_tree.root()
    };
    let err = lockstep
        .representatives_within(&trace, &tree, bogus, SeedStrategy::MaxMetric)
        .expect_err("the handle does not belong to this tree");
    assert_eq!(err.code().as_str(), "LOCKSTEP_UNKNOWN_NODE");
}
