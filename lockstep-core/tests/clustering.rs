//! Integration tests for the agglomerative clustering entry point.

mod common;

use std::collections::BTreeSet;

use lockstep_core::{
    ClusterTree, Dissimilarity, Event, LockstepBuilder, ProcessId, Trace,
};
use rstest::rstest;

use common::{METRIC, chained, pid};

fn cluster(trace: &Trace) -> ClusterTree {
    LockstepBuilder::new()
        .build()
        .expect("default configuration is valid")
        .cluster(trace)
        .expect("clustering succeeds")
}

/// Processes 0 and 1 share identical per-step metrics; process 2 differs
/// sharply at every step.
fn twins_and_outlier() -> Trace {
    Trace::builder()
        .with_process(pid(0), chained(0, &[(0, 5), (1, 6), (2, 7)]))
        .with_process(pid(1), chained(1, &[(0, 5), (1, 6), (2, 7)]))
        .with_process(pid(2), chained(2, &[(0, 50), (1, 60), (2, 70)]))
        .build()
        .expect("trace is valid")
}

#[test]
fn identical_pair_merges_first_and_outlier_last() {
    let tree = cluster(&twins_and_outlier());
    let root = tree.node(tree.root()).expect("root resolves");

    let twins = tree.node(root.children()[0]).expect("first child resolves");
    assert_eq!(twins.members(), [pid(0), pid(1)]);
    assert_eq!(twins.merge_distance(), Some(Dissimilarity::Measured(0)));

    let outlier = tree.node(root.children()[1]).expect("second child resolves");
    assert_eq!(outlier.members(), [pid(2)]);
}

#[rstest]
#[case::pair(2)]
#[case::a_few(5)]
#[case::many(17)]
fn root_members_cover_every_process_exactly_once(#[case] processes: u32) {
    let mut builder = Trace::builder();
    for id in 0..processes {
        let value = i64::from(id) * 3;
        builder = builder.with_process(pid(id), chained(id, &[(0, value), (1, value + 1)]));
    }
    let trace = builder.build().expect("trace is valid");
    let tree = cluster(&trace);

    let root = tree.node(tree.root()).expect("root resolves");
    let members: BTreeSet<ProcessId> = root.members().iter().copied().collect();
    assert_eq!(members.len(), root.members().len(), "no duplicates");
    let expected: BTreeSet<ProcessId> = (0..processes).map(pid).collect();
    assert_eq!(members, expected, "none missing");
}

#[test]
fn clustering_is_deterministic() {
    let trace = twins_and_outlier();
    let lockstep = LockstepBuilder::new()
        .build()
        .expect("default configuration is valid");
    let first = lockstep.cluster(&trace).expect("first run succeeds");
    let second = lockstep.cluster(&trace).expect("second run succeeds");
    assert_eq!(first, second, "same input must yield the same merge order");
}

#[test]
fn rebuild_preserves_member_sets_at_every_level() {
    let trace = twins_and_outlier();
    let member_sets = |tree: &ClusterTree| {
        let mut sets: Vec<BTreeSet<ProcessId>> = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let node = tree.node(id).expect("node resolves");
            sets.push(node.members().iter().copied().collect());
            stack.extend(node.children().iter().copied());
        }
        sets.sort();
        sets
    };

    let first = cluster(&trace);
    let first_sets = member_sets(&first);
    drop(first);
    let second = cluster(&trace);
    assert_eq!(first_sets, member_sets(&second));
}

#[test]
fn disconnected_pair_joins_at_the_undefined_distance() {
    // Processes 0 and 1 overlap; process 2 shares no estimable step with
    // either, so it joins last at the maximal distance.
    let trace = Trace::builder()
        .with_process(pid(0), chained(0, &[(0, 1), (1, 2)]))
        .with_process(pid(1), chained(1, &[(0, 1), (1, 3)]))
        .with_process(pid(2), vec![Event::new(9).with_metric(METRIC, 4)])
        .build()
        .expect("trace is valid");
    let tree = cluster(&trace);

    let root = tree.node(tree.root()).expect("root resolves");
    assert_eq!(root.merge_distance(), Some(Dissimilarity::Undefined));
    let members: BTreeSet<ProcessId> = root.members().iter().copied().collect();
    assert_eq!(members, BTreeSet::from([pid(0), pid(1), pid(2)]));
}

#[test]
fn empty_trace_fails_fast() {
    let trace = Trace::builder().build().expect("an empty trace builds");
    let lockstep = LockstepBuilder::new()
        .build()
        .expect("default configuration is valid");
    let err = lockstep
        .cluster(&trace)
        .expect_err("clustering an empty trace is a caller error");
    assert_eq!(err.code().as_str(), "LOCKSTEP_EMPTY_TRACE");
}
