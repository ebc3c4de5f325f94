// tests/graph_validation.rs

use std::collections::BTreeSet;

use testdag::dag::{DagGraph, UnitSpec};
use testdag::errors::ValidationError;
use testdag_test_utils::{graph, spec};

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn diamond_builds_with_expected_edges() {
    let g = graph(&[("A", &[]), ("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])]);

    assert_eq!(g.len(), 4);
    assert_eq!(g.roots().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(g.dependencies_of("D"), &["B".to_string(), "C".to_string()]);
    assert_eq!(g.dependents_of("A"), &["B".to_string(), "C".to_string()]);
    assert!(g.dependents_of("D").is_empty());
}

#[test]
fn transitive_dependents_cover_whole_subtree() {
    let g = graph(&[
        ("Login", &[]),
        ("Collection", &["Login"]),
        ("Order", &["Collection"]),
        ("Report", &["Order", "Login"]),
        ("Other", &[]),
    ]);

    assert_eq!(
        g.transitive_dependents_of("Login"),
        Some(&names(&["Collection", "Order", "Report"]))
    );
    assert_eq!(g.transitive_dependents_of("Report"), Some(&BTreeSet::new()));
    assert_eq!(g.transitive_dependents_of("missing"), None);
    assert_eq!(
        g.transitive_prerequisites_of("Report"),
        names(&["Collection", "Login", "Order"])
    );
}

#[test]
fn duplicate_unit_is_rejected() {
    let err = DagGraph::build(&[spec("A", &[]), spec("B", &[]), spec("A", &[])]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DuplicateUnit {
            name: "A".to_string()
        }
    );
}

#[test]
fn duplicate_is_reported_before_unknown_dependency() {
    let err = DagGraph::build(&[spec("A", &["ghost"]), spec("A", &[])]).unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateUnit { .. }));
}

#[test]
fn unknown_dependency_names_both_sides() {
    let err = DagGraph::build(&[spec("A", &[]), spec("B", &["Z"])]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownDependency {
            unit: "B".to_string(),
            missing: "Z".to_string()
        }
    );
    assert_eq!(err.to_string(), "unit 'B' depends on unknown unit 'Z'");
}

#[test]
fn two_unit_cycle_is_reported_closed() {
    let err = DagGraph::build(&[spec("A", &["B"]), spec("B", &["A"])]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()]
        }
    );
    assert_eq!(err.to_string(), "cyclic dependency: A -> B -> A");
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = DagGraph::build(&[spec("A", &["A"])]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::CyclicDependency {
            cycle: vec!["A".into(), "A".into()]
        }
    );
}

#[test]
fn cycle_in_disconnected_component_is_found() {
    let err = DagGraph::build(&[
        spec("A", &[]),
        spec("B", &["A"]),
        spec("X", &["Z"]),
        spec("Y", &["X"]),
        spec("Z", &["Y"]),
    ])
    .unwrap_err();

    let cycle = match err {
        ValidationError::CyclicDependency { cycle } => cycle,
        other => panic!("expected a cycle, got {other:?}"),
    };
    assert_eq!(cycle.first(), cycle.last());
    let members: BTreeSet<String> = cycle.into_iter().collect();
    assert_eq!(members, names(&["X", "Y", "Z"]));
}

#[test]
fn unknown_dependency_is_reported_before_cycle() {
    let err =
        DagGraph::build(&[spec("A", &["B"]), spec("B", &["A"]), spec("C", &["nope"])]).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownDependency { .. }));
}

#[test]
fn empty_graph_is_valid() {
    let g = DagGraph::build(&[]).unwrap();
    assert!(g.is_empty());
    assert_eq!(g.roots().count(), 0);
}

#[test]
fn select_keeps_prerequisites_only() {
    let g = graph(&[
        ("A", &[]),
        ("B", &["A"]),
        ("C", &["B"]),
        ("D", &["A"]),
        ("E", &[]),
    ]);

    let narrowed = g.select(&["C"]).unwrap();
    assert_eq!(narrowed.units().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert_eq!(narrowed.dependents_of("A"), &["B".to_string()]);
}

#[test]
fn select_unknown_unit_fails() {
    let g = graph(&[("A", &[])]);
    let err = g.select(&["nope"]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownUnit {
            name: "nope".to_string()
        }
    );
}

#[test]
fn unit_spec_builder_deduplicates_prerequisites() {
    let s = UnitSpec::new("C").depends_on("A").depends_on("B").depends_on("A");
    assert_eq!(s.prerequisites, names(&["A", "B"]));
}
