use op_core::constants::{ITERATION_VALUE, SUCCESS_VALUE};
use op_core::{ObservedValue, Process, ProcessDefinition};
use opflow::{demo_definition, demo_process};
use serde_json::json;

#[test]
fn demo_validates_cleanly() {
    let mut p = demo_process().unwrap();
    let report = p.validate();
    assert!(!report.has_errors(), "{report}");
}

#[test]
fn demo_counts_rows_per_threshold_and_contains_the_failure() {
    let mut p = demo_process().unwrap();
    let results = p.run().unwrap();

    let counts = results.get(0).unwrap();
    assert_eq!(counts.kind(), "collection");
    assert_eq!(counts.data(), &json!([5, 2]));
    assert!(results.slots()[1].is_none());

    let graph = p.graph();
    let cuts = graph.find_operator("Cuts").unwrap();
    let guard = graph.find_operator("Guard").unwrap();
    assert_eq!(graph.value(cuts, ITERATION_VALUE), Some(&ObservedValue::Number(2.0)));
    assert_eq!(graph.value(guard, SUCCESS_VALUE), Some(&ObservedValue::Number(0.0)));
    assert_eq!(p.services().macros().get("exception"), Some("operator 'Broken': demo failure"));
}

#[test]
fn demo_runs_again_from_a_clean_state() {
    let mut p = demo_process().unwrap();
    let first = p.run().unwrap();
    let second = p.run().unwrap();
    assert_eq!(first.get(0).unwrap().data(), second.get(0).unwrap().data());
    assert_eq!(p.services().macros().get("cut"), Some("5"));
}

#[test]
fn demo_survives_a_definition_round_trip() {
    let p = demo_process().unwrap();
    let text = p.to_definition().to_json().unwrap();
    let rebuilt = ProcessDefinition::from_json(&text).unwrap();
    assert_eq!(rebuilt.definition_hash(), demo_definition().definition_hash());
    let mut again = Process::from_definition(&rebuilt, opflow::operators::registry()).unwrap();
    assert_eq!(again.run().unwrap().get(0).unwrap().data(), &json!([5, 2]));
}
