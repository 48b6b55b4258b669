mod common;

use std::sync::{Arc, Mutex};

use common::{registry, Emit, EmitTable, Needs, Observe, Relay, Shrink, StopAfter};
use op_core::metadata::{Cardinality, SetRelation, TableMetaData};
use op_core::{IteratingChain, MetaData, ParameterValue, Process, Severity, Subprocess};

fn process() -> Process {
    Process::with_registry("validation", registry()).unwrap()
}

#[test]
fn every_failing_precondition_is_reported_in_one_pass() {
    let mut p = process();
    let t = p.add_operator("T", Box::new(EmitTable)).unwrap();
    let e = p.add_operator("E", Box::new(Emit)).unwrap();
    let wants_image = p.add_operator("WantsImage", Box::new(Needs("image"))).unwrap();
    let wants_table = p.add_operator("WantsTable", Box::new(Needs("table"))).unwrap();
    let g = p.graph_mut();
    g.set_parameter(t, "rows", ParameterValue::Int(3)).unwrap();
    g.wire(t, "output", wants_image, "input").unwrap();
    g.wire(e, "output", wants_table, "input").unwrap();

    let report = p.validate();
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 2, "{report}");
    assert_eq!(errors[0].operator, "WantsImage");
    assert_eq!(errors[0].port.as_deref(), Some("input"));
    assert_eq!(errors[1].operator, "WantsTable");
}

#[test]
fn static_pass_is_a_pure_function_of_the_graph() {
    let mut p = process();
    let t = p.add_operator("T", Box::new(EmitTable)).unwrap();
    let s = p.add_operator("S", Box::new(Shrink)).unwrap();
    let n = p.add_operator("N", Box::new(Needs("image"))).unwrap();
    let g = p.graph_mut();
    g.set_parameter(t, "rows", ParameterValue::Int(10)).unwrap();
    g.wire(t, "output", s, "input").unwrap();
    g.wire(s, "output", n, "input").unwrap();

    let first = p.validate();
    let out = p.graph().output_port(s, "output").unwrap();
    let md_first = p.graph().port(out).unwrap().meta_data().cloned();
    let second = p.validate();
    let md_second = p.graph().port(out).unwrap().meta_data().cloned();
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(md_first, md_second);
    assert!(md_first.is_some());
}

#[test]
fn unconnected_mandatory_inputs_and_undefined_parameters_are_errors() {
    let mut p = process();
    p.add_operator("R", Box::new(Relay)).unwrap();
    p.add_operator("T", Box::new(EmitTable)).unwrap();

    let report = p.validate();
    let relay: Vec<_> = report.for_operator("R").collect();
    assert_eq!(relay.len(), 1);
    assert_eq!(relay[0].port.as_deref(), Some("input"));
    assert_eq!(relay[0].severity, Severity::Error);

    let table: Vec<_> = report.for_operator("T").collect();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].port, None);
    assert!(table[0].message.contains("rows"));
}

#[test]
fn cycles_become_operator_errors_without_stopping_validation() {
    let mut p = process();
    let x = p.add_operator("X", Box::new(Relay)).unwrap();
    let y = p.add_operator("Y", Box::new(Relay)).unwrap();
    let n = p.add_operator("N", Box::new(Needs("image"))).unwrap();
    let e = p.add_operator("E", Box::new(Emit)).unwrap();
    let g = p.graph_mut();
    g.wire(x, "output", y, "input").unwrap();
    g.wire(y, "output", x, "input").unwrap();
    g.wire(e, "output", n, "input").unwrap();

    let report = p.validate();
    assert_eq!(report.for_operator("X").filter(|i| i.port.is_none()).count(), 1);
    assert_eq!(report.for_operator("Y").filter(|i| i.port.is_none()).count(), 1);
    // el resto del grafo también se validó
    assert_eq!(report.for_operator("N").count(), 1);
}

#[test]
fn metadata_flows_through_nested_units_and_filters_never_claim_exact_rows() {
    let mut p = process();
    let main = p.main_unit();
    let t = p.add_operator("T", Box::new(EmitTable)).unwrap();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(t, "rows", ParameterValue::Int(5)).unwrap();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    let f = g.add_operator(unit, "F", Box::new(Shrink)).unwrap();
    g.wire(t, "output", s, "input 1").unwrap();
    g.wire_source(unit, "input 1", f, "input").unwrap();
    g.wire_sink(f, "output", unit, "output 1").unwrap();
    g.wire_sink(s, "output 1", main, "result 1").unwrap();

    let report = p.validate();
    assert!(report.is_empty(), "{report}");
    let results = p.result_meta_data();
    assert_eq!(results.len(), 1);
    let rows = results[0].as_table().unwrap().rows();
    assert_eq!(rows, Cardinality::at_most(5));
    assert!(!rows.is_exact());
}

#[test]
fn loop_results_are_collections_with_loosened_cardinality() {
    let mut p = process();
    let main = p.main_unit();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let l = p.add_operator("Loop", Box::new(IteratingChain::new(StopAfter(3)))).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(l, IteratingChain::<StopAfter>::UNIT).unwrap();
    let o = g.add_operator(unit, "O", Box::new(Observe(seen.clone()))).unwrap();
    g.wire_sink(o, "output", unit, "output 1").unwrap();
    g.wire_sink(l, "output 1", main, "result 1").unwrap();

    let report = p.validate();
    assert!(report.is_empty(), "{report}");
    let results = p.result_meta_data();
    let MetaData::Collection(inner) = &results[0] else { panic!("expected a collection, got {}", results[0]) };
    let rows = inner.as_table().unwrap().rows();
    assert_eq!(rows.relation(), SetRelation::Superset);
    assert_ne!(rows.relation(), SetRelation::Equal);
    // la validación no ejecuta nada
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn input_metadata_can_be_supplied_to_the_process() {
    let mut p = process();
    let main = p.main_unit();
    let n = p.add_operator("N", Box::new(Needs("table"))).unwrap();
    p.graph_mut().wire_source(main, "input 1", n, "input").unwrap();

    let ok = p.validate_with(&[MetaData::Table(TableMetaData::new())]);
    assert!(ok.is_empty(), "{ok}");
    let bad = p.validate_with(&[MetaData::generic("text")]);
    assert_eq!(bad.errors().count(), 1);
}
