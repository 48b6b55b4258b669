//! Procesos completos construidos con los operadores de ejemplo.

use op_core::constants::{ITERATION_VALUE, SUCCESS_VALUE};
use op_core::metadata::{Cardinality, MetaData};
use op_core::operator::GenerateRule;
use op_core::{ExecutionContext, ExecutionError, GraphError, HandleException, IOObject, IteratingChain,
              ObservedValue, Operator, OperatorBuilder, OperatorId, ParameterValue, Process, ProcessDefinition,
              Severity};
use op_operators::tables::ROWS_VALUE;
use op_operators::{registry, AppendTables, CountRows, CreateTable, Fail, FilterRows, LoopUntil, LoopValues,
                   Multiply, SelectAttributes};
use serde_json::json;

fn process() -> Process {
    Process::with_registry("ops", registry()).unwrap()
}

fn table(p: &mut Process, name: &str, xs: &[f64]) -> OperatorId {
    let op = p.add_operator(name, Box::new(CreateTable::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(op,
                    "attributes",
                    ParameterValue::List(vec![("x".into(), "regular".into()), ("id".into(), "id".into())]))
     .unwrap();
    let data = xs.iter().enumerate().map(|(i, x)| vec![*x, i as f64]).collect();
    g.set_parameter(op, "data", ParameterValue::Matrix(data)).unwrap();
    op
}

fn filter(p: &mut Process, name: &str, attribute: &str, value: ParameterValue) -> OperatorId {
    let op = p.add_operator(name, Box::new(FilterRows::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(op, "attribute", ParameterValue::String(attribute.into())).unwrap();
    g.set_parameter(op, "value", value).unwrap();
    op
}

#[test]
fn filters_shrink_tables_statically_and_at_run_time() {
    let mut p = process();
    let main = p.main_unit();
    let t = table(&mut p, "T", &[1.0, 2.0, 3.0, 4.0]);
    let f = filter(&mut p, "F", "x", ParameterValue::Real(3.0));
    let c = p.add_operator("C", Box::new(CountRows::new())).unwrap();
    let g = p.graph_mut();
    g.wire(t, "output", f, "input").unwrap();
    g.wire(f, "output", c, "input").unwrap();
    g.wire_sink(c, "count", main, "result 1").unwrap();
    g.wire_sink(c, "output", main, "result 2").unwrap();

    let report = p.validate();
    assert!(report.is_empty(), "{report}");
    let md = p.result_meta_data();
    assert_eq!(md[0], MetaData::generic("number"));
    assert_eq!(md[1].as_table().unwrap().rows(), Cardinality::at_most(4));

    let results = p.run().unwrap();
    assert_eq!(results.get(0).unwrap().data(), &json!(2));
    assert_eq!(results.get(1).unwrap().rows(), &[json!({ "x": 3.0, "id": 2.0 }), json!({ "x": 4.0, "id": 3.0 })]);
    assert_eq!(p.graph().value(c, ROWS_VALUE), Some(&ObservedValue::Number(2.0)));
    assert_eq!(results.get(1).unwrap().operator_trail(), vec!["T", "F", "C"]);
}

#[test]
fn missing_attributes_are_reported_on_the_input_port() {
    let mut p = process();
    let t = table(&mut p, "T", &[1.0]);
    let f = filter(&mut p, "F", "weight", ParameterValue::Real(0.0));
    let s = p.add_operator("S", Box::new(SelectAttributes::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(s, "attributes", ParameterValue::String("x, label".into())).unwrap();
    g.wire(t, "output", f, "input").unwrap();
    g.wire(f, "output", s, "input").unwrap();

    let report = p.validate();
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 2, "{report}");
    assert_eq!((errors[0].operator.as_str(), errors[0].port.as_deref()), ("F", Some("input")));
    assert!(errors[1].message.contains("label"));

    let err = p.run().unwrap_err();
    assert_eq!(err.to_string(), "operator 'F': attribute 'weight' is missing");
}

#[test]
fn ragged_tables_are_rejected_in_both_passes() {
    let mut p = process();
    let t = p.add_operator("T", Box::new(CreateTable::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(t, "attributes", ParameterValue::List(vec![("a".into(), "regular".into())])).unwrap();
    g.set_parameter(t, "data", ParameterValue::Matrix(vec![vec![1.0], vec![1.0, 2.0]])).unwrap();

    let report = p.validate();
    assert_eq!(report.for_operator("T").filter(|i| i.severity == Severity::Error).count(), 1);
    assert!(p.run().is_err());
}

#[test]
fn append_collects_every_connected_table() {
    let mut p = process();
    let main = p.main_unit();
    let a = table(&mut p, "A", &[1.0, 2.0]);
    let b = table(&mut p, "B", &[5.0]);
    let j = p.add_operator("Join", Box::new(AppendTables::new())).unwrap();
    let g = p.graph_mut();
    g.wire(a, "output", j, "table 1").unwrap();
    g.wire(b, "output", j, "table 2").unwrap();
    g.wire_sink(j, "output", main, "result 1").unwrap();
    let spare: Vec<String> = g.input_ports(j).iter().map(|id| g.port(*id).unwrap().name().to_string()).collect();
    assert_eq!(spare, vec!["table 1", "table 2", "table 3"]);

    assert!(p.validate().is_empty());
    assert_eq!(p.result_meta_data()[0].as_table().unwrap().rows(), Cardinality::exact(3));
    let xs: Vec<f64> = p.run()
                        .unwrap()
                        .get(0)
                        .unwrap()
                        .rows()
                        .iter()
                        .filter_map(|r| r["x"].as_f64())
                        .collect();
    assert_eq!(xs, vec![1.0, 2.0, 5.0]);
}

#[test]
fn multiply_fans_one_object_out() {
    let mut p = process();
    let main = p.main_unit();
    let t = table(&mut p, "T", &[1.0]);
    let m = p.add_operator("M", Box::new(Multiply::new())).unwrap();
    let g = p.graph_mut();
    g.wire(t, "output", m, "input").unwrap();
    g.wire_sink(m, "output 1", main, "result 1").unwrap();
    g.wire_sink(m, "output 2", main, "result 2").unwrap();

    assert!(p.validate().is_empty());
    assert!(p.result_meta_data().iter().all(|md| md.as_table().is_some()));
    let results = p.run().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.get(0).unwrap().rows(), results.get(1).unwrap().rows());
}

#[test]
fn loop_values_publish_each_value_as_a_macro() {
    let mut p = process();
    let main = p.main_unit();
    let t = table(&mut p, "T", &[1.0, 2.0, 3.0]);
    let l = p.add_operator("Loop", Box::new(IteratingChain::new(LoopValues::default()))).unwrap();
    let unit = p.graph().unit_by_name(l, IteratingChain::<LoopValues>::UNIT).unwrap();
    let f = p.graph_mut().add_operator(unit, "F", Box::new(FilterRows::new())).unwrap();
    let c = p.graph_mut().add_operator(unit, "C", Box::new(CountRows::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(l,
                    "values",
                    ParameterValue::List(vec![("a".into(), "1".into()), ("b".into(), "2".into()), ("c".into(), "3".into())]))
     .unwrap();
    g.set_parameter(f, "attribute", ParameterValue::String("x".into())).unwrap();
    g.set_parameter(f, "value", ParameterValue::String("%{loop_value}".into())).unwrap();
    g.wire(t, "output", l, "input 1").unwrap();
    g.wire_source(unit, "input 1", f, "input").unwrap();
    g.wire(f, "output", c, "input").unwrap();
    g.wire_sink(c, "count", unit, "output 1").unwrap();
    g.wire_sink(l, "output 1", main, "result 1").unwrap();

    let report = p.validate();
    assert!(report.is_empty(), "{report}");
    assert!(matches!(&p.result_meta_data()[0], MetaData::Collection(inner) if inner.kind() == Some("number")));

    let counts = p.run().unwrap();
    let counts: Vec<_> = counts.get(0).unwrap().members().iter().map(|m| m.data().clone()).collect();
    assert_eq!(counts, vec![json!(3), json!(2), json!(1)]);
    assert_eq!(p.services().macros().get("loop_value"), Some("3"));
}

/// Entrega el número de iteración del bucle que lo contiene.
struct Counter;

impl Operator for Counter {
    fn type_key(&self) -> &str {
        "counter"
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let out = builder.output("output")?;
        builder.rule(GenerateRule::fixed(out, MetaData::generic("number")))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let n = ctx.ancestor_value(ITERATION_VALUE).and_then(|v| v.as_number()).unwrap_or(0.0);
        ctx.deliver("output", IOObject::new("number", json!(n)))
    }
}

fn loop_until(p: &mut Process, body: Box<dyn Operator>) -> OperatorId {
    let main = p.main_unit();
    let l = p.add_operator("Until", Box::new(IteratingChain::new(LoopUntil))).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(l, IteratingChain::<LoopUntil>::UNIT).unwrap();
    let b = g.add_operator(unit, "Body", body).unwrap();
    g.set_parameter(l, "attribute", ParameterValue::String("value".into())).unwrap();
    g.set_parameter(l, "threshold", ParameterValue::Real(3.0)).unwrap();
    g.wire_sink(b, "output", unit, "output 1").unwrap();
    g.wire_sink(l, "output 1", main, "result 1").unwrap();
    l
}

#[test]
fn loop_until_stops_once_the_threshold_is_reached() {
    let mut p = process();
    let l = loop_until(&mut p, Box::new(Counter));
    let results = p.run().unwrap();
    assert_eq!(results.get(0).unwrap().members().len(), 4);
    assert_eq!(p.graph().value(l, ITERATION_VALUE), Some(&ObservedValue::Number(4.0)));
}

#[test]
fn loop_until_without_a_numeric_result_fails() {
    let mut p = process();
    let body = Box::new(CreateTable::new());
    let l = loop_until(&mut p, body);
    let unit = p.graph().unit_by_name(l, IteratingChain::<LoopUntil>::UNIT).unwrap();
    let b = p.graph().operator_by_name(unit, "Body").unwrap();
    p.graph_mut()
     .set_parameter(b, "attributes", ParameterValue::List(vec![("other".into(), "regular".into())]))
     .unwrap();
    p.graph_mut().set_parameter(b, "data", ParameterValue::Matrix(vec![vec![1.0]])).unwrap();

    let err = p.run().unwrap_err();
    assert!(matches!(err, ExecutionError::Operator(ref e) if e.code == "loop_value_missing"), "{err}");
}

#[test]
fn requested_failures_can_be_contained() {
    let mut p = process();
    let h = p.add_operator("Try", Box::new(HandleException::new())).unwrap();
    let unit = p.graph().unit_by_name(h, HandleException::UNIT).unwrap();
    let f = p.graph_mut().add_operator(unit, "Fail", Box::new(Fail)).unwrap();
    p.graph_mut().set_parameter(f, "message", ParameterValue::String("no data for %{process_name}".into())).unwrap();

    p.run().unwrap();
    assert_eq!(p.graph().value(h, SUCCESS_VALUE), Some(&ObservedValue::Number(0.0)));
    assert_eq!(p.services().macros().get("exception"), Some("operator 'Fail': no data for ops"));
}

#[test]
fn json_definitions_use_registered_type_keys() {
    let text = r#"{
        "name": "from_json",
        "macros": { "cut": "2" },
        "root": {
            "name": "main",
            "operators": [
                { "name": "T", "type": "create_table",
                  "parameters": {
                      "attributes": { "type": "list", "value": [["x", "regular"]] },
                      "data": { "type": "matrix", "value": [[1.0], [2.0], [3.0]] } } },
                { "name": "F", "type": "filter_rows",
                  "parameters": {
                      "attribute": { "type": "string", "value": "x" },
                      "value": { "type": "string", "value": "%{cut}" } } },
                { "name": "Loop", "type": "loop_times",
                  "parameters": { "iterations": { "type": "int", "value": 2 } },
                  "units": [ { "name": "iteration",
                               "operators": [ { "name": "C", "type": "count_rows" } ],
                               "connections": [
                                   { "from_port": "input 1", "to_operator": "C", "to_port": "input" },
                                   { "from_operator": "C", "from_port": "count", "to_port": "output 1" } ] } ] }
            ],
            "connections": [
                { "from_operator": "T", "from_port": "output", "to_operator": "F", "to_port": "input" },
                { "from_operator": "F", "from_port": "output", "to_operator": "Loop", "to_port": "input 1" },
                { "from_operator": "Loop", "from_port": "output 1", "to_port": "result 1" }
            ]
        }
    }"#;
    let definition = ProcessDefinition::from_json(text).unwrap();
    let mut p = Process::from_definition(&definition, registry()).unwrap();
    assert!(p.validate().is_empty());
    let results = p.run().unwrap();
    let counts: Vec<_> = results.get(0).unwrap().members().iter().map(|m| m.data().clone()).collect();
    assert_eq!(counts, vec![json!(2), json!(2)]);
    assert_eq!(ProcessDefinition::from_json(&p.to_definition().to_json().unwrap()).unwrap(),
               p.to_definition());
}

#[test]
fn every_sample_operator_is_registered() {
    let keys = registry().keys();
    for key in ["create_table", "filter_rows", "select_attributes", "append_tables", "count_rows", "multiply",
                "set_macro", "fail", "loop_times", "loop_values", "loop_until", "subprocess", "handle_exception",
                "execute_process"]
    {
        assert!(keys.iter().any(|k| k == key), "missing {key}");
    }
}
