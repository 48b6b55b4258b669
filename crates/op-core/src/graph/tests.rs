use serde_json::json;

use super::*;
use crate::port::ClearScope;
use crate::engine::ExecutionContext;
use crate::errors::ExecutionError;
use crate::metadata::{KindPrecondition, MetaData};
use crate::model::{IOObject, ObservedValue};
use crate::operator::{GenerateRule, Operator, OperatorBuilder, PassThroughRule};
use crate::operators::Subprocess;
use crate::process::Process;

struct Source;

impl Operator for Source {
    fn type_key(&self) -> &str {
        "test_source"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let out = b.output("output")?;
        b.rule(GenerateRule::fixed(out, MetaData::generic("text")))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        ctx.deliver("output", IOObject::new("text", json!("x")))
    }
}

struct Pass;

impl Operator for Pass {
    fn type_key(&self) -> &str {
        "test_pass"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = b.input("input")?;
        let output = b.output("output")?;
        b.precondition(input, KindPrecondition::new("text"))?;
        b.rule(PassThroughRule::new(input, output))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let obj = ctx.input("input")?;
        ctx.deliver_shared("output", obj)
    }
}

struct Merge;

impl Operator for Merge {
    fn type_key(&self) -> &str {
        "test_merge"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        b.extend_inputs("input")?;
        b.output("output")?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let n = ctx.collect_inputs()?.len();
        ctx.deliver("output", IOObject::new("count", json!(n)))
    }
}

fn process() -> Process {
    Process::new("test").unwrap()
}

fn names(g: &Graph, ports: &[PortId]) -> Vec<String> {
    ports.iter().map(|p| g.port(*p).unwrap().name().to_string()).collect()
}

/// Exactamente un puerto libre, y es el último.
fn assert_one_trailing_free_port(g: &Graph, ports: &[PortId]) {
    let free: Vec<_> = ports.iter().filter(|p| !g.is_connected(**p)).collect();
    assert_eq!(free.len(), 1, "ports: {:?}", names(g, ports));
    assert_eq!(free[0], ports.last().unwrap());
}

#[test]
fn connect_is_symmetric_and_disconnect_clears_both_ends() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    let out = g.output_port(a, "output").unwrap();
    let inp = g.input_port(b, "input").unwrap();

    g.connect(out, inp).unwrap();
    assert_eq!(g.destination_of(out), Some(inp));
    assert_eq!(g.source_of(inp), Some(out));

    g.disconnect(out).unwrap();
    assert_eq!(g.destination_of(out), None);
    assert_eq!(g.source_of(inp), None);
    assert!(matches!(g.disconnect(out), Err(GraphError::NotConnected(_))));
}

#[test]
fn double_connection_is_refused_and_keeps_the_existing_wire() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let c = p.add_operator("C", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    let a_out = g.output_port(a, "output").unwrap();
    let b_in = g.input_port(b, "input").unwrap();
    let c_in = g.input_port(c, "input").unwrap();
    let c_out = g.output_port(c, "output").unwrap();
    g.connect(a_out, b_in).unwrap();

    let busy_output = g.connect(a_out, c_in).unwrap_err();
    assert!(busy_output.is_cannot_connect());
    let busy_input = g.connect(c_out, b_in).unwrap_err();
    assert!(matches!(busy_input, GraphError::AlreadyConnected(_)));

    assert_eq!(g.destination_of(a_out), Some(b_in));
    assert!(!g.is_connected(c_in));
    assert!(!g.is_connected(c_out));
}

#[test]
fn direction_and_unit_boundaries_are_enforced() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    let x = g.add_operator(unit, "X", Box::new(Pass)).unwrap();

    let a_out = g.output_port(a, "output").unwrap();
    let b_in = g.input_port(b, "input").unwrap();
    assert!(matches!(g.connect(b_in, a_out), Err(GraphError::WrongDirection { .. })));

    let x_in = g.input_port(x, "input").unwrap();
    let err = g.connect(a_out, x_in).unwrap_err();
    assert!(matches!(err, GraphError::CrossUnitConnection { .. }));
    assert!(err.is_cannot_connect());

    // el borde de la unidad sí es un compañero legal
    g.wire_source(unit, "input 1", x, "input").unwrap();
    g.wire(a, "output", s, "input 1").unwrap();
    assert!(g.is_connected(x_in));
}

#[test]
fn extended_group_always_ends_with_one_free_port() {
    let mut p = process();
    let sources: Vec<_> = ["A", "B", "C"].iter()
                                         .map(|n| p.add_operator(n, Box::new(Source)).unwrap())
                                         .collect();
    let m = p.add_operator("M", Box::new(Merge)).unwrap();
    let g = p.graph_mut();
    assert_eq!(names(g, g.input_ports(m)), vec!["input 1"]);

    for (i, src) in sources.iter().enumerate() {
        g.wire(*src, "output", m, &format!("input {}", i + 1)).unwrap();
        assert_one_trailing_free_port(g, g.input_ports(m));
    }
    assert_eq!(names(g, g.input_ports(m)), vec!["input 1", "input 2", "input 3", "input 4"]);

    let second = g.input_port(m, "input 2").unwrap();
    g.disconnect(second).unwrap();
    assert_one_trailing_free_port(g, g.input_ports(m));
    // los nombres restantes no se renumeran
    assert_eq!(names(g, g.input_ports(m)), vec!["input 1", "input 3", "input 4"]);

    let third = g.input_port(m, "input 3").unwrap();
    g.disconnect(third).unwrap();
    assert_one_trailing_free_port(g, g.input_ports(m));
    assert_eq!(names(g, g.input_ports(m)), vec!["input 1", "input 4"]);
}

#[test]
fn wiring_by_name_adopts_the_spare_extended_port() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let m = p.add_operator("M", Box::new(Merge)).unwrap();
    let g = p.graph_mut();
    g.wire(a, "output", m, "input 3").unwrap();
    assert_eq!(names(g, g.input_ports(m)), vec!["input 3", "input 4"]);
    assert!(matches!(g.wire(a, "output", m, "other"), Err(GraphError::UnknownPort(_))));
}

#[test]
fn moving_an_operator_severs_connections_outside_the_new_unit() {
    let mut p = process();
    let main = p.main_unit();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    g.wire(a, "output", b, "input").unwrap();
    let a_out = g.output_port(a, "output").unwrap();

    g.move_operator(b, unit, 0).unwrap();
    assert!(!g.is_connected(a_out));
    assert_eq!(g.operator(b).unwrap().parent(), Some(unit));
    assert_eq!(g.operators_in(main), &[a, s]);
    assert_eq!(g.operators_in(unit), &[b]);
    assert!(g.is_ancestor_of(s, b));
    assert!(!g.is_ancestor_of(a, b));

    // reordenar dentro de la misma unidad conserva las conexiones
    g.wire_source(unit, "input 1", b, "input").unwrap();
    let b_in = g.input_port(b, "input").unwrap();
    g.move_operator(b, unit, 5).unwrap();
    assert!(g.is_connected(b_in));

    assert!(matches!(g.move_operator(s, unit, 0), Err(GraphError::IllegalMove(_))));
}

#[test]
fn removing_operators_disconnects_neighbours_and_protects_the_root() {
    let mut p = process();
    let root = p.root();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    g.wire(a, "output", b, "input").unwrap();
    let a_out = g.output_port(a, "output").unwrap();
    let ports_before = g.port_count();

    g.remove_operator(b).unwrap();
    assert!(!g.is_connected(a_out));
    assert!(g.operator(b).is_err());
    assert_eq!(g.port_count(), ports_before - 2);
    assert!(matches!(g.remove_operator(root), Err(GraphError::RootOperator(_))));
}

#[test]
fn removing_a_feeder_settles_the_extended_group_it_fed() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Source)).unwrap();
    let m = p.add_operator("M", Box::new(Merge)).unwrap();
    let g = p.graph_mut();
    g.wire(a, "output", m, "input 1").unwrap();
    g.wire(b, "output", m, "input 2").unwrap();

    g.remove_operator(a).unwrap();
    assert_eq!(names(g, g.input_ports(m)), vec!["input 2", "input 3"]);
    assert_one_trailing_free_port(g, g.input_ports(m));

    let lone = g.input_port(m, "input 3").unwrap();
    assert!(matches!(g.disconnect(lone), Err(GraphError::NotConnected(_))));
}

#[test]
fn names_are_unique_within_a_unit_only() {
    let mut p = process();
    p.add_operator("A", Box::new(Source)).unwrap();
    assert!(matches!(p.add_operator("A", Box::new(Source)), Err(GraphError::DuplicateName(_))));
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    g.add_operator(unit, "A", Box::new(Source)).unwrap();
    assert!(matches!(g.rename_operator(s, "A"), Err(GraphError::DuplicateName(_))));
}

#[test]
fn topological_order_follows_connections_then_list_order() {
    let mut p = process();
    let main = p.main_unit();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let c = p.add_operator("C", Box::new(Source)).unwrap();
    let g = p.graph_mut();
    assert_eq!(topological_order(g, main).order, vec![b, a, c]);

    g.wire(a, "output", b, "input").unwrap();
    let ordering = topological_order(g, main);
    assert_eq!(ordering.order, vec![a, b, c]);
    assert!(!ordering.has_cycle());
}

#[test]
fn cycles_are_detected_and_blocked_operators_keep_list_order() {
    let mut p = process();
    let main = p.main_unit();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let x = p.add_operator("X", Box::new(Pass)).unwrap();
    let y = p.add_operator("Y", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    g.wire(x, "output", y, "input").unwrap();
    g.wire(y, "output", x, "input").unwrap();
    let ordering = topological_order(g, main);
    assert!(ordering.has_cycle());
    assert_eq!(ordering.cyclic, vec![x, y]);
    assert_eq!(ordering.order, vec![a, x, y]);
}

#[test]
fn delivering_nothing_clears_the_downstream_input() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    g.wire(a, "output", b, "input").unwrap();
    let out = g.output_port(a, "output").unwrap();
    let inp = g.input_port(b, "input").unwrap();

    g.deliver(out, Some(IOObject::new("text", json!(1)))).unwrap();
    assert_eq!(g.receive(inp).unwrap().operator_trail(), vec!["A"]);
    assert!(g.port(out).unwrap().data().is_some());

    g.deliver(out, None).unwrap();
    assert!(g.receive(inp).is_none());
    assert!(g.port(out).unwrap().data().is_none());
    assert!(matches!(g.deliver(inp, None), Err(GraphError::NotAnOutput(_))));
}

#[test]
fn unit_boundary_ports_do_not_record_provenance() {
    let mut p = process();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    let x = g.add_operator(unit, "X", Box::new(Pass)).unwrap();
    g.wire_source(unit, "input 1", x, "input").unwrap();

    let source = g.inner_source(unit, "input 1").unwrap();
    g.deliver(source, Some(IOObject::new("text", json!("v")))).unwrap();
    let x_in = g.input_port(x, "input").unwrap();
    assert!(g.receive(x_in).unwrap().history().is_empty());
}

#[test]
fn metadata_clear_keeps_data_and_vice_versa() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let g = p.graph_mut();
    let out = g.output_port(a, "output").unwrap();
    g.deliver(out, Some(IOObject::new("text", json!(1)))).unwrap();
    g.deliver_meta_data(out, Some(MetaData::generic("text"))).unwrap();

    g.clear_all(ClearScope::MetaData);
    assert!(g.port(out).unwrap().meta_data().is_none());
    assert!(g.port(out).unwrap().data().is_some());

    g.deliver_meta_data(out, Some(MetaData::generic("text"))).unwrap();
    g.clear_port(out, ClearScope::Data).unwrap();
    assert!(g.port(out).unwrap().data().is_none());
    assert!(g.port(out).unwrap().meta_data().is_some());
}

#[test]
fn compatibility_is_checked_against_current_metadata() {
    let mut p = process();
    let a = p.add_operator("A", Box::new(Source)).unwrap();
    let b = p.add_operator("B", Box::new(Pass)).unwrap();
    let g = p.graph_mut();
    let out = g.output_port(a, "output").unwrap();
    let inp = g.input_port(b, "input").unwrap();
    // sin metadatos todavía: nada que objetar
    assert!(g.is_compatible(out, inp));
    g.deliver_meta_data(out, Some(MetaData::generic("image"))).unwrap();
    assert!(!g.is_compatible(out, inp));
}

#[test]
fn ancestor_values_are_visible_to_nested_operators() {
    let mut p = process();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    let x = g.add_operator(unit, "X", Box::new(Pass)).unwrap();
    g.set_value(s, "iteration", ObservedValue::Number(2.0));
    assert_eq!(g.value(x, "iteration"), None);
    assert_eq!(g.ancestor_value(x, "iteration"), Some(&ObservedValue::Number(2.0)));
    assert_eq!(g.parent_operator(x), Some(s));
}
