//! Pasada estática: propagación de metadatos y recogida de problemas.

use crate::graph::{topological_order, Graph, OperatorId, PortId, UnitId};
use crate::errors::ParameterError;
use crate::process::ProcessServices;
use crate::report::{Severity, ValidationIssue};

use super::TransformContext;

/// Transforma los miembros de `unit` en orden topológico. Los operadores
/// que forman un ciclo (o dependen de uno) reciben un problema ERROR y se
/// transforman igualmente en orden de lista.
pub(crate) fn transform_unit(graph: &mut Graph, services: &ProcessServices, unit: UnitId) {
    let ordering = topological_order(graph, unit);
    for op in &ordering.cyclic {
        push_operator_issue(graph,
                            *op,
                            Severity::Error,
                            "operator is part of a dependency cycle or depends on one".to_string());
    }
    for op in ordering.order {
        transform_operator(graph, services, op);
    }
}

pub(crate) fn transform_operator(graph: &mut Graph, services: &ProcessServices, op: OperatorId) {
    let Some(node) = graph.operators.get(op) else { return };
    let undefined: Vec<String> = node.parameters.undefined().into_iter().map(str::to_string).collect();
    for key in undefined {
        push_operator_issue(graph, op, Severity::Error, ParameterError::Undefined { key }.to_string());
    }

    let inputs = graph.input_ports(op).to_vec();
    for port in &inputs {
        let mandatory_unconnected = graph.ports.get(*port).is_some_and(|p| !p.optional && !p.is_connected());
        if mandatory_unconnected {
            push_port_issue(graph, op, *port, Severity::Error, "mandatory input is not connected".to_string());
        }
    }

    let behavior = graph.operators.get_mut(op).and_then(|n| n.behavior.take());
    match behavior {
        Some(mut behavior) => {
            {
                let mut ctx = TransformContext::new(graph, services, op);
                behavior.transform(&mut ctx);
            }
            if let Some(node) = graph.operators.get_mut(op) {
                node.behavior = Some(behavior);
            }
        }
        None => push_operator_issue(graph,
                                    op,
                                    Severity::Error,
                                    "operator is already being transformed".to_string()),
    }

    check_preconditions(graph, op);
}

/// Evalúa las precondiciones de las entradas conectadas contra lo que les
/// llegó. Cada fallo queda adjunto a su puerto con su severidad.
fn check_preconditions(graph: &mut Graph, op: OperatorId) {
    for port in graph.input_ports(op).to_vec() {
        let Some(p) = graph.ports.get(port) else { continue };
        if !p.is_connected() || p.preconditions.is_empty() {
            continue;
        }
        let md = graph.receive_meta_data(port);
        let failures: Vec<_> = p.preconditions.iter().filter_map(|pre| pre.check(&md).err()).collect();
        for failure in failures {
            push_port_issue(graph, op, port, failure.severity, failure.message);
        }
    }
}

fn push_operator_issue(graph: &mut Graph, op: OperatorId, severity: Severity, message: String) {
    if let Some(node) = graph.operators.get_mut(op) {
        let issue = ValidationIssue::on_operator(&node.name, severity, message);
        node.issues.push(issue);
    }
}

fn push_port_issue(graph: &mut Graph, op: OperatorId, port: PortId, severity: Severity, message: String) {
    let operator = graph.name_of(op).to_string();
    if let Some(p) = graph.ports.get_mut(port) {
        let issue = ValidationIssue::on_port(&operator, &p.name, severity, message);
        p.issues.push(issue);
    }
}

/// Recoge los problemas de `unit` en profundidad y en orden topológico:
/// por operador, los suyos, los de sus entradas, los de sus salidas y
/// luego los de sus unidades anidadas (bordes incluidos).
pub(crate) fn collect_issues(graph: &Graph, unit: UnitId, out: &mut Vec<ValidationIssue>) {
    for op in topological_order(graph, unit).order {
        collect_operator_issues(graph, op, out);
    }
}

pub(crate) fn collect_operator_issues(graph: &Graph, op: OperatorId, out: &mut Vec<ValidationIssue>) {
    let Some(node) = graph.operators.get(op) else { return };
    out.extend(node.issues.iter().cloned());
    let own = graph.input_ports(op).iter().chain(graph.output_ports(op));
    for port in own {
        if let Some(p) = graph.ports.get(*port) {
            out.extend(p.issues.iter().cloned());
        }
    }
    for unit in &node.units {
        let Some(u) = graph.units.get(*unit) else { continue };
        for port in graph.ports_of(u.inner_sources).iter().chain(graph.ports_of(u.inner_sinks)) {
            if let Some(p) = graph.ports.get(*port) {
                out.extend(p.issues.iter().cloned());
            }
        }
        collect_issues(graph, *unit, out);
    }
}
