//! Conversión entre `Process` y su `ProcessDefinition`.

use std::sync::Arc;

use crate::errors::GraphError;
use crate::graph::{Graph, PortId, UnitId};
use crate::param::PROCESS_NAME_MACRO;
use crate::repo::{ConnectionDefinition, OperatorDefinition, OperatorRegistry, ProcessDefinition, UnitDefinition};

use super::Process;

impl Process {
    /// Construye el proceso descrito por `definition` con las fábricas de
    /// `registry`. Falla ante tipos, operadores o puertos desconocidos.
    pub fn from_definition(definition: &ProcessDefinition, registry: Arc<OperatorRegistry>)
                           -> Result<Self, GraphError> {
        let mut process = Process::with_registry(&definition.name, Arc::clone(&registry))?;
        for (k, v) in &definition.macros {
            if k != PROCESS_NAME_MACRO {
                process.define_macro(k, v);
            }
        }
        let main = process.main;
        build_unit(&mut process.graph, &registry, main, &definition.root)?;
        Ok(process)
    }

    pub fn to_definition(&self) -> ProcessDefinition {
        let mut definition = ProcessDefinition::new(self.name(), unit_definition(&self.graph, self.main));
        definition.macros = self.macros.clone();
        definition
    }
}

fn build_unit(graph: &mut Graph, registry: &OperatorRegistry, unit: UnitId, definition: &UnitDefinition)
              -> Result<(), GraphError> {
    for op_def in &definition.operators {
        let behavior = registry.create(&op_def.type_key)?;
        let op = graph.add_operator(unit, &op_def.name, behavior)?;
        for (key, value) in &op_def.parameters {
            graph.set_parameter(op, key, value.clone())?;
        }
        for unit_def in &op_def.units {
            let nested = graph.unit_by_name(op, &unit_def.name)
                              .ok_or_else(|| GraphError::UnknownUnit(format!("{}/{}", op_def.name, unit_def.name)))?;
            build_unit(graph, registry, nested, unit_def)?;
        }
    }

    // Los puertos extendidos se adoptan en orden creciente de índice.
    let mut connections: Vec<&ConnectionDefinition> = definition.connections.iter().collect();
    connections.sort_by_key(|c| (trailing_index(&c.to_port), trailing_index(&c.from_port)));
    for c in connections {
        let lookup = |graph: &Graph, name: &str| {
            graph.operator_by_name(unit, name)
                 .ok_or_else(|| GraphError::UnknownOperator(name.to_string()))
        };
        match (c.from_operator.as_deref(), c.to_operator.as_deref()) {
            (Some(from), Some(to)) => {
                let (from, to) = (lookup(graph, from)?, lookup(graph, to)?);
                graph.wire(from, &c.from_port, to, &c.to_port)?;
            }
            (None, Some(to)) => {
                let to = lookup(graph, to)?;
                graph.wire_source(unit, &c.from_port, to, &c.to_port)?;
            }
            (Some(from), None) => {
                let from = lookup(graph, from)?;
                graph.wire_sink(from, &c.from_port, unit, &c.to_port)?;
            }
            (None, None) => graph.wire_through(unit, &c.from_port, &c.to_port)?,
        }
    }
    Ok(())
}

fn trailing_index(port: &str) -> usize {
    port.rsplit(' ').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

fn unit_definition(graph: &Graph, unit: UnitId) -> UnitDefinition {
    let name = graph.unit(unit).map(|u| u.name.clone()).unwrap_or_default();
    let mut definition = UnitDefinition::new(&name);
    for &op in graph.operators_in(unit) {
        let Ok(node) = graph.operator(op) else { continue };
        let mut op_def = OperatorDefinition::new(node.name(), node.type_key());
        for (key, value) in node.parameters().explicit_values() {
            op_def.parameters.insert(key.to_string(), value.clone());
        }
        op_def.units = node.units().iter().map(|u| unit_definition(graph, *u)).collect();
        definition.operators.push(op_def);

        for &input in graph.input_ports(op) {
            if let Some(c) = connection_into(graph, input, Some(node.name())) {
                definition.connections.push(c);
            }
        }
    }
    if let Ok(u) = graph.unit(unit) {
        for &sink in graph.ports_of(u.inner_sinks) {
            if let Some(c) = connection_into(graph, sink, None) {
                definition.connections.push(c);
            }
        }
    }
    definition
}

fn connection_into(graph: &Graph, input: PortId, to_operator: Option<&str>) -> Option<ConnectionDefinition> {
    let source = graph.source_of(input)?;
    let from_operator = if graph.is_operator_port(source) {
        graph.port_operator(source).map(|op| graph.name_of(op))
    } else {
        None
    };
    Some(ConnectionDefinition::new(from_operator,
                                   graph.port(source).ok()?.name(),
                                   to_operator,
                                   graph.port(input).ok()?.name()))
}
