//! Pasada dinámica: ejecución real en orden topológico.

use log::Level;

use crate::constants::APPLY_COUNT_VALUE;
use crate::errors::ExecutionError;
use crate::graph::{topological_order, Graph, OperatorId, UnitId};
use crate::process::ProcessServices;

use super::ExecutionContext;

/// Ejecuta todos los miembros de `unit`. La señal de parada se sondea
/// antes de cada operador; un ciclo impide ejecutar la unidad.
pub(crate) fn execute_unit(graph: &mut Graph, services: &mut ProcessServices, unit: UnitId)
                           -> Result<(), ExecutionError> {
    let ordering = topological_order(graph, unit);
    if ordering.has_cycle() {
        let name = graph.unit(unit)?.name.clone();
        return Err(ExecutionError::user("cyclic_unit", [name]));
    }
    for op in ordering.order {
        if let Err(e) = services.check_for_stop() {
            services.log(Level::Info, Some(graph.name_of(op)), "stop requested, not starting operator");
            return Err(e);
        }
        execute_operator(graph, services, op)?;
    }
    Ok(())
}

pub(crate) fn execute_operator(graph: &mut Graph, services: &mut ProcessServices, op: OperatorId)
                               -> Result<(), ExecutionError> {
    let name = graph.operator(op)?.name.clone();
    for port in graph.input_ports(op) {
        let p = graph.port(*port)?;
        if !p.optional && p.data.is_none() {
            return Err(ExecutionError::MissingInput { operator: name,
                                                      port: p.name.clone() });
        }
    }
    // "sin valor" aguas abajo hasta que el operador entregue algo nuevo
    for port in graph.output_ports(op).to_vec() {
        graph.deliver_shared(port, None)?;
    }

    let mut behavior = graph.operator_mut(op)?
                            .behavior
                            .take()
                            .ok_or_else(|| ExecutionError::Internal(format!("operator '{name}' is already executing")))?;
    let count = {
        let node = graph.operator_mut(op)?;
        node.apply_count += 1;
        node.apply_count
    };
    graph.set_value(op, APPLY_COUNT_VALUE, count.into());

    services.log(Level::Debug, Some(&name), "executing");
    let result = {
        let mut ctx = ExecutionContext::new(graph, services, op);
        behavior.execute(&mut ctx)
    };
    if let Ok(node) = graph.operator_mut(op) {
        node.behavior = Some(behavior);
    }

    match result {
        Ok(()) => {
            services.log(Level::Debug, Some(&name), "finished");
            Ok(())
        }
        Err(e) => {
            let e = e.in_operator(&name);
            if e.is_stop() {
                services.log(Level::Info, Some(&name), "stopped");
            } else if raised_here(&e, &name) {
                services.log(Level::Error, Some(&name), &format!("failed: {e}"));
            } else {
                services.log(Level::Debug, Some(&name), &format!("aborted: {e}"));
            }
            Err(e)
        }
    }
}

/// ¿Nació el error en este operador (y no en uno anidado)?
fn raised_here(error: &ExecutionError, name: &str) -> bool {
    match error {
        ExecutionError::Operator(e) => e.operator.as_deref() == Some(name),
        ExecutionError::MissingInput { operator, .. }
        | ExecutionError::UndefinedParameter { operator, .. }
        | ExecutionError::InvalidParameter { operator, .. }
        | ExecutionError::IterationLimit { operator, .. } => operator == name,
        _ => true,
    }
}
