//! Orden topológico estable de una unidad.
//!
//! Kahn estable respecto al orden de la lista: en cada paso se elige el
//! primer operador (según la lista de la unidad) cuyas dependencias ya
//! están colocadas. Sin conexiones, el orden es exactamente el de la lista.

use super::{Graph, OperatorId, UnitId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    /// Todos los miembros: primero los ordenables, luego los bloqueados por un ciclo.
    pub order: Vec<OperatorId>,
    /// Miembros que forman parte de un ciclo o dependen de uno (orden de lista).
    pub cyclic: Vec<OperatorId>,
}

impl Ordering {
    pub fn has_cycle(&self) -> bool {
        !self.cyclic.is_empty()
    }
}

pub fn topological_order(graph: &Graph, unit: UnitId) -> Ordering {
    let members = graph.operators_in(unit);
    let position = |op: OperatorId| members.iter().position(|m| *m == op);

    // predecesores de cada miembro (por índice en la lista)
    let predecessors: Vec<Vec<usize>> = members.iter()
                                               .map(|&op| {
                                                   let mut preds: Vec<usize> =
                                                       graph.input_ports(op)
                                                            .iter()
                                                            .filter_map(|p| graph.source_of(*p))
                                                            .filter(|src| graph.is_operator_port(*src))
                                                            .filter_map(|src| graph.port_operator(src))
                                                            .filter_map(position)
                                                            .collect();
                                                   preds.sort_unstable();
                                                   preds.dedup();
                                                   preds
                                               })
                                               .collect();

    let mut placed = vec![false; members.len()];
    let mut order = Vec::with_capacity(members.len());
    while let Some(next) = (0..members.len()).find(|&i| !placed[i] && predecessors[i].iter().all(|&p| placed[p])) {
        placed[next] = true;
        order.push(members[next]);
    }
    let cyclic: Vec<OperatorId> = (0..members.len()).filter(|&i| !placed[i]).map(|i| members[i]).collect();
    order.extend(cyclic.iter().copied());
    Ordering { order, cyclic }
}
