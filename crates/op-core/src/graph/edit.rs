//! Edición estructural: alta, baja, movimiento y renombrado de operadores.

use super::{ExecutionUnit, Graph, GroupId, OperatorId, OperatorNode, PortId, UnitId};
use crate::errors::GraphError;
use crate::operator::{Operator, OperatorBuilder};
use crate::port::{GroupOwner, Port, PortDirection, PortGroup};

impl Graph {
    /// Añade un operador al final de `unit`.
    pub fn add_operator(&mut self, unit: UnitId, name: &str, behavior: Box<dyn Operator>)
                        -> Result<OperatorId, GraphError> {
        let len = self.unit(unit)?.operators.len();
        self.insert_operator(unit, len, name, behavior)
    }

    /// Añade un operador en la posición `position` de `unit` (acotada a la longitud).
    pub fn insert_operator(&mut self, unit: UnitId, position: usize, name: &str, behavior: Box<dyn Operator>)
                           -> Result<OperatorId, GraphError> {
        self.unit(unit)?;
        if self.operator_by_name(unit, name).is_some() {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        let op = self.create_operator(Some(unit), name, behavior)?;
        let list = &mut self.unit_mut(unit)?.operators;
        list.insert(position.min(list.len()), op);
        Ok(op)
    }

    /// Crea el nodo, deja que el comportamiento declare puertos, unidades,
    /// parámetros y reglas, y arranca los extensores.
    pub(crate) fn create_operator(&mut self, parent: Option<UnitId>, name: &str, mut behavior: Box<dyn Operator>)
                                  -> Result<OperatorId, GraphError> {
        let op = self.operators.next_id();
        let inputs = self.groups.insert(PortGroup::new(GroupOwner::Operator(op), PortDirection::Input));
        let outputs = self.groups.insert(PortGroup::new(GroupOwner::Operator(op), PortDirection::Output));
        let node = OperatorNode::new(name, behavior.type_key(), inputs, outputs, parent);
        let inserted = self.operators.insert(node);
        debug_assert_eq!(op, inserted);

        let declared = {
            let mut builder = OperatorBuilder::new(self, op);
            behavior.declare(&mut builder)
        };
        if let Err(e) = declared {
            self.discard_operator(op);
            return Err(e);
        }
        for group in self.groups_of(op) {
            self.settle_group(group);
        }
        self.operator_mut(op)?.behavior = Some(behavior);
        Ok(op)
    }

    /// Grupos propios de `op`: entradas, salidas y bordes de sus unidades.
    fn groups_of(&self, op: OperatorId) -> Vec<GroupId> {
        let Some(node) = self.operators.get(op) else { return Vec::new() };
        let mut groups = vec![node.inputs, node.outputs];
        for unit in &node.units {
            if let Some(u) = self.units.get(*unit) {
                groups.push(u.inner_sources);
                groups.push(u.inner_sinks);
            }
        }
        groups
    }

    pub(crate) fn create_unit(&mut self, owner: OperatorId, name: &str) -> Result<UnitId, GraphError> {
        if self.unit_by_name(owner, name).is_some() {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        let unit = self.units.next_id();
        let inner_sources = self.groups.insert(PortGroup::new(GroupOwner::Unit(unit), PortDirection::Output));
        let inner_sinks = self.groups.insert(PortGroup::new(GroupOwner::Unit(unit), PortDirection::Input));
        self.units.insert(ExecutionUnit { name: name.to_string(),
                                          owner,
                                          operators: Vec::new(),
                                          inner_sources,
                                          inner_sinks });
        self.operator_mut(owner)?.units.push(unit);
        Ok(unit)
    }

    pub(crate) fn create_port(&mut self, group: GroupId, name: &str, optional: bool) -> Result<PortId, GraphError> {
        if self.port_in_group(group, name).is_some() {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        let direction = self.group(group)?.direction;
        let mut port = Port::new(name, direction, group);
        port.optional = optional;
        let id = self.ports.insert(port);
        if let Some(g) = self.groups.get_mut(group) {
            g.ports.push(id);
        }
        Ok(id)
    }

    /// Elimina el operador, sus unidades anidadas (recursivamente) y todas
    /// las conexiones que tocaban sus puertos.
    pub fn remove_operator(&mut self, op: OperatorId) -> Result<(), GraphError> {
        if self.operator(op)?.parent.is_none() {
            return Err(GraphError::RootOperator(self.name_of(op).to_string()));
        }
        self.discard_operator(op);
        Ok(())
    }

    pub(crate) fn discard_operator(&mut self, op: OperatorId) {
        let Some(node) = self.operators.get(op) else { return };
        let (inputs, outputs, units, parent) = (node.inputs, node.outputs, node.units.clone(), node.parent);
        for unit in units {
            let members = self.operators_in(unit).to_vec();
            for member in members {
                self.discard_operator(member);
            }
            if let Some(u) = self.units.remove(unit) {
                self.discard_group(u.inner_sources);
                self.discard_group(u.inner_sinks);
            }
        }
        self.discard_group(inputs);
        self.discard_group(outputs);
        let dead_pairs: Vec<_> = self.pairs
                                     .iter()
                                     .filter(|(_, p)| !self.groups.contains(p.left) || !self.groups.contains(p.right))
                                     .map(|(id, _)| id)
                                     .collect();
        for pair in dead_pairs {
            self.pairs.remove(pair);
        }
        if let Some(unit) = parent.and_then(|u| self.units.get_mut(u)) {
            unit.operators.retain(|id| *id != op);
        }
        self.operators.remove(op);
    }

    fn discard_group(&mut self, group: GroupId) {
        // Quitar la extensión primero: desconectar no debe crear puertos nuevos aquí.
        if let Some(g) = self.groups.get_mut(group) {
            g.extension = None;
        }
        for port in self.ports_of(group).to_vec() {
            self.sever(port);
        }
        for port in self.ports_of(group).to_vec() {
            self.ports.remove(port);
        }
        self.groups.remove(group);
    }

    /// Mueve `op` a `unit` en `position`. Si cambia de unidad, todas las
    /// conexiones de sus propios puertos quedan fuera de contexto y se cortan
    /// (las conexiones dentro de sus unidades anidadas se conservan).
    pub fn move_operator(&mut self, op: OperatorId, unit: UnitId, position: usize) -> Result<(), GraphError> {
        let old = self.operator(op)?
                      .parent
                      .ok_or_else(|| GraphError::RootOperator(self.name_of(op).to_string()))?;
        let owner = self.unit(unit)?.owner;
        if owner == op || self.is_ancestor_of(op, owner) {
            return Err(GraphError::IllegalMove(self.name_of(op).to_string()));
        }
        let name = self.name_of(op).to_string();
        if self.operator_by_name(unit, &name).is_some_and(|other| other != op) {
            return Err(GraphError::DuplicateName(name));
        }
        if old != unit {
            let node = self.operator(op)?;
            let own: Vec<PortId> = self.ports_of(node.inputs)
                                       .iter()
                                       .chain(self.ports_of(node.outputs))
                                       .copied()
                                       .collect();
            for port in own {
                if self.is_connected(port) {
                    self.disconnect(port)?;
                }
            }
        }
        self.unit_mut(old)?.operators.retain(|id| *id != op);
        let list = &mut self.unit_mut(unit)?.operators;
        list.insert(position.min(list.len()), op);
        self.operator_mut(op)?.parent = Some(unit);
        Ok(())
    }

    pub fn rename_operator(&mut self, op: OperatorId, name: &str) -> Result<(), GraphError> {
        if let Some(unit) = self.operator(op)?.parent {
            if self.operator_by_name(unit, name).is_some_and(|other| other != op) {
                return Err(GraphError::DuplicateName(name.to_string()));
            }
        }
        self.operator_mut(op)?.name = name.to_string();
        Ok(())
    }

    // ----- atajos de cableado por nombre -----

    /// `from.output -> to.input` dentro de la misma unidad.
    pub fn wire(&mut self, from: OperatorId, output: &str, to: OperatorId, input: &str) -> Result<(), GraphError> {
        let (outputs, inputs) = (self.operator(from)?.outputs, self.operator(to)?.inputs);
        let out = self.port_for_wiring(outputs, output)?;
        let inp = self.port_for_wiring(inputs, input)?;
        self.connect(out, inp)
    }

    /// Fuente interior de `unit` -> entrada de un miembro.
    pub fn wire_source(&mut self, unit: UnitId, source: &str, to: OperatorId, input: &str) -> Result<(), GraphError> {
        let (sources, inputs) = (self.unit(unit)?.inner_sources, self.operator(to)?.inputs);
        let out = self.port_for_wiring(sources, source)?;
        let inp = self.port_for_wiring(inputs, input)?;
        self.connect(out, inp)
    }

    /// Salida de un miembro -> sumidero interior de `unit`.
    pub fn wire_sink(&mut self, from: OperatorId, output: &str, unit: UnitId, sink: &str) -> Result<(), GraphError> {
        let (outputs, sinks) = (self.operator(from)?.outputs, self.unit(unit)?.inner_sinks);
        let out = self.port_for_wiring(outputs, output)?;
        let inp = self.port_for_wiring(sinks, sink)?;
        self.connect(out, inp)
    }

    /// Fuente interior -> sumidero interior, sin operadores en medio.
    pub fn wire_through(&mut self, unit: UnitId, source: &str, sink: &str) -> Result<(), GraphError> {
        let u = self.unit(unit)?;
        let (sources, sinks) = (u.inner_sources, u.inner_sinks);
        let out = self.port_for_wiring(sources, source)?;
        let inp = self.port_for_wiring(sinks, sink)?;
        self.connect(out, inp)
    }
}
