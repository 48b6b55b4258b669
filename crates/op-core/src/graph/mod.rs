//! Grafo de operadores sobre arenas.
//!
//! `Graph` es el único dueño de puertos, grupos, operadores y unidades.
//! Las referencias hacia arriba (puerto -> grupo -> dueño, operador ->
//! unidad -> operador padre) son claves débiles: recorrerlas puede terminar
//! en `None` (la raíz) y eso es un caso normal.

mod arena;
mod connect;
mod edit;
mod node;
mod order;

pub use arena::{Arena, ArenaId, GroupId, OperatorId, PairId, PortId, UnitId};
pub use node::{ExecutionUnit, OperatorNode};
pub use order::{topological_order, Ordering};

use crate::errors::GraphError;
use crate::model::ObservedValue;
use crate::param::Parameters;
use crate::port::{GroupOwner, Port, PortGroup, PortPairExtender};

#[derive(Default)]
pub struct Graph {
    pub(crate) ports: Arena<PortId, Port>,
    pub(crate) groups: Arena<GroupId, PortGroup>,
    pub(crate) pairs: Arena<PairId, PortPairExtender>,
    pub(crate) operators: Arena<OperatorId, OperatorNode>,
    pub(crate) units: Arena<UnitId, ExecutionUnit>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- acceso por id -----

    pub fn port(&self, id: PortId) -> Result<&Port, GraphError> {
        self.ports.get(id).ok_or_else(|| GraphError::UnknownPort(id.to_string()))
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Result<&mut Port, GraphError> {
        self.ports.get_mut(id).ok_or_else(|| GraphError::UnknownPort(id.to_string()))
    }

    pub fn group(&self, id: GroupId) -> Result<&PortGroup, GraphError> {
        self.groups.get(id).ok_or_else(|| GraphError::UnknownPort(id.to_string()))
    }

    pub fn pair(&self, id: PairId) -> Result<&PortPairExtender, GraphError> {
        self.pairs.get(id).ok_or_else(|| GraphError::UnknownPort(id.to_string()))
    }

    pub fn operator(&self, id: OperatorId) -> Result<&OperatorNode, GraphError> {
        self.operators.get(id).ok_or_else(|| GraphError::UnknownOperator(id.to_string()))
    }

    pub(crate) fn operator_mut(&mut self, id: OperatorId) -> Result<&mut OperatorNode, GraphError> {
        self.operators.get_mut(id).ok_or_else(|| GraphError::UnknownOperator(id.to_string()))
    }

    pub fn unit(&self, id: UnitId) -> Result<&ExecutionUnit, GraphError> {
        self.units.get(id).ok_or_else(|| GraphError::UnknownUnit(id.to_string()))
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Result<&mut ExecutionUnit, GraphError> {
        self.units.get_mut(id).ok_or_else(|| GraphError::UnknownUnit(id.to_string()))
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    // ----- búsquedas -----

    pub fn operators_in(&self, unit: UnitId) -> &[OperatorId] {
        self.units.get(unit).map_or(&[], |u| u.operators.as_slice())
    }

    pub fn operator_by_name(&self, unit: UnitId, name: &str) -> Option<OperatorId> {
        self.operators_in(unit)
            .iter()
            .copied()
            .find(|id| self.operators.get(*id).is_some_and(|o| o.name == name))
    }

    /// Primer operador del grafo con ese nombre (en cualquier nivel).
    pub fn find_operator(&self, name: &str) -> Option<OperatorId> {
        self.operators.iter().find(|(_, o)| o.name == name).map(|(id, _)| id)
    }

    pub fn name_of(&self, op: OperatorId) -> &str {
        self.operators.get(op).map_or("?", |o| o.name.as_str())
    }

    pub fn units_of(&self, op: OperatorId) -> &[UnitId] {
        self.operators.get(op).map_or(&[], |o| o.units.as_slice())
    }

    pub fn unit_by_name(&self, op: OperatorId, name: &str) -> Option<UnitId> {
        self.units_of(op)
            .iter()
            .copied()
            .find(|u| self.units.get(*u).is_some_and(|u| u.name == name))
    }

    /// Operador que contiene la unidad en la que vive `op`.
    pub fn parent_operator(&self, op: OperatorId) -> Option<OperatorId> {
        let unit = self.operators.get(op)?.parent?;
        self.units.get(unit).map(|u| u.owner)
    }

    /// ¿Está `descendant` anidado (a cualquier profundidad) dentro de `ancestor`?
    pub fn is_ancestor_of(&self, ancestor: OperatorId, descendant: OperatorId) -> bool {
        let mut current = self.parent_operator(descendant);
        while let Some(op) = current {
            if op == ancestor {
                return true;
            }
            current = self.parent_operator(op);
        }
        false
    }

    pub fn ports_of(&self, group: GroupId) -> &[PortId] {
        self.groups.get(group).map_or(&[], |g| g.ports.as_slice())
    }

    pub fn input_ports(&self, op: OperatorId) -> &[PortId] {
        self.operators.get(op).map_or(&[], |o| self.ports_of(o.inputs))
    }

    pub fn output_ports(&self, op: OperatorId) -> &[PortId] {
        self.operators.get(op).map_or(&[], |o| self.ports_of(o.outputs))
    }

    pub fn port_in_group(&self, group: GroupId, name: &str) -> Option<PortId> {
        self.ports_of(group)
            .iter()
            .copied()
            .find(|p| self.ports.get(*p).is_some_and(|p| p.name == name))
    }

    pub fn input_port(&self, op: OperatorId, name: &str) -> Result<PortId, GraphError> {
        let group = self.operator(op)?.inputs;
        self.port_in_group(group, name)
            .ok_or_else(|| GraphError::UnknownPort(format!("{}.{}", self.name_of(op), name)))
    }

    pub fn output_port(&self, op: OperatorId, name: &str) -> Result<PortId, GraphError> {
        let group = self.operator(op)?.outputs;
        self.port_in_group(group, name)
            .ok_or_else(|| GraphError::UnknownPort(format!("{}.{}", self.name_of(op), name)))
    }

    pub fn inner_source(&self, unit: UnitId, name: &str) -> Result<PortId, GraphError> {
        let group = self.unit(unit)?.inner_sources;
        self.port_in_group(group, name)
            .ok_or_else(|| GraphError::UnknownPort(format!("{}.{}", self.unit_label(unit), name)))
    }

    pub fn inner_sink(&self, unit: UnitId, name: &str) -> Result<PortId, GraphError> {
        let group = self.unit(unit)?.inner_sinks;
        self.port_in_group(group, name)
            .ok_or_else(|| GraphError::UnknownPort(format!("{}.{}", self.unit_label(unit), name)))
    }

    /// Operador dueño del puerto (para puertos de unidad, el dueño de la unidad).
    pub fn port_operator(&self, port: PortId) -> Option<OperatorId> {
        let group = self.groups.get(self.ports.get(port)?.group)?;
        match group.owner {
            GroupOwner::Operator(op) => Some(op),
            GroupOwner::Unit(unit) => self.units.get(unit).map(|u| u.owner),
        }
    }

    /// ¿Pertenece el puerto al lado de entradas/salidas de un operador
    /// (y no al borde de una unidad)?
    pub fn is_operator_port(&self, port: PortId) -> bool {
        self.ports
            .get(port)
            .and_then(|p| self.groups.get(p.group))
            .is_some_and(|g| matches!(g.owner, GroupOwner::Operator(_)))
    }

    /// Unidad dentro de la cual el puerto puede conectarse: la unidad padre
    /// para puertos de operador, la propia unidad para sus bordes.
    pub fn connection_context(&self, port: PortId) -> Option<UnitId> {
        let group = self.groups.get(self.ports.get(port)?.group)?;
        match group.owner {
            GroupOwner::Operator(op) => self.operators.get(op)?.parent,
            GroupOwner::Unit(unit) => Some(unit),
        }
    }

    fn unit_label(&self, unit: UnitId) -> String {
        match self.units.get(unit) {
            Some(u) => format!("{}/{}", self.name_of(u.owner), u.name),
            None => unit.to_string(),
        }
    }

    /// Nombre legible: `Operador.puerto` o `Operador/unidad.puerto`.
    pub fn port_label(&self, port: PortId) -> String {
        let Some(p) = self.ports.get(port) else { return port.to_string() };
        match self.groups.get(p.group).map(|g| g.owner) {
            Some(GroupOwner::Operator(op)) => format!("{}.{}", self.name_of(op), p.name),
            Some(GroupOwner::Unit(unit)) => format!("{}.{}", self.unit_label(unit), p.name),
            None => p.name.clone(),
        }
    }

    // ----- parámetros y valores observables -----

    pub fn parameters(&self, op: OperatorId) -> Result<&Parameters, GraphError> {
        Ok(&self.operator(op)?.parameters)
    }

    pub fn set_parameter(&mut self, op: OperatorId, key: &str, value: crate::param::ParameterValue)
                         -> Result<(), GraphError> {
        self.operator_mut(op)?.parameters.set(key, value)?;
        Ok(())
    }

    pub fn value(&self, op: OperatorId, key: &str) -> Option<&ObservedValue> {
        self.operators.get(op)?.values.get(key)
    }

    pub(crate) fn set_value(&mut self, op: OperatorId, key: &str, value: ObservedValue) {
        if let Some(node) = self.operators.get_mut(op) {
            node.values.insert(key.to_string(), value);
        }
    }

    /// Olvida contadores y valores publicados de la ejecución anterior.
    pub(crate) fn reset_run_state(&mut self) {
        for id in self.operators.ids() {
            if let Some(node) = self.operators.get_mut(id) {
                node.apply_count = 0;
                node.values.clear();
            }
        }
    }

    /// Valor publicado por `op` o, si no, por el ancestro más cercano que lo tenga.
    pub fn ancestor_value(&self, op: OperatorId, key: &str) -> Option<&ObservedValue> {
        let mut current = Some(op);
        while let Some(id) = current {
            if let Some(v) = self.value(id, key) {
                return Some(v);
            }
            current = self.parent_operator(id);
        }
        None
    }
}

#[cfg(test)]
mod tests;
