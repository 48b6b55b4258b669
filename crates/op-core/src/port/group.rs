use crate::graph::{OperatorId, PairId, PortId, UnitId};

use super::{PortDirection, PortExtender};

/// Dueño de un grupo: el lado de entradas/salidas de un operador, o el
/// borde interior (fuentes/sumideros) de una unidad de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOwner {
    Operator(OperatorId),
    Unit(UnitId),
}

#[derive(Debug)]
pub enum Extension {
    Single(PortExtender),
    /// Grupo emparejado con otro a través del borde de una unidad.
    Pair(PairId),
}

/// Secuencia ordenada de puertos; el orden de inserción es la dirección
/// posicional que usan las reglas y `collect`.
#[derive(Debug)]
pub struct PortGroup {
    pub(crate) owner: GroupOwner,
    pub(crate) direction: PortDirection,
    pub(crate) ports: Vec<PortId>,
    pub(crate) extension: Option<Extension>,
}

impl PortGroup {
    pub(crate) fn new(owner: GroupOwner, direction: PortDirection) -> Self {
        Self { owner,
               direction,
               ports: Vec::new(),
               extension: None }
    }

    pub fn owner(&self) -> GroupOwner {
        self.owner
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn is_extended(&self) -> bool {
        self.extension.is_some()
    }

    pub(crate) fn base_name(&self) -> Option<&str> {
        match &self.extension {
            Some(Extension::Single(e)) => Some(e.base_name()),
            _ => None,
        }
    }
}
