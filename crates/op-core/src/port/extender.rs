//! Extensores de puertos (aridad variable).
//!
//! El estado vive aquí; la política (añadir/retirar puertos al conectar o
//! desconectar) la aplica `Graph::settle_group`, que es quien tiene acceso a
//! las arenas. Invariante tras cada edición: exactamente un puerto (o par)
//! final sin conectar.

use std::fmt;
use std::sync::Arc;

use crate::graph::{GroupId, PortId};
use crate::metadata::Precondition;

/// Mantiene `"<base> 1"`, `"<base> 2"`, ... más un puerto libre al final.
pub struct PortExtender {
    base_name: String,
    next_index: usize,
    pub(crate) preconditions: Vec<Arc<dyn Precondition>>,
}

impl PortExtender {
    pub(crate) fn new(base_name: &str) -> Self {
        Self { base_name: base_name.to_string(),
               next_index: 1,
               preconditions: Vec::new() }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Nombre del próximo puerto. Los índices nunca se reutilizan, así que
    /// los nombres existentes son estables aunque se retiren puertos intermedios.
    pub(crate) fn next_name(&mut self) -> String {
        let name = format!("{} {}", self.base_name, self.next_index);
        self.next_index += 1;
        name
    }

    /// Índice de `name` si este extensor pudo haberlo generado.
    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        parse_index(&self.base_name, name)
    }

    /// Reserva `index`: los nombres futuros empiezan después.
    pub(crate) fn reserve(&mut self, index: usize) -> String {
        self.next_index = self.next_index.max(index + 1);
        format!("{} {}", self.base_name, index)
    }
}

fn parse_index(base: &str, name: &str) -> Option<usize> {
    name.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix(' '))
        .and_then(|n| n.parse::<usize>().ok())
}

impl fmt::Debug for PortExtender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortExtender")
         .field("base_name", &self.base_name)
         .field("next_index", &self.next_index)
         .field("preconditions", &self.preconditions.len())
         .finish()
    }
}

/// Pares de puertos a ambos lados del borde de una unidad: `left` son
/// entradas (del operador o sumideros de la unidad) y `right` las salidas
/// correspondientes. Un par está "en uso" si cualquiera de sus dos puertos
/// está conectado.
#[derive(Debug)]
pub struct PortPairExtender {
    pub(crate) left: GroupId,
    pub(crate) right: GroupId,
    left_base: String,
    right_base: String,
    next_index: usize,
    pub(crate) pairs: Vec<(PortId, PortId)>,
}

impl PortPairExtender {
    pub(crate) fn new(left: GroupId, right: GroupId, left_base: &str, right_base: &str) -> Self {
        Self { left,
               right,
               left_base: left_base.to_string(),
               right_base: right_base.to_string(),
               next_index: 1,
               pairs: Vec::new() }
    }

    pub fn left(&self) -> GroupId {
        self.left
    }

    pub fn right(&self) -> GroupId {
        self.right
    }

    pub fn pairs(&self) -> &[(PortId, PortId)] {
        &self.pairs
    }

    pub(crate) fn next_names(&mut self) -> (String, String) {
        let i = self.next_index;
        self.next_index += 1;
        (format!("{} {}", self.left_base, i), format!("{} {}", self.right_base, i))
    }

    /// Índice de `name` en el lado `left` o `right` del par.
    pub(crate) fn index_of(&self, left: bool, name: &str) -> Option<usize> {
        parse_index(if left { &self.left_base } else { &self.right_base }, name)
    }

    pub(crate) fn reserve(&mut self, index: usize) -> (String, String) {
        self.next_index = self.next_index.max(index + 1);
        (format!("{} {}", self.left_base, index), format!("{} {}", self.right_base, index))
    }
}
