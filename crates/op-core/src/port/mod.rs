//! Puertos y grupos de puertos.
//!
//! Un `Port` es un extremo de conexión con dirección. Las salidas envían
//! datos y metadatos a lo sumo a una entrada; las entradas reciben de a lo
//! sumo una salida. Toda la mutación pasa por `Graph`, que mantiene la
//! simetría de las conexiones y los extensores.

mod extender;
mod group;

use std::fmt;
use std::sync::Arc;

pub use extender::{PortExtender, PortPairExtender};
pub use group::{Extension, GroupOwner, PortGroup};

use crate::graph::{GroupId, PortId};
use crate::metadata::{MetaData, Precondition};
use crate::model::IOObject;
use crate::report::ValidationIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        PortDirection::Input => "input",
                        PortDirection::Output => "output",
                    })
    }
}

/// Alcance de `clear`: datos, metadatos (con sus problemas) o ambos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Data,
    MetaData,
    All,
}

impl ClearScope {
    pub fn data(self) -> bool {
        matches!(self, ClearScope::Data | ClearScope::All)
    }

    pub fn meta_data(self) -> bool {
        matches!(self, ClearScope::MetaData | ClearScope::All)
    }
}

pub struct Port {
    pub(crate) name: String,
    pub(crate) direction: PortDirection,
    pub(crate) group: GroupId,
    pub(crate) connection: Option<PortId>,
    pub(crate) meta_data: Option<MetaData>,
    pub(crate) data: Option<Arc<IOObject>>,
    pub(crate) issues: Vec<ValidationIssue>,
    pub(crate) preconditions: Vec<Arc<dyn Precondition>>,
    pub(crate) optional: bool,
    /// Creado por un extensor (y por tanto eliminable por él).
    pub(crate) extended: bool,
}

impl Port {
    pub(crate) fn new(name: &str, direction: PortDirection, group: GroupId) -> Self {
        Self { name: name.to_string(),
               direction,
               group,
               connection: None,
               meta_data: None,
               data: None,
               issues: Vec::new(),
               preconditions: Vec::new(),
               optional: false,
               extended: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Puerto opuesto: destino para una salida, origen para una entrada.
    pub fn connection(&self) -> Option<PortId> {
        self.connection
    }

    pub fn source(&self) -> Option<PortId> {
        match self.direction {
            PortDirection::Input => self.connection,
            PortDirection::Output => None,
        }
    }

    pub fn destination(&self) -> Option<PortId> {
        match self.direction {
            PortDirection::Output => self.connection,
            PortDirection::Input => None,
        }
    }

    pub fn meta_data(&self) -> Option<&MetaData> {
        self.meta_data.as_ref()
    }

    /// Metadatos recibidos, o `Unknown` si no hay.
    pub fn meta_data_or_unknown(&self) -> MetaData {
        self.meta_data.clone().unwrap_or_default()
    }

    pub fn data(&self) -> Option<&Arc<IOObject>> {
        self.data.as_ref()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn preconditions(&self) -> impl Iterator<Item = &Arc<dyn Precondition>> {
        self.preconditions.iter()
    }

    pub(crate) fn clear(&mut self, scope: ClearScope) {
        if scope.data() {
            self.data = None;
        }
        if scope.meta_data() {
            self.meta_data = None;
            self.issues.clear();
        }
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
         .field("name", &self.name)
         .field("direction", &self.direction)
         .field("connection", &self.connection)
         .field("meta_data", &self.meta_data)
         .field("has_data", &self.data.is_some())
         .field("optional", &self.optional)
         .finish()
    }
}
