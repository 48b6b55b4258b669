//! Definiciones persistibles, registro de tipos de operador y acceso al
//! repositorio de procesos.

mod definition;
mod location;
mod memory;
mod registry;

pub use definition::{ConnectionDefinition, OperatorDefinition, ProcessDefinition, UnitDefinition};
pub use location::RepositoryLocation;
pub use memory::{InMemoryProcessRepository, ProcessRepository};
pub use registry::{OperatorFactory, OperatorRegistry};
