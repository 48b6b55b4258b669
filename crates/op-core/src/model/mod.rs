//! Modelos de datos de ejecución (payloads, contenedores, valores observables).

pub mod payload;
pub mod value;

pub use payload::{IOContainer, IOObject, ProvenanceEntry, COLLECTION_KIND, TABLE_KIND};
pub use value::ObservedValue;
