//! Metadatos: descripción estática de lo que fluiría por un puerto.
//!
//! Sólo se usan en la pasada de validación. `MetaData` es una suma cerrada;
//! toda regla de transformación hace `match` exhaustivo sobre ella.

mod precondition;
mod relation;
mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use precondition::{AttributePrecondition, FnPrecondition, KindPrecondition, MinRowsPrecondition, Precondition,
                       PreconditionFailure};
pub use relation::{Cardinality, SetRelation};
pub use table::{AttributeMetaData, AttributeRole, TableMetaData, ValueDomain};

use crate::model::{COLLECTION_KIND, TABLE_KIND};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum MetaData {
    /// Nada se sabe (puerto desconectado o transformación opaca).
    #[default]
    Unknown,
    /// Objeto genérico identificado sólo por su tipo.
    Generic { kind: String },
    Table(TableMetaData),
    /// Colección homogénea (resultado de un bucle).
    Collection(Box<MetaData>),
}

impl MetaData {
    pub fn generic(kind: &str) -> Self {
        MetaData::Generic { kind: kind.to_string() }
    }

    pub fn collection_of(inner: MetaData) -> Self {
        MetaData::Collection(Box::new(inner))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MetaData::Unknown)
    }

    /// Tipo de objeto descrito, si se conoce.
    pub fn kind(&self) -> Option<&str> {
        match self {
            MetaData::Unknown => None,
            MetaData::Generic { kind } => Some(kind),
            MetaData::Table(_) => Some(TABLE_KIND),
            MetaData::Collection(_) => Some(COLLECTION_KIND),
        }
    }

    pub fn as_table(&self) -> Option<&TableMetaData> {
        match self {
            MetaData::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableMetaData> {
        match self {
            MetaData::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Versión aflojada para resultados de iteraciones de número variable.
    pub fn loosened(&self) -> MetaData {
        match self {
            MetaData::Unknown => MetaData::Unknown,
            MetaData::Generic { kind } => MetaData::Generic { kind: kind.clone() },
            MetaData::Table(t) => MetaData::Table(t.loosened()),
            MetaData::Collection(inner) => MetaData::Collection(Box::new(inner.loosened())),
        }
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaData::Unknown => f.write_str("unknown"),
            MetaData::Generic { kind } => f.write_str(kind),
            MetaData::Table(t) => write!(f, "table[{} attributes, rows {}]", t.attributes().len(), t.rows()),
            MetaData::Collection(inner) => write!(f, "collection of {inner}"),
        }
    }
}
