//! Relaciones de conjunto y cardinalidades aproximadas.
//!
//! Muchas transformaciones sólo pueden acotar estáticamente un número de
//! filas o un dominio de valores. `SetRelation` marca si el valor calculado es
//! exacto (`Equal`), una cota superior (`Subset`: el real está contenido en
//! lo declarado / es como mucho), una cota inferior (`Superset`: el real lo
//! contiene / es al menos) o nada fiable (`Unknown`).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetRelation {
    Equal,
    Subset,
    Superset,
    Unknown,
}

impl SetRelation {
    /// Composición de dos aproximaciones sucesivas.
    pub fn merge(self, other: SetRelation) -> SetRelation {
        use SetRelation::*;
        match (self, other) {
            (Equal, r) | (r, Equal) => r,
            (a, b) if a == b => a,
            _ => Unknown,
        }
    }

    /// Aflojamiento usado cuando una transformación puede repetirse un número
    /// de veces desconocido: lo exacto pasa a cota inferior, una cota superior
    /// deja de significar algo.
    pub fn loosen(self) -> SetRelation {
        match self {
            SetRelation::Equal | SetRelation::Superset => SetRelation::Superset,
            SetRelation::Subset | SetRelation::Unknown => SetRelation::Unknown,
        }
    }

    pub fn is_exact(self) -> bool {
        self == SetRelation::Equal
    }
}

impl fmt::Display for SetRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        SetRelation::Equal => "=",
                        SetRelation::Subset => "<=",
                        SetRelation::Superset => ">=",
                        SetRelation::Unknown => "?",
                    })
    }
}

/// Número (de filas) posiblemente aproximado. Invariante: sin valor la
/// relación siempre es `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    value: Option<usize>,
    relation: SetRelation,
}

impl Cardinality {
    pub fn exact(n: usize) -> Self {
        Self { value: Some(n),
               relation: SetRelation::Equal }
    }

    pub fn at_least(n: usize) -> Self {
        Self { value: Some(n),
               relation: SetRelation::Superset }
    }

    pub fn at_most(n: usize) -> Self {
        Self { value: Some(n),
               relation: SetRelation::Subset }
    }

    pub fn unknown() -> Self {
        Self { value: None,
               relation: SetRelation::Unknown }
    }

    fn with_relation(value: Option<usize>, relation: SetRelation) -> Self {
        match (value, relation) {
            (Some(v), r) if r != SetRelation::Unknown => Self { value: Some(v),
                                                                relation: r },
            _ => Self::unknown(),
        }
    }

    pub fn value(&self) -> Option<usize> {
        self.value
    }

    pub fn relation(&self) -> SetRelation {
        self.relation
    }

    pub fn is_exact(&self) -> bool {
        self.relation.is_exact()
    }

    /// Efecto de un filtro: como mucho lo que había.
    pub fn reduce_by_unknown_amount(&self) -> Self {
        Self::with_relation(self.value, self.relation.merge(SetRelation::Subset))
    }

    /// Efecto de una operación que sólo puede añadir: al menos lo que había.
    pub fn increase_by_unknown_amount(&self) -> Self {
        Self::with_relation(self.value, self.relation.merge(SetRelation::Superset))
    }

    pub fn loosen(&self) -> Self {
        Self::with_relation(self.value, self.relation.loosen())
    }

    /// Suma (p. ej. al concatenar tablas).
    pub fn add(&self, other: &Cardinality) -> Self {
        match (self.value, other.value) {
            (Some(a), Some(b)) => Self::with_relation(Some(a + b), self.relation.merge(other.relation)),
            _ => Self::unknown(),
        }
    }

    /// ¿Puede el valor real ser menor que `n`? `Some(true)` si seguro que sí,
    /// `Some(false)` si seguro que no, `None` si no se sabe.
    pub fn is_below(&self, n: usize) -> Option<bool> {
        let v = self.value?;
        match self.relation {
            SetRelation::Equal => Some(v < n),
            SetRelation::Subset if v < n => Some(true),
            SetRelation::Superset if v >= n => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{}{}", self.relation, v),
            None => f.write_str("?"),
        }
    }
}
