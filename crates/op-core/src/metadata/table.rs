//! Descriptor estático de tablas: esquema de atributos y número de filas.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Cardinality, SetRelation};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeRole {
    Regular,
    /// Rol especial (`label`, `id`, `weight`, ...).
    Special(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueDomain {
    Nominal(BTreeSet<String>),
    Numeric { min: f64, max: f64 },
    Unknown,
}

impl ValueDomain {
    pub fn nominal<I, S>(values: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        ValueDomain::Nominal(values.into_iter().map(Into::into).collect())
    }

    fn union(&self, other: &ValueDomain) -> ValueDomain {
        match (self, other) {
            (ValueDomain::Nominal(a), ValueDomain::Nominal(b)) => ValueDomain::Nominal(a.union(b).cloned().collect()),
            (ValueDomain::Numeric { min: a0, max: a1 }, ValueDomain::Numeric { min: b0, max: b1 }) => {
                ValueDomain::Numeric { min: a0.min(*b0),
                                       max: a1.max(*b1) }
            }
            _ => ValueDomain::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetaData {
    pub name: String,
    pub role: AttributeRole,
    pub domain: ValueDomain,
    /// Exactitud de `domain`.
    pub relation: SetRelation,
}

impl AttributeMetaData {
    pub fn nominal<I, S>(name: &str, values: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { name: name.to_string(),
               role: AttributeRole::Regular,
               domain: ValueDomain::nominal(values),
               relation: SetRelation::Equal }
    }

    pub fn numeric(name: &str, min: f64, max: f64) -> Self {
        Self { name: name.to_string(),
               role: AttributeRole::Regular,
               domain: ValueDomain::Numeric { min, max },
               relation: SetRelation::Equal }
    }

    pub fn unknown(name: &str) -> Self {
        Self { name: name.to_string(),
               role: AttributeRole::Regular,
               domain: ValueDomain::Unknown,
               relation: SetRelation::Unknown }
    }

    #[must_use]
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = AttributeRole::Special(role.to_string());
        self
    }

    pub fn is_special(&self) -> bool {
        matches!(self.role, AttributeRole::Special(_))
    }

    fn loosened(&self) -> Self {
        let mut a = self.clone();
        a.relation = a.relation.loosen();
        a
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetaData {
    attributes: Vec<AttributeMetaData>,
    /// `Equal` si la lista de atributos es completa; `Superset` si puede haber más.
    attributes_relation: SetRelation,
    rows: Cardinality,
}

impl TableMetaData {
    pub fn new() -> Self {
        Self { attributes: Vec::new(),
               attributes_relation: SetRelation::Equal,
               rows: Cardinality::unknown() }
    }

    /// Tabla de la que no se conoce el esquema.
    pub fn unknown_schema() -> Self {
        Self { attributes: Vec::new(),
               attributes_relation: SetRelation::Superset,
               rows: Cardinality::unknown() }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeMetaData) -> Self {
        self.put_attribute(attribute);
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: Cardinality) -> Self {
        self.rows = rows;
        self
    }

    pub fn put_attribute(&mut self, attribute: AttributeMetaData) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeMetaData> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }

    pub fn attributes(&self) -> &[AttributeMetaData] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeMetaData> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn special(&self, role: &str) -> Option<&AttributeMetaData> {
        self.attributes
            .iter()
            .find(|a| matches!(&a.role, AttributeRole::Special(r) if r == role))
    }

    pub fn attributes_relation(&self) -> SetRelation {
        self.attributes_relation
    }

    pub fn rows(&self) -> Cardinality {
        self.rows
    }

    pub fn set_rows(&mut self, rows: Cardinality) {
        self.rows = rows;
    }

    /// ¿Contiene el atributo? `Some(false)` sólo si la lista es completa.
    pub fn contains_attribute(&self, name: &str) -> Option<bool> {
        if self.attribute(name).is_some() {
            Some(true)
        } else if self.attributes_relation.is_exact() {
            Some(false)
        } else {
            None
        }
    }

    /// Concatenación por filas: se conservan los atributos de `self`, los
    /// dominios se unen y las filas se suman.
    pub fn append(&self, other: &TableMetaData) -> TableMetaData {
        let mut out = self.clone();
        for attr in out.attributes.iter_mut() {
            match other.attribute(&attr.name) {
                Some(o) => {
                    attr.domain = attr.domain.union(&o.domain);
                    attr.relation = attr.relation.merge(o.relation);
                }
                None => attr.relation = attr.relation.merge(SetRelation::Superset),
            }
        }
        out.attributes_relation = self.attributes_relation.merge(other.attributes_relation);
        out.rows = self.rows.add(&other.rows);
        out
    }

    /// Aproximación para transformaciones repetidas un número desconocido de veces.
    pub fn loosened(&self) -> TableMetaData {
        TableMetaData { attributes: self.attributes.iter().map(AttributeMetaData::loosened).collect(),
                        attributes_relation: self.attributes_relation,
                        rows: self.rows.loosen() }
    }
}

impl Default for TableMetaData {
    fn default() -> Self {
        Self::new()
    }
}
