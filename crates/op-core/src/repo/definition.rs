//! Forma serializable de un proceso.
//!
//! Las conexiones se guardan por nombre: `None` como operador designa el
//! borde de la unidad (fuente interior en el origen, sumidero interior en
//! el destino).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::ENGINE_VERSION;
use crate::errors::RepositoryError;
use crate::hashing::hash_value;
use crate::param::ParameterValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub macros: IndexMap<String, String>,
    pub root: UnitDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub name: String,
    #[serde(default)]
    pub operators: Vec<OperatorDefinition>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_key: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_operator: Option<String>,
    pub from_port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_operator: Option<String>,
    pub to_port: String,
}

impl ProcessDefinition {
    pub fn new(name: &str, root: UnitDefinition) -> Self {
        Self { name: name.to_string(),
               macros: IndexMap::new(),
               root }
    }

    pub fn to_json(&self) -> Result<String, RepositoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, RepositoryError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Hash estable (JSON canónico + blake3) de la definición y la versión
    /// del motor.
    pub fn definition_hash(&self) -> String {
        let body = serde_json::to_value(self).unwrap_or_default();
        hash_value(&json!({ "engine_version": ENGINE_VERSION, "definition": body }))
    }

    /// Número total de operadores, anidados incluidos.
    pub fn operator_count(&self) -> usize {
        self.root.operator_count()
    }
}

impl UnitDefinition {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(),
               operators: Vec::new(),
               connections: Vec::new() }
    }

    pub fn operator_count(&self) -> usize {
        self.operators
            .iter()
            .map(|o| 1 + o.units.iter().map(UnitDefinition::operator_count).sum::<usize>())
            .sum()
    }
}

impl OperatorDefinition {
    pub fn new(name: &str, type_key: &str) -> Self {
        Self { name: name.to_string(),
               type_key: type_key.to_string(),
               parameters: IndexMap::new(),
               units: Vec::new() }
    }

    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: ParameterValue) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}

impl ConnectionDefinition {
    pub fn new(from_operator: Option<&str>, from_port: &str, to_operator: Option<&str>, to_port: &str) -> Self {
        Self { from_operator: from_operator.map(str::to_string),
               from_port: from_port.to_string(),
               to_operator: to_operator.map(str::to_string),
               to_port: to_port.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProcessDefinition {
        let mut root = UnitDefinition::new("main");
        root.operators.push(OperatorDefinition::new("Create", "create_table").with_parameter("rows",
                                                                                            ParameterValue::Int(3)));
        root.connections.push(ConnectionDefinition::new(Some("Create"), "output", None, "result 1"));
        ProcessDefinition::new("demo", root)
    }

    #[test]
    fn json_uses_type_key_and_skips_empty_fields() {
        let text = sample().to_json().unwrap();
        assert!(text.contains("\"type\": \"create_table\""));
        assert!(!text.contains("units"));
        assert!(!text.contains("to_operator"));
        assert_eq!(ProcessDefinition::from_json(&text).unwrap(), sample());
    }

    #[test]
    fn hash_changes_with_parameters() {
        let a = sample();
        let mut b = sample();
        b.root.operators[0].parameters.insert("rows".into(), ParameterValue::Int(4));
        assert_eq!(a.definition_hash(), sample().definition_hash());
        assert_ne!(a.definition_hash(), b.definition_hash());
    }

    #[test]
    fn invalid_json_is_a_serialization_error() {
        assert!(matches!(ProcessDefinition::from_json("{"), Err(RepositoryError::Serialization(_))));
    }
}
