//! Parámetros tipados de los operadores.
//!
//! Cada operador declara sus `ParameterType` en `declare`; los valores se
//! fijan al construir el grafo (o al cargar una definición) y se leen de
//! forma síncrona en ambas pasadas. Las cadenas, categorías y listas pasan
//! por la sustitución de macros al leerse.

mod macros;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use macros::{MacroTable, PROCESS_NAME_MACRO};

use crate::errors::ParameterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    String(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Category(String),
    List(Vec<(String, String)>),
    Matrix(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    String,
    Int { min: i64, max: i64 },
    Real,
    Bool,
    Category(Vec<String>),
    List,
    Matrix,
}

impl ParameterKind {
    fn label(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Int { .. } => "integer",
            ParameterKind::Real => "real",
            ParameterKind::Bool => "boolean",
            ParameterKind::Category(_) => "category",
            ParameterKind::List => "list",
            ParameterKind::Matrix => "matrix",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterType {
    pub key: String,
    pub kind: ParameterKind,
    pub default: Option<ParameterValue>,
    /// Sin valor ni default no es un error.
    pub optional: bool,
    pub description: String,
}

impl ParameterType {
    fn new(key: &str, kind: ParameterKind, description: &str) -> Self {
        Self { key: key.to_string(),
               kind,
               default: None,
               optional: false,
               description: description.to_string() }
    }

    pub fn string(key: &str, description: &str) -> Self {
        Self::new(key, ParameterKind::String, description)
    }

    pub fn int(key: &str, min: i64, max: i64, description: &str) -> Self {
        Self::new(key, ParameterKind::Int { min, max }, description)
    }

    pub fn real(key: &str, description: &str) -> Self {
        Self::new(key, ParameterKind::Real, description)
    }

    pub fn bool(key: &str, default: bool, description: &str) -> Self {
        Self::new(key, ParameterKind::Bool, description).with_default(ParameterValue::Bool(default))
    }

    pub fn category(key: &str, values: &[&str], description: &str) -> Self {
        Self::new(key,
                  ParameterKind::Category(values.iter().map(|v| v.to_string()).collect()),
                  description)
    }

    pub fn list(key: &str, description: &str) -> Self {
        Self::new(key, ParameterKind::List, description)
    }

    pub fn matrix(key: &str, description: &str) -> Self {
        Self::new(key, ParameterKind::Matrix, description)
    }

    #[must_use]
    pub fn with_default(mut self, value: ParameterValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Comprueba que `value` encaja con el tipo declarado.
    pub fn accepts(&self, value: &ParameterValue) -> Result<(), ParameterError> {
        let mismatch = || ParameterError::TypeMismatch { key: self.key.clone(),
                                                         expected: self.kind.label() };
        match (&self.kind, value) {
            (ParameterKind::String, ParameterValue::String(_))
            | (ParameterKind::Real, ParameterValue::Real(_))
            | (ParameterKind::Bool, ParameterValue::Bool(_))
            | (ParameterKind::List, ParameterValue::List(_))
            | (ParameterKind::Matrix, ParameterValue::Matrix(_)) => Ok(()),
            (ParameterKind::Real, ParameterValue::Int(_)) => Ok(()),
            // Números escritos como macro: se resuelven al leerlos.
            (ParameterKind::Real | ParameterKind::Int { .. }, ParameterValue::String(v)) if v.contains("%{") => Ok(()),
            (ParameterKind::Int { min, max }, ParameterValue::Int(v)) => {
                if v < min || v > max {
                    Err(ParameterError::OutOfRange { key: self.key.clone(),
                                                     value: v.to_string() })
                } else {
                    Ok(())
                }
            }
            // Las categorías pueden contener macros; sólo se validan las literales.
            (ParameterKind::Category(values), ParameterValue::Category(v) | ParameterValue::String(v)) => {
                if v.contains("%{") || values.iter().any(|c| c == v) {
                    Ok(())
                } else {
                    Err(ParameterError::InvalidCategory { key: self.key.clone(),
                                                          value: v.clone() })
                }
            }
            _ => Err(mismatch()),
        }
    }
}

/// Tabla clave -> valor de un operador.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    types: IndexMap<String, ParameterType>,
    values: IndexMap<String, ParameterValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn declare(&mut self, ty: ParameterType) {
        self.types.insert(ty.key.clone(), ty);
    }

    pub fn types(&self) -> impl Iterator<Item = &ParameterType> {
        self.types.values()
    }

    pub fn set(&mut self, key: &str, value: ParameterValue) -> Result<(), ParameterError> {
        let ty = self.types
                     .get(key)
                     .ok_or_else(|| ParameterError::UnknownKey { key: key.to_string() })?;
        ty.accepts(&value)?;
        let value = match (&ty.kind, value) {
            (ParameterKind::Category(_), ParameterValue::String(s)) => ParameterValue::Category(s),
            (ParameterKind::Real, ParameterValue::Int(i)) => ParameterValue::Real(i as f64),
            (_, v) => v,
        };
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Option<ParameterValue> {
        self.values.shift_remove(key)
    }

    /// Valores fijados explícitamente (lo que se persiste).
    pub fn explicit_values(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Parámetros obligatorios sin valor ni default.
    pub fn undefined(&self) -> Vec<&str> {
        self.types
            .values()
            .filter(|t| !t.optional && t.default.is_none() && !self.values.contains_key(&t.key))
            .map(|t| t.key.as_str())
            .collect()
    }

    /// Valor efectivo: explícito, si no el default, si no `Undefined`.
    pub fn raw(&self, key: &str) -> Result<&ParameterValue, ParameterError> {
        if let Some(v) = self.values.get(key) {
            return Ok(v);
        }
        let ty = self.types
                     .get(key)
                     .ok_or_else(|| ParameterError::UnknownKey { key: key.to_string() })?;
        ty.default
          .as_ref()
          .ok_or_else(|| ParameterError::Undefined { key: key.to_string() })
    }

    fn mismatch(key: &str, expected: &'static str) -> ParameterError {
        ParameterError::TypeMismatch { key: key.to_string(),
                                       expected }
    }

    pub fn get_string(&self, key: &str, macros: &MacroTable) -> Result<String, ParameterError> {
        match self.raw(key)? {
            ParameterValue::String(s) | ParameterValue::Category(s) => Ok(macros.substitute(s)),
            ParameterValue::Int(i) => Ok(i.to_string()),
            ParameterValue::Real(r) => Ok(r.to_string()),
            ParameterValue::Bool(b) => Ok(b.to_string()),
            _ => Err(Self::mismatch(key, "string")),
        }
    }

    /// Entero; admite cadenas numéricas (p. ej. tras sustituir una macro).
    pub fn get_int(&self, key: &str, macros: &MacroTable) -> Result<i64, ParameterError> {
        match self.raw(key)? {
            ParameterValue::Int(i) => Ok(*i),
            ParameterValue::String(s) => macros.substitute(s)
                                               .trim()
                                               .parse()
                                               .map_err(|_| Self::mismatch(key, "integer")),
            _ => Err(Self::mismatch(key, "integer")),
        }
    }

    pub fn get_real(&self, key: &str, macros: &MacroTable) -> Result<f64, ParameterError> {
        match self.raw(key)? {
            ParameterValue::Real(r) => Ok(*r),
            ParameterValue::Int(i) => Ok(*i as f64),
            ParameterValue::String(s) => macros.substitute(s)
                                               .trim()
                                               .parse()
                                               .map_err(|_| Self::mismatch(key, "real")),
            _ => Err(Self::mismatch(key, "real")),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ParameterError> {
        match self.raw(key)? {
            ParameterValue::Bool(b) => Ok(*b),
            _ => Err(Self::mismatch(key, "boolean")),
        }
    }

    pub fn get_category(&self, key: &str, macros: &MacroTable) -> Result<String, ParameterError> {
        let value = match self.raw(key)? {
            ParameterValue::Category(s) | ParameterValue::String(s) => macros.substitute(s),
            _ => return Err(Self::mismatch(key, "category")),
        };
        match self.types.get(key).map(|t| &t.kind) {
            Some(ParameterKind::Category(values)) if !values.contains(&value) => {
                Err(ParameterError::InvalidCategory { key: key.to_string(),
                                                      value })
            }
            _ => Ok(value),
        }
    }

    pub fn get_list(&self, key: &str, macros: &MacroTable) -> Result<Vec<(String, String)>, ParameterError> {
        match self.raw(key)? {
            ParameterValue::List(entries) => Ok(entries.iter()
                                                       .map(|(k, v)| (macros.substitute(k), macros.substitute(v)))
                                                       .collect()),
            _ => Err(Self::mismatch(key, "list")),
        }
    }

    pub fn get_matrix(&self, key: &str) -> Result<Vec<Vec<f64>>, ParameterError> {
        match self.raw(key)? {
            ParameterValue::Matrix(m) => Ok(m.clone()),
            _ => Err(Self::mismatch(key, "matrix")),
        }
    }
}
