use std::fmt;

use serde::{Deserialize, Serialize};

/// Valor observable publicado por un operador (contador de iteraciones,
/// bandera de éxito, ...). Sólo lectura para el resto del grafo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservedValue {
    Number(f64),
    Text(String),
}

impl ObservedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ObservedValue::Number(n) => Some(*n),
            ObservedValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ObservedValue::Text(t) => Some(t),
            ObservedValue::Number(_) => None,
        }
    }
}

impl From<f64> for ObservedValue {
    fn from(v: f64) -> Self {
        ObservedValue::Number(v)
    }
}

impl From<usize> for ObservedValue {
    fn from(v: usize) -> Self {
        ObservedValue::Number(v as f64)
    }
}

impl From<String> for ObservedValue {
    fn from(v: String) -> Self {
        ObservedValue::Text(v)
    }
}

impl From<&str> for ObservedValue {
    fn from(v: &str) -> Self {
        ObservedValue::Text(v.to_string())
    }
}

impl fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedValue::Number(n) => write!(f, "{n}"),
            ObservedValue::Text(t) => f.write_str(t),
        }
    }
}
