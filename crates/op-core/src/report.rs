//! Reporte de la pasada de validación.
//!
//! Los problemas encontrados al propagar metadatos nunca se lanzan: se
//! adjuntan al puerto u operador culpable y al final se recogen en un
//! `ValidationReport` plano, en orden de recorrido.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::hashing::hash_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Severity::Warning => "WARNING",
                        Severity::Error => "ERROR",
                    })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub operator: String,
    /// `None` para problemas del operador (parámetros, ciclos).
    pub port: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn on_operator(operator: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self { operator: operator.to_string(),
               port: None,
               severity,
               message: message.into() }
    }

    pub fn on_port(operator: &str, port: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self { operator: operator.to_string(),
               port: Some(port.to_string()),
               severity,
               message: message.into() }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => write!(f, "[{}] {}.{}: {}", self.severity, self.operator, port, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.operator, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Problemas de un operador concreto.
    pub fn for_operator<'a>(&'a self, operator: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues.iter().filter(move |i| i.operator == operator)
    }

    /// Hash estable del reporte (dos validaciones del mismo grafo deben coincidir).
    pub fn fingerprint(&self) -> String {
        hash_value(&json!(self.issues))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no problems found");
        }
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}
