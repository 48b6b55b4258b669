//! Precondiciones de puertos de entrada.
//!
//! Una precondición se evalúa dos veces: antes de conectar (¿es compatible lo
//! que produce la salida?) y después de propagar metadatos, donde un fallo
//! se convierte en un `ValidationIssue` adjunto al puerto. `Unknown` nunca
//! falla: sin información no hay nada que reprochar.

use super::MetaData;
use crate::report::Severity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreconditionFailure {
    pub severity: Severity,
    pub message: String,
}

impl PreconditionFailure {
    pub fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error,
               message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning,
               message: message.into() }
    }
}

pub trait Precondition: Send + Sync {
    /// Descripción legible ("expects a table", ...).
    fn description(&self) -> String;

    fn check(&self, meta_data: &MetaData) -> Result<(), PreconditionFailure>;

    fn is_compatible(&self, meta_data: &MetaData) -> bool {
        match self.check(meta_data) {
            Ok(()) => true,
            Err(f) => f.severity != Severity::Error,
        }
    }
}

/// Exige un tipo de objeto concreto.
#[derive(Debug, Clone)]
pub struct KindPrecondition {
    kind: String,
}

impl KindPrecondition {
    pub fn new(kind: &str) -> Self {
        Self { kind: kind.to_string() }
    }
}

impl Precondition for KindPrecondition {
    fn description(&self) -> String {
        format!("expects an object of kind '{}'", self.kind)
    }

    fn check(&self, meta_data: &MetaData) -> Result<(), PreconditionFailure> {
        match meta_data.kind() {
            None => Ok(()),
            Some(k) if k == self.kind => Ok(()),
            Some(k) => Err(PreconditionFailure::error(format!("expected '{}' but received '{}'", self.kind, k))),
        }
    }
}

/// Exige que una tabla contenga un atributo (opcionalmente con un rol).
#[derive(Debug, Clone)]
pub struct AttributePrecondition {
    attribute: String,
    role: Option<String>,
}

impl AttributePrecondition {
    pub fn new(attribute: &str) -> Self {
        Self { attribute: attribute.to_string(),
               role: None }
    }

    pub fn special(role: &str) -> Self {
        Self { attribute: role.to_string(),
               role: Some(role.to_string()) }
    }
}

impl Precondition for AttributePrecondition {
    fn description(&self) -> String {
        match &self.role {
            Some(r) => format!("expects a table with a '{r}' attribute"),
            None => format!("expects a table with attribute '{}'", self.attribute),
        }
    }

    fn check(&self, meta_data: &MetaData) -> Result<(), PreconditionFailure> {
        let Some(table) = meta_data.as_table() else { return Ok(()) };
        let present = match &self.role {
            Some(role) => table.special(role).is_some(),
            None => table.attribute(&self.attribute).is_some(),
        };
        if present {
            return Ok(());
        }
        let what = self.role.as_deref().map_or_else(|| format!("attribute '{}'", self.attribute),
                                                    |r| format!("special attribute '{r}'"));
        if table.attributes_relation().is_exact() {
            Err(PreconditionFailure::error(format!("input table lacks {what}")))
        } else {
            Err(PreconditionFailure::warning(format!("input table may lack {what}")))
        }
    }
}

/// Exige un número mínimo de filas.
#[derive(Debug, Clone)]
pub struct MinRowsPrecondition {
    min: usize,
}

impl MinRowsPrecondition {
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Precondition for MinRowsPrecondition {
    fn description(&self) -> String {
        format!("expects at least {} rows", self.min)
    }

    fn check(&self, meta_data: &MetaData) -> Result<(), PreconditionFailure> {
        let Some(table) = meta_data.as_table() else { return Ok(()) };
        match table.rows().is_below(self.min) {
            Some(true) => Err(PreconditionFailure::error(format!("input table has {} rows, at least {} required",
                                                                 table.rows(),
                                                                 self.min))),
            _ => Ok(()),
        }
    }
}

/// Precondición ad hoc a partir de un closure.
pub struct FnPrecondition<F> {
    description: String,
    check: F,
}

impl<F> FnPrecondition<F> where F: Fn(&MetaData) -> Result<(), PreconditionFailure> + Send + Sync
{
    pub fn new(description: &str, check: F) -> Self {
        Self { description: description.to_string(),
               check }
    }
}

impl<F> Precondition for FnPrecondition<F> where F: Fn(&MetaData) -> Result<(), PreconditionFailure> + Send + Sync
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn check(&self, meta_data: &MetaData) -> Result<(), PreconditionFailure> {
        (self.check)(meta_data)
    }
}
