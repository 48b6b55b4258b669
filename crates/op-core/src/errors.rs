//! Errores del motor.
//!
//! Tres familias con política de propagación distinta:
//! - `GraphError`: ediciones del grafo rechazadas (conexiones, nombres,
//!   movimientos). Siempre recuperables por quien edita.
//! - `ExecutionError`: fallos fatales durante `execute()`. Suben por la pila
//!   de unidades/cadenas salvo que un operador de contención los capture.
//! - Los problemas de validación no son errores de Rust: se adjuntan a los
//!   puertos como `ValidationIssue` (ver `report`).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
    #[error("cannot connect: port '{0}' is already connected")]
    AlreadyConnected(String),
    #[error("cannot connect: '{output}' and '{input}' belong to different execution units")]
    CrossUnitConnection { output: String, input: String },
    #[error("cannot connect: '{output}' -> '{input}' must run from an output port to an input port")]
    WrongDirection { output: String, input: String },
    #[error("port '{0}' is not connected")]
    NotConnected(String),
    #[error("port '{0}' is not an output port")]
    NotAnOutput(String),
    #[error("unknown port: {0}")]
    UnknownPort(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("unknown execution unit: {0}")]
    UnknownUnit(String),
    #[error("name '{0}' is already taken")]
    DuplicateName(String),
    #[error("operator '{0}' cannot be moved into one of its own execution units")]
    IllegalMove(String),
    #[error("the root operator '{0}' cannot be moved or removed")]
    RootOperator(String),
    #[error("no operator type registered under '{0}'")]
    UnknownOperatorType(String),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl GraphError {
    /// Rechazos de `connect` (lo que la interfaz de usuario muestra como
    /// "cannot connect").
    pub fn is_cannot_connect(&self) -> bool {
        matches!(self,
                 GraphError::AlreadyConnected(_)
                 | GraphError::CrossUnitConnection { .. }
                 | GraphError::WrongDirection { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParameterError {
    #[error("parameter '{key}' is undefined and has no default")]
    Undefined { key: String },
    #[error("operator does not declare a parameter '{key}'")]
    UnknownKey { key: String },
    #[error("parameter '{key}' expects a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("'{value}' is not a valid category for parameter '{key}'")]
    InvalidCategory { key: String, value: String },
    #[error("value {value} is out of range for parameter '{key}'")]
    OutOfRange { key: String, value: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RepositoryError {
    #[error("no process stored at '{0}'")]
    NotFound(String),
    #[error("invalid repository location '{0}'")]
    InvalidLocation(String),
    #[error("no repository is attached to this process")]
    NoRepository,
    #[error("serialization: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Serialization(e.to_string())
    }
}

/// Fallo de un operador hoja: código estable más argumentos formateables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorException {
    pub operator: Option<String>,
    pub code: String,
    pub args: Vec<String>,
}

impl OperatorException {
    pub fn new<I, S>(code: &str, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { operator: None,
               code: code.to_string(),
               args: args.into_iter().map(Into::into).collect() }
    }

    /// Mensaje para el usuario según el catálogo de códigos.
    pub fn message(&self) -> String {
        render_message(&self.code, &self.args)
    }
}

impl fmt::Display for OperatorException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operator {
            Some(op) => write!(f, "operator '{}': {}", op, self.message()),
            None => f.write_str(&self.message()),
        }
    }
}

impl std::error::Error for OperatorException {}

fn template(code: &str) -> Option<&'static str> {
    Some(match code {
        "operator_failed" => "{0}",
        "missing_attribute" => "attribute '{0}' is missing",
        "wrong_input_kind" => "expected an object of kind '{0}' but received '{1}'",
        "cyclic_unit" => "execution unit '{0}' contains a dependency cycle",
        "loop_value_missing" => "the latest loop results hold no numeric value at '{0}'",
        "invalid_data" => "invalid data: {0}",
        "recursive_process" => "process '{0}' embeds itself",
        _ => return None,
    })
}

fn render_message(code: &str, args: &[String]) -> String {
    match template(code) {
        Some(t) => args.iter()
                       .enumerate()
                       .fold(t.to_string(), |msg, (i, a)| msg.replace(&format!("{{{i}}}"), a)),
        None if args.is_empty() => code.to_string(),
        None => format!("{}: {}", code, args.join(", ")),
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExecutionError {
    #[error("{0}")]
    Operator(OperatorException),
    #[error("operator '{operator}': parameter '{key}' is undefined and has no default")]
    UndefinedParameter { operator: String, key: String },
    #[error("operator '{operator}': {reason}")]
    InvalidParameter { operator: String, reason: String },
    #[error("operator '{operator}': no data delivered to input port '{port}'")]
    MissingInput { operator: String, port: String },
    #[error("process stopped by user")]
    Stopped,
    #[error("operator '{operator}' exceeded the iteration limit of {limit}")]
    IterationLimit { operator: String, limit: usize },
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("graph: {0}")]
    Graph(#[from] GraphError),
    #[error("internal: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// Atajo para `ExecutionError::Operator(OperatorException::new(..))`.
    pub fn user<I, S>(code: &str, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        ExecutionError::Operator(OperatorException::new(code, args))
    }

    /// Cancelación cooperativa, distinta de un fallo.
    pub fn is_stop(&self) -> bool {
        matches!(self, ExecutionError::Stopped)
    }

    /// Completa el nombre del operador si la excepción aún no lo lleva.
    pub(crate) fn in_operator(self, name: &str) -> Self {
        match self {
            ExecutionError::Operator(mut e) if e.operator.is_none() => {
                e.operator = Some(name.to_string());
                ExecutionError::Operator(e)
            }
            other => other,
        }
    }

    pub(crate) fn from_parameter(operator: &str, e: ParameterError) -> Self {
        match e {
            ParameterError::Undefined { key } => ExecutionError::UndefinedParameter { operator: operator.to_string(),
                                                                                      key },
            other => ExecutionError::InvalidParameter { operator: operator.to_string(),
                                                        reason: other.to_string() },
        }
    }
}
