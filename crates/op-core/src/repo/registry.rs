//! Registro de tipos de operador: clave de tipo -> fábrica.
//!
//! Es la única estructura compartida entre hilos del motor (un proceso
//! embebido se construye con el mismo registro que su anfitrión).

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::errors::GraphError;
use crate::operator::Operator;
use crate::operators::{ExecuteProcess, HandleException, Subprocess};

pub type OperatorFactory = Arc<dyn Fn() -> Box<dyn Operator> + Send + Sync>;

#[derive(Default)]
pub struct OperatorRegistry {
    factories: DashMap<String, OperatorFactory>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro con las cadenas propias del motor.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Subprocess::TYPE_KEY, || Box::new(Subprocess::new()));
        registry.register(HandleException::TYPE_KEY, || Box::new(HandleException::new()));
        registry.register(ExecuteProcess::TYPE_KEY, || Box::new(ExecuteProcess::new()));
        registry
    }

    /// Registra (o reemplaza) la fábrica de `key`.
    pub fn register<F>(&self, key: &str, factory: F)
        where F: Fn() -> Box<dyn Operator> + Send + Sync + 'static
    {
        self.factories.insert(key.to_string(), Arc::new(factory));
    }

    pub fn create(&self, key: &str) -> Result<Box<dyn Operator>, GraphError> {
        let factory = self.factories
                          .get(key)
                          .map(|f| Arc::clone(f.value()))
                          .ok_or_else(|| GraphError::UnknownOperatorType(key.to_string()))?;
        Ok(factory())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Claves registradas, ordenadas.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry").field("keys", &self.keys()).finish()
    }
}
