//! Repositorio de procesos: interfaz y almacén en memoria.

use std::fmt;

use dashmap::DashMap;

use crate::errors::RepositoryError;

use super::{ProcessDefinition, RepositoryLocation};

/// Almacén de definiciones de proceso direccionado por ubicación.
pub trait ProcessRepository: Send + Sync {
    fn load(&self, location: &RepositoryLocation) -> Result<ProcessDefinition, RepositoryError>;
    fn store(&self, location: &RepositoryLocation, definition: &ProcessDefinition) -> Result<(), RepositoryError>;
}

/// Guarda cada definición serializada a JSON, como lo haría un almacén real.
#[derive(Default)]
pub struct InMemoryProcessRepository {
    entries: DashMap<RepositoryLocation, String>,
}

impl InMemoryProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ubicaciones guardadas, ordenadas.
    pub fn locations(&self) -> Vec<RepositoryLocation> {
        let mut all: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        all.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProcessRepository for InMemoryProcessRepository {
    fn load(&self, location: &RepositoryLocation) -> Result<ProcessDefinition, RepositoryError> {
        let text = self.entries
                       .get(location)
                       .map(|e| e.value().clone())
                       .ok_or_else(|| RepositoryError::NotFound(location.to_string()))?;
        ProcessDefinition::from_json(&text)
    }

    fn store(&self, location: &RepositoryLocation, definition: &ProcessDefinition) -> Result<(), RepositoryError> {
        let text = definition.to_json()?;
        self.entries.insert(location.clone(), text);
        Ok(())
    }
}

impl fmt::Debug for InMemoryProcessRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryProcessRepository")
         .field("locations", &self.locations())
         .finish()
    }
}
