//! Ubicaciones de procesos en el repositorio: rutas absolutas con `/`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryLocation(String);

impl RepositoryLocation {
    /// Normaliza una ruta absoluta (`/carpeta/proceso`).
    pub fn new(path: &str) -> Result<Self, RepositoryError> {
        if !path.starts_with('/') {
            return Err(RepositoryError::InvalidLocation(path.to_string()));
        }
        Self::normalize(&[], path)
    }

    /// Resuelve `reference` contra la carpeta de `base`. Una referencia
    /// absoluta ignora la base; una relativa sin base no se puede resolver.
    pub fn resolve(base: Option<&RepositoryLocation>, reference: &str) -> Result<Self, RepositoryError> {
        if reference.starts_with('/') {
            return Self::new(reference);
        }
        let base = base.ok_or_else(|| RepositoryError::InvalidLocation(reference.to_string()))?;
        let folder = base.segments();
        let folder = &folder[..folder.len().saturating_sub(1)];
        Self::normalize(folder, reference)
    }

    fn normalize(prefix: &[&str], path: &str) -> Result<Self, RepositoryError> {
        let mut segments: Vec<&str> = prefix.to_vec();
        for part in path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(RepositoryError::InvalidLocation(path.to_string()));
                    }
                }
                name => segments.push(name),
            }
        }
        if segments.is_empty() {
            return Err(RepositoryError::InvalidLocation(path.to_string()));
        }
        Ok(Self(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Último segmento de la ruta.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
