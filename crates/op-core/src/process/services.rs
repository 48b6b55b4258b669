//! Servicios de proceso que consume cada operador: macros, señal de parada,
//! log, configuración y acceso al repositorio.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use log::Level;
use uuid::Uuid;

use crate::config::ProcessConfig;
use crate::errors::ExecutionError;
use crate::logging::{InMemoryLogSink, LogSink};
use crate::param::{MacroTable, PROCESS_NAME_MACRO};
use crate::repo::{OperatorRegistry, ProcessRepository, RepositoryLocation};

/// Bandera de parada compartida. Monótona: una vez pedida no se retira.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ProcessServices {
    name: String,
    macros: MacroTable,
    stop: StopHandle,
    log: Arc<dyn LogSink>,
    run_id: Uuid,
    config: ProcessConfig,
    repository: Option<Arc<dyn ProcessRepository>>,
    registry: Arc<OperatorRegistry>,
    location: Option<RepositoryLocation>,
    embedding: Vec<RepositoryLocation>,
}

impl ProcessServices {
    pub fn new(name: &str, registry: Arc<OperatorRegistry>) -> Self {
        let mut macros = MacroTable::new();
        macros.set(PROCESS_NAME_MACRO, name);
        Self { name: name.to_string(),
               macros,
               stop: StopHandle::new(),
               log: Arc::new(InMemoryLogSink::new()),
               run_id: Uuid::new_v4(),
               config: ProcessConfig::default(),
               repository: None,
               registry,
               location: None,
               embedding: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.macros.set(PROCESS_NAME_MACRO, name);
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroTable {
        &mut self.macros
    }

    /// Vuelve a las macros de la definición (más `process_name`).
    pub(crate) fn reset_macros(&mut self, defined: &IndexMap<String, String>) {
        let mut macros = MacroTable::new();
        macros.set(PROCESS_NAME_MACRO, self.name.as_str());
        for (k, v) in defined {
            macros.set(k, v.as_str());
        }
        self.macros = macros;
    }

    pub fn stop_handle(&self) -> &StopHandle {
        &self.stop
    }

    pub(crate) fn set_stop_handle(&mut self, stop: StopHandle) {
        self.stop = stop;
    }

    /// Punto de sondeo cooperativo.
    pub fn check_for_stop(&self) -> Result<(), ExecutionError> {
        if self.stop.is_stop_requested() {
            Err(ExecutionError::Stopped)
        } else {
            Ok(())
        }
    }

    pub fn log(&self, level: Level, operator: Option<&str>, message: &str) {
        if level <= self.config.log_level {
            self.log.append(self.run_id, level, operator, message);
        }
    }

    pub fn log_sink(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    pub(crate) fn set_log_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.log = sink;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub(crate) fn new_run(&mut self) -> Uuid {
        self.run_id = Uuid::new_v4();
        self.run_id
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: ProcessConfig) {
        self.config = config;
    }

    pub fn repository(&self) -> Option<&Arc<dyn ProcessRepository>> {
        self.repository.as_ref()
    }

    pub(crate) fn set_repository(&mut self, repository: Arc<dyn ProcessRepository>) {
        self.repository = Some(repository);
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    pub(crate) fn set_registry(&mut self, registry: Arc<OperatorRegistry>) {
        self.registry = registry;
    }

    pub fn location(&self) -> Option<&RepositoryLocation> {
        self.location.as_ref()
    }

    pub(crate) fn set_location(&mut self, location: RepositoryLocation) {
        self.location = Some(location);
    }

    /// ¿Está `location` abierta en la cadena de procesos que lleva hasta
    /// este (él incluido)?
    pub fn is_embedding(&self, location: &RepositoryLocation) -> bool {
        self.location.as_ref() == Some(location) || self.embedding.contains(location)
    }

    /// Cadena de anfitriones más la ubicación propia, para un proceso embebido.
    pub(crate) fn embedding_chain(&self) -> Vec<RepositoryLocation> {
        self.embedding.iter().chain(self.location.as_ref()).cloned().collect()
    }

    pub(crate) fn set_embedding(&mut self, chain: Vec<RepositoryLocation>) {
        self.embedding = chain;
    }
}

impl fmt::Debug for ProcessServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessServices")
         .field("name", &self.name)
         .field("macros", &self.macros)
         .field("stop_requested", &self.stop.is_stop_requested())
         .field("run_id", &self.run_id)
         .field("config", &self.config)
         .field("location", &self.location)
         .field("embedding", &self.embedding)
         .finish()
    }
}
