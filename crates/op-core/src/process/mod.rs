//! Proceso: el operador raíz con su unidad `main` más los servicios
//! compartidos (macros, parada, log, configuración, repositorio).
//!
//! Es el punto de entrada de ambas pasadas:
//! - `validate`/`validate_with`: limpia metadatos, transforma desde la raíz
//!   y devuelve el informe completo de problemas.
//! - `run`/`run_with`: limpia datos, ejecuta desde la raíz y devuelve lo que
//!   llegó a los sumideros de `main`.

mod persist;
mod services;

pub use services::{ProcessServices, StopHandle};

use std::sync::Arc;

use indexmap::IndexMap;
use log::Level;

use crate::config::ProcessConfig;
use crate::engine::{execute, transform};
use crate::errors::{ExecutionError, GraphError, RepositoryError};
use crate::graph::{Graph, OperatorId, UnitId};
use crate::logging::{LogRecord, LogSink};
use crate::metadata::MetaData;
use crate::model::IOContainer;
use crate::operator::Operator;
use crate::operators::{ProcessRoot, MAIN_UNIT};
use crate::port::ClearScope;
use crate::repo::{OperatorRegistry, ProcessRepository, RepositoryLocation};
use crate::report::ValidationReport;

pub struct Process {
    graph: Graph,
    root: OperatorId,
    main: UnitId,
    macros: IndexMap<String, String>,
    overrides: IndexMap<String, String>,
    services: ProcessServices,
}

impl Process {
    /// Proceso vacío con el registro de operadores propios del motor.
    pub fn new(name: &str) -> Result<Self, GraphError> {
        Self::with_registry(name, Arc::new(OperatorRegistry::with_builtins()))
    }

    pub fn with_registry(name: &str, registry: Arc<OperatorRegistry>) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        let root = graph.create_operator(None, name, Box::new(ProcessRoot::new()))?;
        let main = graph.unit_by_name(root, MAIN_UNIT)
                        .ok_or_else(|| GraphError::UnknownUnit(MAIN_UNIT.to_string()))?;
        Ok(Self { graph,
                  root,
                  main,
                  macros: IndexMap::new(),
                  overrides: IndexMap::new(),
                  services: ProcessServices::new(name, registry) })
    }

    #[must_use]
    pub fn with_config(mut self, config: ProcessConfig) -> Self {
        self.services.set_config(config);
        self
    }

    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.services.set_log_sink(sink);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn ProcessRepository>) -> Self {
        self.services.set_repository(repository);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: RepositoryLocation) -> Self {
        self.services.set_location(location);
        self
    }

    /// Usa una señal de parada ajena (p. ej. la del proceso anfitrión).
    pub fn share_stop(&mut self, stop: StopHandle) {
        self.services.set_stop_handle(stop);
    }

    pub fn name(&self) -> &str {
        self.services.name()
    }

    pub fn rename(&mut self, name: &str) -> Result<(), GraphError> {
        self.graph.rename_operator(self.root, name)?;
        self.services.set_name(name);
        Ok(())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn root(&self) -> OperatorId {
        self.root
    }

    pub fn main_unit(&self) -> UnitId {
        self.main
    }

    /// Añade un operador al final de `main`.
    pub fn add_operator(&mut self, name: &str, behavior: Box<dyn Operator>) -> Result<OperatorId, GraphError> {
        self.graph.add_operator(self.main, name, behavior)
    }

    /// Macro de la definición: se restablece al inicio de cada pasada.
    pub fn define_macro(&mut self, name: &str, value: &str) {
        self.macros.insert(name.to_string(), value.to_string());
    }

    pub fn defined_macros(&self) -> &IndexMap<String, String> {
        &self.macros
    }

    pub fn services(&self) -> &ProcessServices {
        &self.services
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.services.stop_handle().clone()
    }

    pub fn log_records(&self) -> Vec<LogRecord> {
        self.services.log_sink().records()
    }

    /// Macros de la definición más las impuestas por el anfitrión.
    fn reset_macros(&mut self) {
        let mut macros = self.macros.clone();
        macros.extend(self.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.services.reset_macros(&macros);
    }

    // ----- pasada estática -----

    pub fn validate(&mut self) -> ValidationReport {
        self.validate_with(&[])
    }

    /// Valida con metadatos de entrada para las fuentes `input N` de `main`.
    pub fn validate_with(&mut self, inputs: &[MetaData]) -> ValidationReport {
        self.reset_macros();
        self.graph.clear_all(ClearScope::MetaData);
        for (i, md) in inputs.iter().enumerate() {
            let Ok(port) = self.graph.inner_source(self.main, &input_name(i)) else { continue };
            if let Err(e) = self.graph.deliver_meta_data(port, Some(md.clone())) {
                self.services.log(Level::Warn, None, &e.to_string());
            }
        }

        transform::transform_operator(&mut self.graph, &self.services, self.root);

        let mut issues = Vec::new();
        transform::collect_operator_issues(&self.graph, self.root, &mut issues);
        let report = ValidationReport::new(issues);
        self.services.log(Level::Info,
                          None,
                          &format!("validation finished: {} errors, {} warnings",
                                   report.errors().count(),
                                   report.warnings().count()));
        report
    }

    /// Metadatos que llegaron a los sumideros conectados de `main` en la
    /// última validación.
    pub fn result_meta_data(&self) -> Vec<MetaData> {
        let Ok(main) = self.graph.unit(self.main) else { return Vec::new() };
        self.graph
            .ports_of(main.inner_sinks)
            .iter()
            .filter(|p| self.graph.is_connected(**p))
            .map(|p| self.graph.receive_meta_data(*p))
            .collect()
    }

    // ----- pasada dinámica -----

    pub fn run(&mut self) -> Result<IOContainer, ExecutionError> {
        self.run_with(IOContainer::empty())
    }

    /// Ejecuta con `inputs` en las fuentes `input N` de `main` y devuelve un
    /// contenedor con lo recibido por cada sumidero conectado (en orden).
    pub fn run_with(&mut self, inputs: IOContainer) -> Result<IOContainer, ExecutionError> {
        let run_id = self.services.new_run();
        self.reset_macros();
        self.graph.clear_all(ClearScope::Data);
        self.graph.reset_run_state();
        self.services.log(Level::Info,
                          None,
                          &format!("process '{}' started (run {run_id})", self.services.name()));

        for (i, slot) in inputs.slots().iter().enumerate() {
            if let Ok(port) = self.graph.inner_source(self.main, &input_name(i)) {
                self.graph.deliver_shared(port, slot.clone())?;
            }
        }

        match execute::execute_operator(&mut self.graph, &mut self.services, self.root) {
            Ok(()) => {
                let results = self.collect_results()?;
                self.services.log(Level::Info,
                                  None,
                                  &format!("process '{}' finished with {} results",
                                           self.services.name(),
                                           results.len()));
                Ok(results)
            }
            Err(e) => {
                if e.is_stop() {
                    self.services.log(Level::Info, None, "process stopped by user");
                } else {
                    self.services.log(Level::Error, None, &format!("process failed: {e}"));
                }
                Err(e)
            }
        }
    }

    fn collect_results(&self) -> Result<IOContainer, GraphError> {
        let main = self.graph.unit(self.main)?;
        let slots = self.graph
                        .ports_of(main.inner_sinks)
                        .iter()
                        .filter(|p| self.graph.is_connected(**p))
                        .map(|p| self.graph.receive(*p).cloned())
                        .collect();
        Ok(IOContainer::new(slots))
    }

    // ----- repositorio -----

    /// Guarda la definición en el repositorio adjunto.
    pub fn save(&self, location: &RepositoryLocation) -> Result<(), RepositoryError> {
        let repository = self.services.repository().ok_or(RepositoryError::NoRepository)?;
        repository.store(location, &self.to_definition())
    }

    /// Carga y construye un proceso desde un repositorio.
    pub fn load(repository: Arc<dyn ProcessRepository>, location: &RepositoryLocation,
                registry: Arc<OperatorRegistry>)
                -> Result<Self, ExecutionError> {
        let definition = repository.load(location)?;
        let process = Self::from_definition(&definition, registry)?;
        Ok(process.with_repository(repository).with_location(location.clone()))
    }

    /// Proceso embebido: comparte registro, log, configuración, repositorio
    /// y señal de parada con el anfitrión.
    pub(crate) fn embedded(definition: &crate::repo::ProcessDefinition, host: &ProcessServices,
                           location: RepositoryLocation)
                           -> Result<Self, GraphError> {
        let mut process = Self::from_definition(definition, Arc::clone(host.registry()))?
                              .with_config(host.config().clone())
                              .with_log_sink(Arc::clone(host.log_sink()))
                              .with_location(location);
        if let Some(repository) = host.repository() {
            process = process.with_repository(Arc::clone(repository));
        }
        process.share_stop(host.stop_handle().clone());
        process.services.set_embedding(host.embedding_chain());
        Ok(process)
    }

    /// Macros que el anfitrión impone sobre las de la definición. Cada
    /// llamada reemplaza las anteriores; la definición no cambia.
    pub(crate) fn override_macros<'a, I>(&mut self, macros: I)
        where I: IntoIterator<Item = (&'a str, &'a str)>
    {
        self.overrides = macros.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    }
}

fn input_name(index: usize) -> String {
    format!("input {}", index + 1)
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
         .field("name", &self.services.name())
         .field("operators", &self.graph.operator_count())
         .field("macros", &self.macros)
         .finish()
    }
}
