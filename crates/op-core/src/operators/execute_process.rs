//! Embebe un proceso guardado en el repositorio y lo ejecuta como si fuera
//! un operador más.
//!
//! La propagación de metadatos es de mejor esfuerzo: sólo se intenta si el
//! proceso ya se cargó alguna vez (o si la configuración permite cargar
//! durante la validación) y un fallo de carga queda como problema ERROR.

use std::sync::Arc;

use log::Level;

use crate::engine::{ExecutionContext, TransformContext};
use crate::errors::{ExecutionError, GraphError, RepositoryError};
use crate::graph::GroupId;
use crate::metadata::MetaData;
use crate::model::IOContainer;
use crate::operator::{Operator, OperatorBuilder};
use crate::param::{ParameterType, ParameterValue};
use crate::process::{Process, ProcessServices};
use crate::repo::RepositoryLocation;
use crate::report::Severity;

pub const PROCESS_LOCATION: &str = "process_location";
pub const USE_INPUTS: &str = "use_inputs";
pub const CACHE_PROCESS: &str = "cache_process";
pub const MACROS: &str = "macros";

#[derive(Debug, Default)]
pub struct ExecuteProcess {
    groups: Option<(GroupId, GroupId)>,
    cached: Option<(RepositoryLocation, Process)>,
}

impl ExecuteProcess {
    pub const TYPE_KEY: &'static str = "execute_process";

    pub fn new() -> Self {
        Self::default()
    }

    /// ¿Hay un proceso cargado para `location`?
    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    fn location(services: &ProcessServices, reference: &str) -> Result<RepositoryLocation, RepositoryError> {
        RepositoryLocation::resolve(services.location(), reference)
    }

    fn is_cached(&self, location: &RepositoryLocation) -> bool {
        self.cached.as_ref().is_some_and(|(loc, _)| loc == location)
    }

    /// Proceso de `location`, desde la caché si coincide o cargándolo.
    fn process_for(&mut self, services: &ProcessServices, location: &RepositoryLocation, cache: bool)
                   -> Result<&mut Process, ExecutionError> {
        if services.is_embedding(location) {
            return Err(ExecutionError::user("recursive_process", [location.to_string()]));
        }
        if !self.is_cached(location) || !cache {
            let repository = services.repository().ok_or(RepositoryError::NoRepository)?;
            let definition = repository.load(location)?;
            let process = Process::embedded(&definition, services, location.clone())?;
            self.cached = Some((location.clone(), process));
        }
        match self.cached.as_mut() {
            Some((_, process)) => Ok(process),
            None => Err(ExecutionError::Internal("embedded process vanished from the cache".into())),
        }
    }
}

fn macro_overrides(list: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    list.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

impl Operator for ExecuteProcess {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let inputs = builder.extend_inputs("input")?;
        let outputs = builder.extend_outputs("result")?;
        builder.parameter(ParameterType::string(PROCESS_LOCATION,
                                                "location of the embedded process, absolute or relative to this one"))?;
        builder.parameter(ParameterType::bool(USE_INPUTS, true, "feed this operator's inputs to the embedded process"))?;
        builder.parameter(ParameterType::bool(CACHE_PROCESS, true, "keep the loaded process between executions"))?;
        builder.parameter(ParameterType::list(MACROS, "macros defined for the embedded process")
                          .with_default(ParameterValue::List(Vec::new())))?;
        self.groups = Some((inputs, outputs));
        Ok(())
    }

    fn transform(&mut self, ctx: &mut TransformContext<'_>) {
        let Some((inputs, outputs)) = self.groups else { return };
        // un parámetro sin definir ya lo informa el motor
        let Ok(reference) = ctx.get_string(PROCESS_LOCATION) else { return };
        let use_inputs = ctx.get_bool(USE_INPUTS).unwrap_or(true);
        let macros = ctx.get_list(MACROS).unwrap_or_default();
        let location = match Self::location(ctx.services(), &reference) {
            Ok(location) => location,
            Err(e) => {
                ctx.add_issue(None, Severity::Error, e.to_string());
                return;
            }
        };
        // Sin proceso cargado para esta ubicación, validar no debe cargarlo.
        if !self.is_cached(&location) && !ctx.services().config().load_during_validation {
            return;
        }
        let process = match self.process_for(ctx.services(), &location, true) {
            Ok(process) => process,
            Err(e @ ExecutionError::Operator(_)) => {
                ctx.add_issue(None, Severity::Error, e.to_string());
                return;
            }
            Err(e) => {
                ctx.add_issue(None, Severity::Error, format!("cannot load embedded process: {e}"));
                return;
            }
        };
        process.override_macros(macro_overrides(&macros));

        let input_md: Vec<MetaData> = if use_inputs { ctx.collect_meta_data(inputs) } else { Vec::new() };
        let report = process.validate_with(&input_md);
        let results = process.result_meta_data();
        if report.has_errors() {
            ctx.add_issue(None,
                          Severity::Warning,
                          format!("embedded process '{location}' has {} validation errors",
                                  report.errors().count()));
        }
        let ports = ctx.graph().ports_of(outputs).to_vec();
        for (port, md) in ports.into_iter().zip(results) {
            ctx.deliver_meta_data(port, md);
        }
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let (_, outputs) =
            self.groups
                .ok_or_else(|| ExecutionError::Internal("execute_process was never declared".into()))?;
        let reference = ctx.get_string(PROCESS_LOCATION)?;
        let use_inputs = ctx.get_bool(USE_INPUTS)?;
        let cache = ctx.get_bool(CACHE_PROCESS)?;
        let macros = ctx.get_list(MACROS)?;
        let location = Self::location(ctx.services(), &reference)?;

        let inputs = if use_inputs {
            IOContainer::new(ctx.collect_inputs()?.into_iter().map(Some).collect())
        } else {
            IOContainer::empty()
        };
        ctx.log(Level::Info, &format!("running embedded process '{location}'"));
        let process = self.process_for(ctx.services(), &location, cache)?;
        process.override_macros(macro_overrides(&macros));
        let results = process.run_with(inputs)?;
        if !cache {
            self.cached = None;
        }

        let ports = ctx.graph().ports_of(outputs).to_vec();
        for (index, port) in ports.into_iter().enumerate() {
            ctx.deliver_to(port, results.get(index).map(Arc::clone))?;
        }
        Ok(())
    }
}
