//! Contextos que reciben los operadores en cada pasada.
//!
//! Ambos envuelven `&mut Graph` y el id del operador en curso; así un
//! operador puede tocar sus puertos y recorrer sus unidades anidadas sin
//! poseer nada del grafo.

use std::sync::Arc;

use log::Level;

use crate::errors::{ExecutionError, GraphError, ParameterError};
use crate::graph::{Graph, GroupId, OperatorId, PairId, PortId, UnitId};
use crate::metadata::MetaData;
use crate::model::{IOObject, ObservedValue};
use crate::param::{ParameterValue, Parameters};
use crate::process::ProcessServices;
use crate::report::{Severity, ValidationIssue};

use super::{execute, transform};

// ---------------------------------------------------------------------------
// Pasada estática
// ---------------------------------------------------------------------------

pub struct TransformContext<'a> {
    graph: &'a mut Graph,
    services: &'a ProcessServices,
    operator: OperatorId,
}

impl<'a> TransformContext<'a> {
    pub(crate) fn new(graph: &'a mut Graph, services: &'a ProcessServices, operator: OperatorId) -> Self {
        Self { graph,
               services,
               operator }
    }

    pub fn operator(&self) -> OperatorId {
        self.operator
    }

    pub fn operator_name(&self) -> &str {
        self.graph.name_of(self.operator)
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn services(&self) -> &ProcessServices {
        self.services
    }

    pub fn parameters(&self) -> &Parameters {
        self.graph
            .operators
            .get(self.operator)
            .map(|o| &o.parameters)
            .unwrap_or_else(|| empty_parameters())
    }

    pub fn get_string(&self, key: &str) -> Result<String, ParameterError> {
        self.parameters().get_string(key, self.services.macros())
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ParameterError> {
        self.parameters().get_int(key, self.services.macros())
    }

    pub fn get_real(&self, key: &str) -> Result<f64, ParameterError> {
        self.parameters().get_real(key, self.services.macros())
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ParameterError> {
        self.parameters().get_bool(key)
    }

    pub fn get_category(&self, key: &str) -> Result<String, ParameterError> {
        self.parameters().get_category(key, self.services.macros())
    }

    pub fn get_list(&self, key: &str) -> Result<Vec<(String, String)>, ParameterError> {
        self.parameters().get_list(key, self.services.macros())
    }

    /// Metadatos recibidos por una entrada (o lo que haya en un puerto
    /// cualquiera); `Unknown` si no hay nada.
    pub fn input_meta_data(&self, port: PortId) -> MetaData {
        self.graph.receive_meta_data(port)
    }

    pub fn input_meta_data_named(&self, name: &str) -> MetaData {
        self.graph
            .input_port(self.operator, name)
            .map(|p| self.input_meta_data(p))
            .unwrap_or_default()
    }

    pub fn output_port(&self, name: &str) -> Result<PortId, GraphError> {
        self.graph.output_port(self.operator, name)
    }

    pub fn deliver_meta_data(&mut self, output: PortId, meta_data: MetaData) {
        if let Err(e) = self.graph.deliver_meta_data(output, Some(meta_data)) {
            self.add_issue(None, Severity::Error, e.to_string());
        }
    }

    /// Metadatos de los puertos conectados de un grupo, en orden.
    pub fn collect_meta_data(&self, group: GroupId) -> Vec<MetaData> {
        self.graph
            .ports_of(group)
            .iter()
            .filter(|p| self.graph.is_connected(**p))
            .map(|p| self.graph.receive_meta_data(*p))
            .collect()
    }

    pub fn pass_meta_data_through(&mut self, pair: PairId) {
        if let Err(e) = self.graph.pass_meta_data_through(pair) {
            self.add_issue(None, Severity::Error, e.to_string());
        }
    }

    /// Transforma recursivamente una unidad anidada.
    pub fn transform_unit(&mut self, unit: UnitId) {
        transform::transform_unit(self.graph, self.services, unit);
    }

    /// Aplica en orden las reglas declaradas por el operador.
    pub fn apply_rules(&mut self) {
        let rules = match self.graph.operators.get(self.operator) {
            Some(node) => node.rules.clone(),
            None => return,
        };
        for rule in rules {
            rule.apply(self);
        }
    }

    /// Adjunta un problema al puerto indicado o, sin puerto, al operador.
    pub fn add_issue(&mut self, port: Option<PortId>, severity: Severity, message: impl Into<String>) {
        let operator = self.operator_name().to_string();
        match port.and_then(|p| self.graph.ports.get_mut(p)) {
            Some(p) => {
                let issue = ValidationIssue::on_port(&operator, &p.name, severity, message);
                p.issues.push(issue);
            }
            None => {
                if let Some(node) = self.graph.operators.get_mut(self.operator) {
                    node.issues.push(ValidationIssue::on_operator(&operator, severity, message));
                }
            }
        }
    }
}

fn empty_parameters() -> &'static Parameters {
    static EMPTY: once_cell::sync::Lazy<Parameters> = once_cell::sync::Lazy::new(Parameters::new);
    &EMPTY
}

// ---------------------------------------------------------------------------
// Pasada dinámica
// ---------------------------------------------------------------------------

pub struct ExecutionContext<'a> {
    graph: &'a mut Graph,
    services: &'a mut ProcessServices,
    operator: OperatorId,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(graph: &'a mut Graph, services: &'a mut ProcessServices, operator: OperatorId) -> Self {
        Self { graph,
               services,
               operator }
    }

    pub fn operator(&self) -> OperatorId {
        self.operator
    }

    pub fn operator_name(&self) -> String {
        self.graph.name_of(self.operator).to_string()
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn services(&self) -> &ProcessServices {
        &*self.services
    }

    pub fn services_mut(&mut self) -> &mut ProcessServices {
        &mut *self.services
    }

    pub fn set_macro(&mut self, name: &str, value: impl Into<String>) {
        self.services.macros_mut().set(name, value);
    }

    pub fn check_for_stop(&self) -> Result<(), ExecutionError> {
        self.services.check_for_stop()
    }

    pub fn log(&self, level: Level, message: &str) {
        self.services.log(level, Some(self.graph.name_of(self.operator)), message);
    }

    // ----- parámetros -----

    fn param<T>(&self, read: impl FnOnce(&Parameters) -> Result<T, ParameterError>) -> Result<T, ExecutionError> {
        let node = self.graph.operator(self.operator)?;
        read(&node.parameters).map_err(|e| ExecutionError::from_parameter(&node.name, e))
    }

    pub fn get_string(&self, key: &str) -> Result<String, ExecutionError> {
        let macros = self.services.macros();
        self.param(|p| p.get_string(key, macros))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ExecutionError> {
        let macros = self.services.macros();
        self.param(|p| p.get_int(key, macros))
    }

    pub fn get_real(&self, key: &str) -> Result<f64, ExecutionError> {
        let macros = self.services.macros();
        self.param(|p| p.get_real(key, macros))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ExecutionError> {
        self.param(|p| p.get_bool(key))
    }

    pub fn get_category(&self, key: &str) -> Result<String, ExecutionError> {
        let macros = self.services.macros();
        self.param(|p| p.get_category(key, macros))
    }

    pub fn get_list(&self, key: &str) -> Result<Vec<(String, String)>, ExecutionError> {
        let macros = self.services.macros();
        self.param(|p| p.get_list(key, macros))
    }

    pub fn get_matrix(&self, key: &str) -> Result<Vec<Vec<f64>>, ExecutionError> {
        self.param(|p| p.get_matrix(key))
    }

    /// Valor crudo (sin sustitución) si está fijado o tiene default.
    pub fn raw_parameter(&self, key: &str) -> Option<ParameterValue> {
        self.graph
            .operator(self.operator)
            .ok()
            .and_then(|n| n.parameters.raw(key).ok().cloned())
    }

    // ----- entradas -----

    /// Objeto en la entrada `name`; `MissingInput` si no llegó nada.
    pub fn input(&self, name: &str) -> Result<Arc<IOObject>, ExecutionError> {
        self.input_opt(name)?
            .ok_or_else(|| ExecutionError::MissingInput { operator: self.operator_name(),
                                                          port: name.to_string() })
    }

    pub fn input_opt(&self, name: &str) -> Result<Option<Arc<IOObject>>, ExecutionError> {
        let port = self.graph.input_port(self.operator, name)?;
        Ok(self.graph.receive(port).cloned())
    }

    pub fn input_at(&self, port: PortId) -> Option<Arc<IOObject>> {
        self.graph.receive(port).cloned()
    }

    /// Objetos de todas las entradas conectadas, en orden.
    pub fn collect_inputs(&self) -> Result<Vec<Arc<IOObject>>, ExecutionError> {
        let group = self.graph.operator(self.operator)?.inputs;
        Ok(self.graph.collect(group))
    }

    pub fn collect(&self, group: GroupId) -> Vec<Arc<IOObject>> {
        self.graph.collect(group)
    }

    // ----- salidas -----

    pub fn output_ports(&self) -> Vec<PortId> {
        self.graph.output_ports(self.operator).to_vec()
    }

    pub fn deliver(&mut self, name: &str, object: IOObject) -> Result<(), ExecutionError> {
        let port = self.graph.output_port(self.operator, name)?;
        self.graph.deliver(port, Some(object))?;
        Ok(())
    }

    pub fn deliver_shared(&mut self, name: &str, object: Arc<IOObject>) -> Result<(), ExecutionError> {
        let port = self.graph.output_port(self.operator, name)?;
        self.graph.deliver_shared(port, Some(object))?;
        Ok(())
    }

    pub fn deliver_to(&mut self, port: PortId, object: Option<Arc<IOObject>>) -> Result<(), ExecutionError> {
        self.graph.deliver_shared(port, object)?;
        Ok(())
    }

    /// Entrega "sin valor" por todas las salidas.
    pub fn clear_outputs(&mut self) -> Result<(), ExecutionError> {
        for port in self.output_ports() {
            self.graph.deliver_shared(port, None)?;
        }
        Ok(())
    }

    // ----- unidades anidadas -----

    pub fn pass_data_through(&mut self, pair: PairId) -> Result<(), ExecutionError> {
        self.graph.pass_data_through(pair)?;
        Ok(())
    }

    /// Ejecuta una unidad anidada hasta el final, reentrando en el motor.
    pub fn execute_unit(&mut self, unit: UnitId) -> Result<(), ExecutionError> {
        execute::execute_unit(self.graph, self.services, unit)
    }

    // ----- valores observables -----

    pub fn set_value(&mut self, key: &str, value: impl Into<ObservedValue>) {
        self.graph.set_value(self.operator, key, value.into());
    }

    /// Valor de este operador o del ancestro más cercano que lo publique.
    pub fn ancestor_value(&self, key: &str) -> Option<ObservedValue> {
        self.graph.ancestor_value(self.operator, key).cloned()
    }
}
