use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{GroupId, OperatorId, UnitId};
use crate::model::ObservedValue;
use crate::operator::{Operator, TransformationRule};
use crate::param::Parameters;
use crate::report::ValidationIssue;

/// Nodo de operador. El comportamiento concreto (`Operator`) se saca de su
/// ranura mientras se ejecuta `transform`/`execute` y se devuelve después,
/// así el comportamiento puede recibir `&mut Graph` a través del contexto.
pub struct OperatorNode {
    pub(crate) name: String,
    pub(crate) type_key: String,
    pub(crate) inputs: GroupId,
    pub(crate) outputs: GroupId,
    pub(crate) units: Vec<UnitId>,
    /// Unidad que lo contiene; `None` sólo para la raíz del proceso.
    pub(crate) parent: Option<UnitId>,
    pub(crate) parameters: Parameters,
    pub(crate) rules: Vec<Arc<dyn TransformationRule>>,
    pub(crate) issues: Vec<ValidationIssue>,
    pub(crate) values: IndexMap<String, ObservedValue>,
    pub(crate) behavior: Option<Box<dyn Operator>>,
    pub(crate) apply_count: usize,
}

impl OperatorNode {
    pub(crate) fn new(name: &str, type_key: &str, inputs: GroupId, outputs: GroupId, parent: Option<UnitId>) -> Self {
        Self { name: name.to_string(),
               type_key: type_key.to_string(),
               inputs,
               outputs,
               units: Vec::new(),
               parent,
               parameters: Parameters::new(),
               rules: Vec::new(),
               issues: Vec::new(),
               values: IndexMap::new(),
               behavior: None,
               apply_count: 0 }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn inputs(&self) -> GroupId {
        self.inputs
    }

    pub fn outputs(&self) -> GroupId {
        self.outputs
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Una cadena de operadores es simplemente un operador con unidades.
    pub fn is_chain(&self) -> bool {
        !self.units.is_empty()
    }

    pub fn parent(&self) -> Option<UnitId> {
        self.parent
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn value(&self, key: &str) -> Option<&ObservedValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &ObservedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn apply_count(&self) -> usize {
        self.apply_count
    }
}

impl fmt::Debug for OperatorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorNode")
         .field("name", &self.name)
         .field("type_key", &self.type_key)
         .field("units", &self.units)
         .field("parent", &self.parent)
         .field("rules", &self.rules.len())
         .finish()
    }
}

/// Un nivel de anidamiento: lista ordenada de operadores más sus bordes.
/// Las fuentes interiores son puertos de salida (alimentan a los miembros)
/// y los sumideros interiores son puertos de entrada (recogen sus resultados).
#[derive(Debug)]
pub struct ExecutionUnit {
    pub(crate) name: String,
    pub(crate) owner: OperatorId,
    pub(crate) operators: Vec<OperatorId>,
    pub(crate) inner_sources: GroupId,
    pub(crate) inner_sinks: GroupId,
}

impl ExecutionUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> OperatorId {
        self.owner
    }

    pub fn operators(&self) -> &[OperatorId] {
        &self.operators
    }

    pub fn inner_sources(&self) -> GroupId {
        self.inner_sources
    }

    pub fn inner_sinks(&self) -> GroupId {
        self.inner_sinks
    }
}
