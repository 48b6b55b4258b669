use std::sync::Arc;

use crate::errors::GraphError;
use crate::graph::{Graph, GroupId, OperatorId, PairId, PortId, UnitId};
use crate::metadata::Precondition;
use crate::param::ParameterType;
use crate::port::{Extension, PortExtender, PortPairExtender};

use super::TransformationRule;

/// Vista de `Graph` restringida a un operador recién creado.
pub struct OperatorBuilder<'g> {
    graph: &'g mut Graph,
    operator: OperatorId,
}

impl<'g> OperatorBuilder<'g> {
    pub(crate) fn new(graph: &'g mut Graph, operator: OperatorId) -> Self {
        Self { graph, operator }
    }

    pub fn operator(&self) -> OperatorId {
        self.operator
    }

    pub fn inputs_group(&self) -> Result<GroupId, GraphError> {
        Ok(self.graph.operator(self.operator)?.inputs)
    }

    pub fn outputs_group(&self) -> Result<GroupId, GraphError> {
        Ok(self.graph.operator(self.operator)?.outputs)
    }

    /// Entrada obligatoria.
    pub fn input(&mut self, name: &str) -> Result<PortId, GraphError> {
        let group = self.inputs_group()?;
        self.graph.create_port(group, name, false)
    }

    pub fn optional_input(&mut self, name: &str) -> Result<PortId, GraphError> {
        let group = self.inputs_group()?;
        self.graph.create_port(group, name, true)
    }

    pub fn output(&mut self, name: &str) -> Result<PortId, GraphError> {
        let group = self.outputs_group()?;
        self.graph.create_port(group, name, true)
    }

    pub fn precondition<P>(&mut self, port: PortId, precondition: P) -> Result<(), GraphError>
        where P: Precondition + 'static
    {
        self.graph.port_mut(port)?.preconditions.push(Arc::new(precondition));
        Ok(())
    }

    /// Entradas de aridad variable: `"<base> 1"`, `"<base> 2"`, ...
    pub fn extend_inputs(&mut self, base: &str) -> Result<GroupId, GraphError> {
        let group = self.inputs_group()?;
        self.extend_group(group, base)?;
        Ok(group)
    }

    pub fn extend_outputs(&mut self, base: &str) -> Result<GroupId, GraphError> {
        let group = self.outputs_group()?;
        self.extend_group(group, base)?;
        Ok(group)
    }

    /// Precondición que recibirán todos los puertos que cree el extensor.
    pub fn extended_precondition<P>(&mut self, group: GroupId, precondition: P) -> Result<(), GraphError>
        where P: Precondition + 'static
    {
        match self.group_mut(group)?.extension.as_mut() {
            Some(Extension::Single(ext)) => {
                ext.preconditions.push(Arc::new(precondition));
                Ok(())
            }
            _ => Err(GraphError::UnknownPort(format!("{group} has no port extender"))),
        }
    }

    fn extend_group(&mut self, group: GroupId, base: &str) -> Result<(), GraphError> {
        self.group_mut(group)?.extension = Some(Extension::Single(PortExtender::new(base)));
        Ok(())
    }

    fn group_mut(&mut self, group: GroupId) -> Result<&mut crate::port::PortGroup, GraphError> {
        self.graph
            .groups
            .get_mut(group)
            .ok_or_else(|| GraphError::UnknownPort(group.to_string()))
    }

    pub fn unit(&mut self, name: &str) -> Result<UnitId, GraphError> {
        self.graph.create_unit(self.operator, name)
    }

    /// Fuentes interiores de aridad variable (sin par en el operador).
    pub fn extend_unit_sources(&mut self, unit: UnitId, base: &str) -> Result<GroupId, GraphError> {
        let group = self.graph.unit(unit)?.inner_sources;
        self.extend_group(group, base)?;
        Ok(group)
    }

    pub fn extend_unit_sinks(&mut self, unit: UnitId, base: &str) -> Result<GroupId, GraphError> {
        let group = self.graph.unit(unit)?.inner_sinks;
        self.extend_group(group, base)?;
        Ok(group)
    }

    /// Pares entradas del operador -> fuentes interiores de `unit`.
    pub fn pass_inputs_into(&mut self, unit: UnitId, input_base: &str, source_base: &str)
                            -> Result<PairId, GraphError> {
        let left = self.inputs_group()?;
        let right = self.graph.unit(unit)?.inner_sources;
        self.pair(left, right, input_base, source_base)
    }

    /// Pares sumideros interiores de `unit` -> salidas del operador.
    pub fn pass_results_out_of(&mut self, unit: UnitId, sink_base: &str, output_base: &str)
                               -> Result<PairId, GraphError> {
        let left = self.graph.unit(unit)?.inner_sinks;
        let right = self.outputs_group()?;
        self.pair(left, right, sink_base, output_base)
    }

    fn pair(&mut self, left: GroupId, right: GroupId, left_base: &str, right_base: &str)
            -> Result<PairId, GraphError> {
        let pair = self.graph
                       .pairs
                       .insert(PortPairExtender::new(left, right, left_base, right_base));
        self.group_mut(left)?.extension = Some(Extension::Pair(pair));
        self.group_mut(right)?.extension = Some(Extension::Pair(pair));
        Ok(pair)
    }

    pub fn parameter(&mut self, ty: ParameterType) -> Result<(), GraphError> {
        self.graph.operator_mut(self.operator)?.parameters.declare(ty);
        Ok(())
    }

    pub fn rule<R>(&mut self, rule: R) -> Result<(), GraphError>
        where R: TransformationRule + 'static
    {
        self.graph.operator_mut(self.operator)?.rules.push(Arc::new(rule));
        Ok(())
    }
}
