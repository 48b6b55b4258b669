//! Reglas de transformación de metadatos.
//!
//! Cada operador guarda una lista ordenada de reglas que la implementación
//! por defecto de `Operator::transform` aplica en secuencia. Las reglas
//! sólo tocan metadatos; los problemas se adjuntan vía el contexto.

use std::fmt;

use crate::engine::TransformContext;
use crate::graph::{GroupId, PairId, PortId, UnitId};
use crate::metadata::{Cardinality, MetaData};
use crate::report::Severity;

pub trait TransformationRule: Send + Sync {
    fn apply(&self, ctx: &mut TransformContext<'_>);
}

type ComputeFn = dyn Fn(&TransformContext<'_>) -> MetaData + Send + Sync;

enum Generated {
    Fixed(MetaData),
    Computed(Box<ComputeFn>),
}

/// Ignora las entradas y declara lo que sale (operadores fuente).
pub struct GenerateRule {
    output: PortId,
    generated: Generated,
}

impl GenerateRule {
    pub fn fixed(output: PortId, meta_data: MetaData) -> Self {
        Self { output,
               generated: Generated::Fixed(meta_data) }
    }

    /// Metadatos calculados a partir de los parámetros del operador.
    pub fn computed<F>(output: PortId, compute: F) -> Self
        where F: Fn(&TransformContext<'_>) -> MetaData + Send + Sync + 'static
    {
        Self { output,
               generated: Generated::Computed(Box::new(compute)) }
    }
}

impl TransformationRule for GenerateRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let md = match &self.generated {
            Generated::Fixed(md) => md.clone(),
            Generated::Computed(f) => f(ctx),
        };
        ctx.deliver_meta_data(self.output, md);
    }
}

impl fmt::Debug for GenerateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateRule").field("output", &self.output).finish()
    }
}

/// Efecto conocido de un operador sobre el número de filas de una tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowsEffect {
    #[default]
    Keep,
    /// Sólo puede quitar filas (filtros).
    Reduce,
    /// Sólo puede añadir filas.
    Increase,
    /// Puede hacer cualquier cosa.
    Unknown,
}

impl RowsEffect {
    fn apply(self, rows: Cardinality) -> Cardinality {
        match self {
            RowsEffect::Keep => rows,
            RowsEffect::Reduce => rows.reduce_by_unknown_amount(),
            RowsEffect::Increase => rows.increase_by_unknown_amount(),
            RowsEffect::Unknown => Cardinality::unknown(),
        }
    }
}

/// Copia el descriptor de una entrada a una salida.
#[derive(Debug, Clone)]
pub struct PassThroughRule {
    input: PortId,
    output: PortId,
    rows: RowsEffect,
}

impl PassThroughRule {
    pub fn new(input: PortId, output: PortId) -> Self {
        Self { input,
               output,
               rows: RowsEffect::Keep }
    }

    #[must_use]
    pub fn with_rows(mut self, rows: RowsEffect) -> Self {
        self.rows = rows;
        self
    }
}

impl TransformationRule for PassThroughRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let mut md = ctx.input_meta_data(self.input);
        if let Some(table) = md.as_table_mut() {
            table.set_rows(self.rows.apply(table.rows()));
        }
        ctx.deliver_meta_data(self.output, md);
    }
}

/// Copia 1:1 los metadatos a través del borde de una unidad.
#[derive(Debug, Clone, Copy)]
pub struct PairPassThroughRule(pub PairId);

impl TransformationRule for PairPassThroughRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        ctx.pass_meta_data_through(self.0);
    }
}

/// Delega en la unidad anidada: transforma recursivamente sus miembros.
#[derive(Debug, Clone, Copy)]
pub struct SubprocessRule(pub UnitId);

impl TransformationRule for SubprocessRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        ctx.transform_unit(self.0);
    }
}

type AggregateFn = dyn Fn(&[MetaData]) -> MetaData + Send + Sync;

/// Combina los metadatos de todos los puertos conectados de un grupo
/// extendido en una sola salida.
pub struct GroupAggregationRule {
    group: GroupId,
    output: PortId,
    aggregate: Box<AggregateFn>,
}

impl GroupAggregationRule {
    pub fn new<F>(group: GroupId, output: PortId, aggregate: F) -> Self
        where F: Fn(&[MetaData]) -> MetaData + Send + Sync + 'static
    {
        Self { group,
               output,
               aggregate: Box::new(aggregate) }
    }
}

impl TransformationRule for GroupAggregationRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let inputs = ctx.collect_meta_data(self.group);
        let md = (self.aggregate)(&inputs);
        ctx.deliver_meta_data(self.output, md);
    }
}

/// Una entrada copiada a cada puerto de un grupo de salidas.
#[derive(Debug, Clone, Copy)]
pub struct FanOutRule {
    pub input: PortId,
    pub group: GroupId,
}

impl TransformationRule for FanOutRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let md = ctx.input_meta_data(self.input);
        let outputs = ctx.graph().ports_of(self.group).to_vec();
        for port in outputs {
            ctx.deliver_meta_data(port, md.clone());
        }
    }
}

/// Resultados de un bucle: cada salida es una colección de lo que llegó al
/// sumidero correspondiente, aflojada porque el número de iteraciones no se
/// conoce estáticamente.
#[derive(Debug, Clone, Copy)]
pub struct IterationResultRule(pub PairId);

impl TransformationRule for IterationResultRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let pairs = match ctx.graph().pair(self.0) {
            Ok(p) => p.pairs().to_vec(),
            Err(e) => {
                ctx.add_issue(None, Severity::Error, e.to_string());
                return;
            }
        };
        for (sink, output) in pairs {
            if !ctx.graph().is_connected(sink) {
                ctx.deliver_meta_data(output, MetaData::Unknown);
                continue;
            }
            let inner = ctx.input_meta_data(sink);
            ctx.deliver_meta_data(output, MetaData::collection_of(inner.loosened()));
        }
    }
}
