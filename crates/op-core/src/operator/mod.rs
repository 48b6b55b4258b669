//! Contrato de los operadores.
//!
//! Un operador hoja y una cadena implementan el mismo trait; la diferencia
//! es sólo si `declare` crea unidades de ejecución. El motor nunca pregunta
//! "¿es una cadena?" salvo para recorrer esas unidades.

mod builder;
mod rules;

pub use builder::OperatorBuilder;
pub use rules::{FanOutRule, GenerateRule, GroupAggregationRule, IterationResultRule, PairPassThroughRule,
                PassThroughRule, RowsEffect, SubprocessRule, TransformationRule};

use crate::engine::{ExecutionContext, TransformContext};
use crate::errors::{ExecutionError, GraphError};

pub trait Operator: Send {
    /// Clave de tipo con la que se registra y se persiste.
    fn type_key(&self) -> &str;

    /// Declara puertos, unidades, parámetros y reglas. Se llama una vez al
    /// añadir el operador al grafo; el operador puede guardar los ids que
    /// recibe para usarlos luego en `execute`.
    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError>;

    /// Pasada estática. Por defecto aplica las reglas declaradas en orden.
    fn transform(&mut self, ctx: &mut TransformContext<'_>) {
        ctx.apply_rules();
    }

    /// Pasada dinámica: lee entradas, hace el trabajo y entrega salidas.
    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError>;
}
