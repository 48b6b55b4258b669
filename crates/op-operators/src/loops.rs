//! Bucles concretos sobre `IteratingChain`.
//!
//! Cada uno aporta sólo su condición de parada y, si hace falta, la macro
//! que publica en cada iteración.

use op_core::{ExecutionContext, ExecutionError, GraphError, IOObject, LoopControl, LoopResults, OperatorBuilder,
              ParameterType, ParameterValue};
use serde_json::Value;

const ITERATION_MACRO: &str = "iteration_macro";

/// Repite la unidad `iterations` veces.
#[derive(Debug, Default)]
pub struct LoopTimes {
    iterations: usize,
}

impl LoopTimes {
    pub const TYPE_KEY: &'static str = "loop_times";
}

impl LoopControl for LoopTimes {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare_parameters(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        builder.parameter(ParameterType::int("iterations", 0, 1_000_000, "number of iterations")
                          .with_default(ParameterValue::Int(1)))?;
        builder.parameter(ParameterType::string(ITERATION_MACRO, "macro set to the 1-based iteration number")
                          .optional())
    }

    fn prepare(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<bool, ExecutionError> {
        self.iterations = usize::try_from(ctx.get_int("iterations")?).unwrap_or(0);
        Ok(self.iterations > 0)
    }

    fn before_iteration(&mut self, ctx: &mut ExecutionContext<'_>, iteration: usize) -> Result<(), ExecutionError> {
        if let Ok(name) = ctx.get_string(ITERATION_MACRO) {
            ctx.set_macro(&name, (iteration + 1).to_string());
        }
        Ok(())
    }

    fn should_stop(&mut self, _ctx: &ExecutionContext<'_>, results: &LoopResults) -> Result<bool, ExecutionError> {
        Ok(results.iterations() >= self.iterations)
    }
}

/// Una iteración por entrada de la lista `values`; la macro `macro` toma
/// el valor de la entrada en curso.
#[derive(Debug, Default)]
pub struct LoopValues {
    values: Vec<String>,
}

impl LoopValues {
    pub const TYPE_KEY: &'static str = "loop_values";
}

impl LoopControl for LoopValues {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare_parameters(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        builder.parameter(ParameterType::list("values", "entries iterated in order (key -> value)"))?;
        builder.parameter(ParameterType::string("macro", "macro holding the current value")
                          .with_default(ParameterValue::String("loop_value".into())))
    }

    fn prepare(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<bool, ExecutionError> {
        self.values = ctx.get_list("values")?.into_iter().map(|(_, v)| v).collect();
        Ok(!self.values.is_empty())
    }

    fn before_iteration(&mut self, ctx: &mut ExecutionContext<'_>, iteration: usize) -> Result<(), ExecutionError> {
        let name = ctx.get_string("macro")?;
        let value = self.values.get(iteration).cloned().unwrap_or_default();
        ctx.set_macro(&name, value);
        Ok(())
    }

    fn should_stop(&mut self, _ctx: &ExecutionContext<'_>, results: &LoopResults) -> Result<bool, ExecutionError> {
        Ok(results.iterations() >= self.values.len())
    }
}

/// Repite hasta que el valor numérico `attribute` del último resultado
/// (primera salida) alcance `threshold`, o hasta `max_iterations`.
#[derive(Debug, Default)]
pub struct LoopUntil;

impl LoopUntil {
    pub const TYPE_KEY: &'static str = "loop_until";
}

/// Número en un objeto: el propio dato si es numérico, o el atributo de la
/// primera fila si es una tabla.
fn observed_number(object: &IOObject, attribute: &str) -> Option<f64> {
    match object.data() {
        Value::Number(n) => n.as_f64(),
        _ => object.rows().first()?.get(attribute)?.as_f64(),
    }
}

impl LoopControl for LoopUntil {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare_parameters(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        builder.parameter(ParameterType::string("attribute", "attribute read from the first row of the result"))?;
        builder.parameter(ParameterType::real("threshold", "value that ends the loop"))?;
        builder.parameter(ParameterType::category("direction", &["rising", "falling"], "how the value approaches")
                          .with_default(ParameterValue::Category("rising".into())))?;
        builder.parameter(ParameterType::int("max_iterations", 1, 1_000_000, "hard cap on iterations")
                          .with_default(ParameterValue::Int(100)))
    }

    fn should_stop(&mut self, ctx: &ExecutionContext<'_>, results: &LoopResults) -> Result<bool, ExecutionError> {
        let max = usize::try_from(ctx.get_int("max_iterations")?).unwrap_or(usize::MAX);
        if results.iterations() >= max {
            return Ok(true);
        }
        let attribute = ctx.get_string("attribute")?;
        let threshold = ctx.get_real("threshold")?;
        let value = results.latest(0)
                           .and_then(|o| observed_number(o, &attribute))
                           .ok_or_else(|| ExecutionError::user("loop_value_missing", [attribute.as_str()]))?;
        Ok(match ctx.get_category("direction")?.as_str() {
               "falling" => value <= threshold,
               _ => value >= threshold,
           })
    }
}
