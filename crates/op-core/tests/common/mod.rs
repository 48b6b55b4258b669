//! Operadores mínimos compartidos por los tests de integración.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use op_core::constants::ITERATION_VALUE;
use op_core::metadata::{Cardinality, KindPrecondition, MetaData, TableMetaData};
use op_core::operator::{GenerateRule, PassThroughRule, RowsEffect};
use op_core::{ExecutionContext, ExecutionError, GraphError, IOObject, LoopControl, LoopResults, Operator,
              OperatorBuilder, OperatorRegistry, ParameterType, ParameterValue};
use serde_json::json;

/// Emite un texto tomado del parámetro `value`.
pub struct Emit;

impl Operator for Emit {
    fn type_key(&self) -> &str {
        "test_emit"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let out = b.output("output")?;
        b.parameter(ParameterType::string("value", "text to emit").with_default(ParameterValue::String("x".into())))?;
        b.rule(GenerateRule::fixed(out, MetaData::generic("text")))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let value = ctx.get_string("value")?;
        ctx.deliver("output", IOObject::new("text", json!(value)))
    }
}

/// Emite una tabla de `rows` filas.
pub struct EmitTable;

impl Operator for EmitTable {
    fn type_key(&self) -> &str {
        "test_table"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let out = b.output("output")?;
        b.parameter(ParameterType::int("rows", 0, 1000, "number of rows"))?;
        b.rule(GenerateRule::computed(out, |ctx| {
                   let rows = ctx.get_int("rows").map_or(Cardinality::unknown(), |n| Cardinality::exact(n as usize));
                   MetaData::Table(TableMetaData::new().with_rows(rows))
               }))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let rows = ctx.get_int("rows")?;
        ctx.deliver("output", IOObject::table((0..rows).map(|i| json!({ "i": i })).collect()))
    }
}

/// Copia la entrada a la salida.
pub struct Relay;

impl Operator for Relay {
    fn type_key(&self) -> &str {
        "test_relay"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = b.input("input")?;
        let output = b.output("output")?;
        b.rule(PassThroughRule::new(input, output))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let obj = ctx.input("input")?;
        ctx.deliver_shared("output", obj)
    }
}

/// Filtro que sólo puede quitar filas.
pub struct Shrink;

impl Operator for Shrink {
    fn type_key(&self) -> &str {
        "test_shrink"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = b.input("input")?;
        let output = b.output("output")?;
        b.rule(PassThroughRule::new(input, output).with_rows(RowsEffect::Reduce))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let obj = ctx.input("input")?;
        let kept: Vec<_> = obj.rows().iter().skip(1).cloned().collect();
        ctx.deliver("output", obj.derive(json!(kept)))
    }
}

/// Exige una entrada de tipo `kind`.
pub struct Needs(pub &'static str);

impl Operator for Needs {
    fn type_key(&self) -> &str {
        "test_needs"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = b.input("input")?;
        b.precondition(input, KindPrecondition::new(self.0))
    }

    fn execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// Siempre falla.
pub struct Boom;

impl Operator for Boom {
    fn type_key(&self) -> &str {
        "test_boom"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        b.output("output")?;
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        Err(ExecutionError::user("operator_failed", ["boom"]))
    }
}

/// Pide la parada del proceso y termina bien.
pub struct RequestStop;

impl Operator for RequestStop {
    fn type_key(&self) -> &str {
        "test_request_stop"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        b.output("output")?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        ctx.services().stop_handle().request_stop();
        ctx.deliver("output", IOObject::new("text", json!("stopping")))
    }
}

/// Anota el valor `iteration` del ancestro más cercano en cada ejecución.
pub struct Observe(pub Arc<Mutex<Vec<f64>>>);

impl Operator for Observe {
    fn type_key(&self) -> &str {
        "test_observe"
    }

    fn declare(&mut self, b: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let out = b.output("output")?;
        b.rule(GenerateRule::fixed(out, MetaData::Table(TableMetaData::new().with_rows(Cardinality::exact(1)))))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let seen = ctx.ancestor_value(ITERATION_VALUE).and_then(|v| v.as_number()).unwrap_or(-1.0);
        self.0.lock().unwrap().push(seen);
        ctx.deliver("output", IOObject::table(vec![json!({ "iteration": seen })]))
    }
}

/// Bucle que para tras `n` iteraciones.
pub struct StopAfter(pub usize);

impl LoopControl for StopAfter {
    fn type_key(&self) -> &str {
        "test_stop_after"
    }

    fn should_stop(&mut self, _ctx: &ExecutionContext<'_>, results: &LoopResults) -> Result<bool, ExecutionError> {
        Ok(results.iterations() >= self.0)
    }
}

/// Bucle que nunca para por sí mismo.
pub struct Forever;

impl LoopControl for Forever {
    fn type_key(&self) -> &str {
        "test_forever"
    }

    fn should_stop(&mut self, _ctx: &ExecutionContext<'_>, _results: &LoopResults) -> Result<bool, ExecutionError> {
        Ok(false)
    }
}

pub fn registry() -> Arc<OperatorRegistry> {
    let registry = OperatorRegistry::with_builtins();
    registry.register("test_emit", || Box::new(Emit));
    registry.register("test_table", || Box::new(EmitTable));
    registry.register("test_relay", || Box::new(Relay));
    registry.register("test_shrink", || Box::new(Shrink));
    registry.register("test_boom", || Box::new(Boom));
    registry.register("test_stop_after", || Box::new(op_core::IteratingChain::new(StopAfter(2))));
    Arc::new(registry)
}
