use crate::engine::ExecutionContext;
use crate::errors::{ExecutionError, GraphError};
use crate::graph::{PairId, UnitId};
use crate::operator::{Operator, OperatorBuilder, PairPassThroughRule, SubprocessRule};

/// Agrupa operadores en una unidad anidada. Entradas `input N` pasan a las
/// fuentes interiores homónimas; los sumideros `output N` salen por las
/// salidas homónimas.
#[derive(Debug, Default)]
pub struct Subprocess {
    wiring: Option<(PairId, UnitId, PairId)>,
}

impl Subprocess {
    pub const TYPE_KEY: &'static str = "subprocess";
    pub const UNIT: &'static str = "process";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for Subprocess {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let unit = builder.unit(Self::UNIT)?;
        let inputs = builder.pass_inputs_into(unit, "input", "input")?;
        let outputs = builder.pass_results_out_of(unit, "output", "output")?;
        builder.rule(PairPassThroughRule(inputs))?;
        builder.rule(SubprocessRule(unit))?;
        builder.rule(PairPassThroughRule(outputs))?;
        self.wiring = Some((inputs, unit, outputs));
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let (inputs, unit, outputs) =
            self.wiring
                .ok_or_else(|| ExecutionError::Internal("subprocess was never declared".into()))?;
        ctx.pass_data_through(inputs)?;
        ctx.execute_unit(unit)?;
        ctx.pass_data_through(outputs)
    }
}
