//! Contención de fallos como operador explícito.
//!
//! Ejecuta su unidad `try`. Si falla (salvo parada), el fallo no sube:
//! el mensaje va a la macro configurada y al valor `exception`, `success`
//! queda en 0 y todas las salidas en "sin valor".

use log::Level;

use crate::constants::{EXCEPTION_VALUE, SUCCESS_VALUE};
use crate::engine::ExecutionContext;
use crate::errors::{ExecutionError, GraphError};
use crate::graph::{PairId, UnitId};
use crate::operator::{Operator, OperatorBuilder, PairPassThroughRule, SubprocessRule};
use crate::param::{ParameterType, ParameterValue};

pub const EXCEPTION_MACRO_PARAMETER: &str = "exception_macro";

#[derive(Debug, Default)]
pub struct HandleException {
    wiring: Option<(PairId, UnitId, PairId)>,
}

impl HandleException {
    pub const TYPE_KEY: &'static str = "handle_exception";
    pub const UNIT: &'static str = "try";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for HandleException {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let unit = builder.unit(Self::UNIT)?;
        let inputs = builder.pass_inputs_into(unit, "input", "input")?;
        let outputs = builder.pass_results_out_of(unit, "output", "output")?;
        builder.parameter(ParameterType::string(EXCEPTION_MACRO_PARAMETER,
                                                "macro that receives the message of a contained failure")
                          .with_default(ParameterValue::String("exception".into())))?;
        builder.rule(PairPassThroughRule(inputs))?;
        builder.rule(SubprocessRule(unit))?;
        builder.rule(PairPassThroughRule(outputs))?;
        self.wiring = Some((inputs, unit, outputs));
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let (inputs, unit, outputs) =
            self.wiring
                .ok_or_else(|| ExecutionError::Internal("handle_exception was never declared".into()))?;
        let macro_name = ctx.get_string(EXCEPTION_MACRO_PARAMETER)?;

        let attempt = ctx.pass_data_through(inputs).and_then(|()| ctx.execute_unit(unit));
        match attempt {
            Ok(()) => {
                ctx.pass_data_through(outputs)?;
                ctx.set_value(SUCCESS_VALUE, 1.0);
                ctx.set_value(EXCEPTION_VALUE, "");
                Ok(())
            }
            Err(e) if e.is_stop() => Err(e),
            Err(e) => {
                let message = e.to_string();
                ctx.log(Level::Warn, &format!("contained failure: {message}"));
                ctx.set_macro(&macro_name, message.as_str());
                ctx.set_value(SUCCESS_VALUE, 0.0);
                ctx.set_value(EXCEPTION_VALUE, message);
                ctx.clear_outputs()
            }
        }
    }
}
