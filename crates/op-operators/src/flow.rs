//! Utilidades de flujo: copiar, fijar macros y fallar a propósito.

use log::Level;
use op_core::operator::{FanOutRule, PassThroughRule};
use op_core::{ExecutionContext, ExecutionError, GraphError, GroupId, Operator, OperatorBuilder, ParameterType,
              ParameterValue};

/// Entrega la misma entrada por cada salida `output N`.
#[derive(Debug, Default)]
pub struct Multiply {
    outputs: Option<GroupId>,
}

impl Multiply {
    pub const TYPE_KEY: &'static str = "multiply";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for Multiply {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = builder.input("input")?;
        let outputs = builder.extend_outputs("output")?;
        builder.rule(FanOutRule { input,
                                  group: outputs })?;
        self.outputs = Some(outputs);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let group = self.outputs
                        .ok_or_else(|| ExecutionError::Internal("multiply was never declared".into()))?;
        let object = ctx.input("input")?;
        let ports = ctx.graph().ports_of(group).to_vec();
        for port in ports {
            ctx.deliver_to(port, Some(object.clone()))?;
        }
        Ok(())
    }
}

/// Fija la macro `macro` al valor `value`; lo que entra por `through` sale igual.
#[derive(Debug, Default)]
pub struct SetMacro;

impl SetMacro {
    pub const TYPE_KEY: &'static str = "set_macro";

    pub fn new() -> Self {
        Self
    }
}

impl Operator for SetMacro {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = builder.optional_input("through")?;
        let output = builder.output("through")?;
        builder.parameter(ParameterType::string("macro", "name of the macro"))?;
        builder.parameter(ParameterType::string("value", "value assigned to the macro")
                          .with_default(ParameterValue::String(String::new())))?;
        builder.rule(PassThroughRule::new(input, output))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let name = ctx.get_string("macro")?;
        let value = ctx.get_string("value")?;
        ctx.log(Level::Debug, &format!("macro '{name}' = '{value}'"));
        ctx.set_macro(&name, value);
        if let Some(object) = ctx.input_opt("through")? {
            ctx.deliver_shared("through", object)?;
        }
        Ok(())
    }
}

/// Siempre lanza una excepción de operador con `message`.
#[derive(Debug, Default)]
pub struct Fail;

impl Fail {
    pub const TYPE_KEY: &'static str = "fail";
}

impl Operator for Fail {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        builder.optional_input("through")?;
        builder.output("through")?;
        builder.parameter(ParameterType::string("message", "failure message")
                          .with_default(ParameterValue::String("failure requested".into())))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let message = ctx.get_string("message")?;
        Err(ExecutionError::user("operator_failed", [message]))
    }
}
