use crate::errors::{ExecutionError, GraphError};
use crate::graph::UnitId;
use crate::operator::{Operator, OperatorBuilder, SubprocessRule};
use crate::engine::ExecutionContext;

pub const MAIN_UNIT: &str = "main";

/// Operador raíz de un proceso: una unidad `main` con fuentes `input N` y
/// sumideros `result N` de aridad variable.
#[derive(Debug, Default)]
pub struct ProcessRoot {
    main: Option<UnitId>,
}

impl ProcessRoot {
    pub const TYPE_KEY: &'static str = "process";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for ProcessRoot {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let main = builder.unit(MAIN_UNIT)?;
        builder.extend_unit_sources(main, "input")?;
        builder.extend_unit_sinks(main, "result")?;
        builder.rule(SubprocessRule(main))?;
        self.main = Some(main);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let main = self.main
                       .ok_or_else(|| ExecutionError::Internal("process root was never declared".into()))?;
        ctx.execute_unit(main)
    }
}
