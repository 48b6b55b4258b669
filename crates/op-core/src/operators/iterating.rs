//! Esqueleto de las cadenas iterativas.
//!
//! El motor aporta el bucle; la condición de parada y los ganchos los aporta
//! un `LoopControl` concreto. Cada iteración: sondeo de parada, paso de
//! entradas, ejecución de la unidad, recogida de los sumideros, gancho de
//! usuario, incremento del contador y evaluación de `should_stop` con los
//! resultados más recientes.
//!
//! Estáticamente la unidad se transforma una sola vez y cada salida se
//! declara como colección con cardinalidad aflojada.

use std::sync::Arc;

use log::Level;

use crate::constants::ITERATION_VALUE;
use crate::engine::ExecutionContext;
use crate::errors::{ExecutionError, GraphError};
use crate::graph::{PairId, PortId, UnitId};
use crate::model::IOObject;
use crate::operator::{IterationResultRule, Operator, OperatorBuilder, PairPassThroughRule, SubprocessRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    StopCheck,
    Done,
}

/// Lo que llegó a cada sumidero emparejado, iteración a iteración.
#[derive(Debug, Clone, Default)]
pub struct LoopResults {
    rounds: Vec<Vec<Option<Arc<IOObject>>>>,
}

impl LoopResults {
    pub fn iterations(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Resultado de la última iteración en la salida `index`.
    pub fn latest(&self, index: usize) -> Option<&IOObject> {
        self.rounds.last()?.get(index)?.as_deref()
    }

    /// Todo lo recogido en la salida `index`, en orden de iteración.
    pub fn collected(&self, index: usize) -> Vec<IOObject> {
        self.rounds
            .iter()
            .filter_map(|round| round.get(index).cloned().flatten())
            .map(|obj| (*obj).clone())
            .collect()
    }

    fn push(&mut self, round: Vec<Option<Arc<IOObject>>>) {
        self.rounds.push(round);
    }
}

/// Parte específica de cada bucle.
pub trait LoopControl: Send {
    fn type_key(&self) -> &str;

    fn declare_parameters(&mut self, _builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        Ok(())
    }

    /// Se llama una vez antes de la primera iteración. `false` = ninguna
    /// iteración (las salidas quedan como colecciones vacías).
    fn prepare(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<bool, ExecutionError> {
        Ok(true)
    }

    fn before_iteration(&mut self, _ctx: &mut ExecutionContext<'_>, _iteration: usize)
                        -> Result<(), ExecutionError> {
        Ok(())
    }

    fn after_iteration(&mut self, _ctx: &mut ExecutionContext<'_>, _iteration: usize, _results: &LoopResults)
                       -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Se evalúa tras cada iteración con los resultados más recientes.
    fn should_stop(&mut self, ctx: &ExecutionContext<'_>, results: &LoopResults) -> Result<bool, ExecutionError>;
}

pub struct IteratingChain<C> {
    control: C,
    state: LoopState,
    wiring: Option<(PairId, UnitId, PairId)>,
}

impl<C: LoopControl> IteratingChain<C> {
    pub const UNIT: &'static str = "iteration";

    pub fn new(control: C) -> Self {
        Self { control,
               state: LoopState::Idle,
               wiring: None }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn iterate(&mut self, ctx: &mut ExecutionContext<'_>, inputs: PairId, unit: UnitId,
               sinks: &[PortId], results: &mut LoopResults)
               -> Result<(), ExecutionError> {
        if !self.control.prepare(ctx)? {
            return Ok(());
        }
        let limit = ctx.services().config().max_loop_iterations;
        let mut iteration = 0;
        loop {
            self.state = LoopState::Running;
            ctx.check_for_stop()?;
            if let Some(limit) = limit.filter(|l| iteration >= *l) {
                return Err(ExecutionError::IterationLimit { operator: ctx.operator_name(),
                                                            limit });
            }
            ctx.log(Level::Debug, &format!("starting iteration {}", iteration + 1));
            self.control.before_iteration(ctx, iteration)?;
            ctx.pass_data_through(inputs)?;
            ctx.execute_unit(unit)?;
            results.push(sinks.iter().map(|s| ctx.input_at(*s)).collect());
            self.control.after_iteration(ctx, iteration, results)?;

            iteration += 1;
            ctx.set_value(ITERATION_VALUE, iteration);
            self.state = LoopState::StopCheck;
            if self.control.should_stop(ctx, results)? {
                return Ok(());
            }
        }
    }
}

impl<C: LoopControl> Operator for IteratingChain<C> {
    fn type_key(&self) -> &str {
        self.control.type_key()
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let unit = builder.unit(Self::UNIT)?;
        let inputs = builder.pass_inputs_into(unit, "input", "input")?;
        let outputs = builder.pass_results_out_of(unit, "output", "output")?;
        self.control.declare_parameters(builder)?;
        builder.rule(PairPassThroughRule(inputs))?;
        builder.rule(SubprocessRule(unit))?;
        builder.rule(IterationResultRule(outputs))?;
        self.wiring = Some((inputs, unit, outputs));
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let (inputs, unit, outputs) =
            self.wiring
                .ok_or_else(|| ExecutionError::Internal("iterating chain was never declared".into()))?;
        self.state = LoopState::Idle;
        ctx.set_value(ITERATION_VALUE, 0usize);

        let pairs = ctx.graph().pair(outputs)?.pairs().to_vec();
        let sinks: Vec<PortId> = pairs.iter().map(|(sink, _)| *sink).collect();
        let mut results = LoopResults::default();
        let outcome = self.iterate(ctx, inputs, unit, &sinks, &mut results);
        self.state = LoopState::Done;
        outcome?;

        ctx.log(Level::Debug, &format!("loop finished after {} iterations", results.iterations()));
        for (index, (sink, output)) in pairs.into_iter().enumerate() {
            let collection = ctx.graph()
                                .is_connected(sink)
                                .then(|| Arc::new(IOObject::collection(results.collected(index))));
            ctx.deliver_to(output, collection)?;
        }
        Ok(())
    }
}
