//! Cadenas propias del motor.
//!
//! Todas implementan el mismo `Operator` que un operador hoja; lo único que
//! las distingue es que `declare` crea unidades de ejecución.

mod execute_process;
mod handle_exception;
mod iterating;
mod root;
mod subprocess;

pub use execute_process::ExecuteProcess;
pub use handle_exception::HandleException;
pub use iterating::{IteratingChain, LoopControl, LoopResults, LoopState};
pub use root::{ProcessRoot, MAIN_UNIT};
pub use subprocess::Subprocess;
