//! opflow
//!
//! Punto de entrada del workspace:
//! - Reexporta `op_core` (motor) y `op_operators` (operadores de ejemplo).
//! - `demo` arma un proceso pequeño que usa bucles y contención de fallos.

pub use op_core as core;
pub use op_operators as operators;

pub mod demo;

pub use demo::{demo_definition, demo_process};
