//! Las dos pasadas del motor.
//!
//! - `transform`: pasada estática. Recorre cada unidad en orden topológico,
//!   propaga metadatos y adjunta problemas a puertos y operadores. Nunca
//!   aborta.
//! - `execute`: pasada dinámica. Mismo orden, mueve datos reales y aborta
//!   con `ExecutionError` al primer fallo no contenido.

mod context;
pub(crate) mod execute;
pub(crate) mod transform;

pub use context::{ExecutionContext, TransformContext};
