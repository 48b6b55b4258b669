//! Constantes del motor.
//!
//! `ENGINE_VERSION` forma parte del hash de las definiciones de proceso: un
//! cambio de versión invalida los hashes guardados aunque la definición no
//! cambie.

pub const ENGINE_VERSION: &str = "1.0";

/// Número de veces que se ejecutó un operador en la ejecución actual.
pub const APPLY_COUNT_VALUE: &str = "applycount";
/// Contador de iteraciones de una cadena iterativa (antes de incrementar).
pub const ITERATION_VALUE: &str = "iteration";
/// 1 si la unidad contenida terminó bien, 0 si falló.
pub const SUCCESS_VALUE: &str = "success";
/// Mensaje de la excepción contenida.
pub const EXCEPTION_VALUE: &str = "exception";
