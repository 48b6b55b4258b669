//! op-operators: operadores de ejemplo sobre el contrato público de op-core.
//!
//! Este crate provee:
//! - Operadores de tablas (`create_table`, `filter_rows`,
//!   `select_attributes`, `append_tables`, `count_rows`).
//! - Utilidades de flujo (`multiply`, `set_macro`, `fail`).
//! - Bucles concretos sobre `IteratingChain`: `loop_times`, `loop_values`
//!   y `loop_until`.
//!
//! Nota: el motor sólo conoce `IOObject { kind, data }`; aquí las tablas son
//! arrays JSON de objetos `atributo -> valor`.

pub mod flow;
pub mod loops;
pub mod tables;

use std::sync::Arc;

use op_core::{IteratingChain, OperatorRegistry};

pub use flow::{Fail, Multiply, SetMacro};
pub use loops::{LoopTimes, LoopUntil, LoopValues};
pub use tables::{AppendTables, CountRows, CreateTable, FilterRows, SelectAttributes};

/// Registra todos los operadores del crate.
pub fn register_all(registry: &OperatorRegistry) {
    registry.register(CreateTable::TYPE_KEY, || Box::new(CreateTable::new()));
    registry.register(FilterRows::TYPE_KEY, || Box::new(FilterRows::new()));
    registry.register(SelectAttributes::TYPE_KEY, || Box::new(SelectAttributes::new()));
    registry.register(AppendTables::TYPE_KEY, || Box::new(AppendTables::new()));
    registry.register(CountRows::TYPE_KEY, || Box::new(CountRows::new()));
    registry.register(Multiply::TYPE_KEY, || Box::new(Multiply::new()));
    registry.register(SetMacro::TYPE_KEY, || Box::new(SetMacro::new()));
    registry.register(Fail::TYPE_KEY, || Box::new(Fail));
    registry.register(LoopTimes::TYPE_KEY, || Box::new(IteratingChain::new(LoopTimes::default())));
    registry.register(LoopValues::TYPE_KEY, || Box::new(IteratingChain::new(LoopValues::default())));
    registry.register(LoopUntil::TYPE_KEY, || Box::new(IteratingChain::new(LoopUntil::default())));
}

/// Registro con los operadores del motor más los de este crate.
pub fn registry() -> Arc<OperatorRegistry> {
    let registry = OperatorRegistry::with_builtins();
    register_all(&registry);
    Arc::new(registry)
}
