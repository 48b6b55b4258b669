//! Proceso de demostración.
//!
//! `Table` crea seis filas que `Split` reparte a los dos consumidores;
//! `Cuts` recorre dos umbrales (macro `cut`) y
//! cuenta las filas que los alcanzan; `Guard` contiene un fallo provocado.
//! Resultados: 1 = colección de cuentas, 2 = "sin valor".

use op_core::repo::{ConnectionDefinition, OperatorDefinition, UnitDefinition};
use op_core::{GraphError, ParameterValue, Process, ProcessDefinition};

fn connect(from: Option<&str>, from_port: &str, to: Option<&str>, to_port: &str) -> ConnectionDefinition {
    ConnectionDefinition::new(from, from_port, to, to_port)
}

fn table() -> OperatorDefinition {
    let data = (1..=6_i32).map(|i| vec![f64::from(i), f64::from(i) * 10.0]).collect();
    OperatorDefinition::new("Table", "create_table")
        .with_parameter("attributes",
                        ParameterValue::List(vec![("x".into(), "regular".into()), ("id".into(), "id".into())]))
        .with_parameter("data", ParameterValue::Matrix(data))
}

fn cuts() -> OperatorDefinition {
    let mut body = UnitDefinition::new("iteration");
    body.operators.push(OperatorDefinition::new("Filter", "filter_rows")
                            .with_parameter("attribute", ParameterValue::String("x".into()))
                            .with_parameter("value", ParameterValue::String("%{cut}".into())));
    body.operators.push(OperatorDefinition::new("Count", "count_rows"));
    body.connections.push(connect(None, "input 1", Some("Filter"), "input"));
    body.connections.push(connect(Some("Filter"), "output", Some("Count"), "input"));
    body.connections.push(connect(Some("Count"), "count", None, "output 1"));

    let mut op = OperatorDefinition::new("Cuts", "loop_values")
        .with_parameter("values", ParameterValue::List(vec![("low".into(), "2".into()), ("high".into(), "5".into())]))
        .with_parameter("macro", ParameterValue::String("cut".into()));
    op.units.push(body);
    op
}

fn guard() -> OperatorDefinition {
    let mut body = UnitDefinition::new("try");
    body.operators.push(OperatorDefinition::new("Broken", "fail")
                            .with_parameter("message", ParameterValue::String("demo failure".into())));
    body.connections.push(connect(None, "input 1", Some("Broken"), "through"));
    body.connections.push(connect(Some("Broken"), "through", None, "output 1"));

    let mut op = OperatorDefinition::new("Guard", "handle_exception");
    op.units.push(body);
    op
}

/// Definición serializable del proceso de demostración.
pub fn demo_definition() -> ProcessDefinition {
    let mut main = UnitDefinition::new("main");
    main.operators.extend([table(), OperatorDefinition::new("Split", "multiply"), cuts(), guard()]);
    main.connections.extend([connect(Some("Table"), "output", Some("Split"), "input"),
                             connect(Some("Split"), "output 1", Some("Cuts"), "input 1"),
                             connect(Some("Split"), "output 2", Some("Guard"), "input 1"),
                             connect(Some("Cuts"), "output 1", None, "result 1"),
                             connect(Some("Guard"), "output 1", None, "result 2")]);
    let mut definition = ProcessDefinition::new("demo", main);
    definition.macros.insert("cut".into(), "0".into());
    definition
}

pub fn demo_process() -> Result<Process, GraphError> {
    Process::from_definition(&demo_definition(), op_operators::registry())
}
