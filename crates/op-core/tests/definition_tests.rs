mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{registry, Emit, Relay};
use op_core::{ExecuteProcess, InMemoryProcessRepository, MetaData, ParameterValue, Process, ProcessConfig,
              ProcessDefinition, ProcessRepository, RepositoryError, RepositoryLocation, Severity, Subprocess};
use serde_json::json;

/// E -> S(R) -> result 1, más un segundo emisor conectado a una entrada extendida.
fn nested_process() -> Process {
    let mut p = Process::with_registry("nested", registry()).unwrap();
    p.define_macro("greeting", "hola");
    let main = p.main_unit();
    let e = p.add_operator("E", Box::new(Emit)).unwrap();
    let f = p.add_operator("F", Box::new(Emit)).unwrap();
    let s = p.add_operator("S", Box::new(Subprocess::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(e, "value", ParameterValue::String("%{greeting}".into())).unwrap();
    let unit = g.unit_by_name(s, Subprocess::UNIT).unwrap();
    let r = g.add_operator(unit, "R", Box::new(Relay)).unwrap();
    g.wire(e, "output", s, "input 1").unwrap();
    g.wire(f, "output", s, "input 2").unwrap();
    g.wire_source(unit, "input 1", r, "input").unwrap();
    g.wire_sink(r, "output", unit, "output 1").unwrap();
    g.wire_through(unit, "input 2", "output 2").unwrap();
    g.wire_sink(s, "output 1", main, "result 1").unwrap();
    g.wire_sink(s, "output 2", main, "result 2").unwrap();
    p
}

#[test]
fn definitions_survive_a_json_round_trip() {
    let original = nested_process();
    let definition = original.to_definition();
    let text = definition.to_json().unwrap();
    let parsed = ProcessDefinition::from_json(&text).unwrap();
    assert_eq!(parsed, definition);
    assert_eq!(parsed.operator_count(), 4);

    let mut rebuilt = Process::from_definition(&parsed, registry()).unwrap();
    assert_eq!(rebuilt.to_definition(), definition);
    assert_eq!(rebuilt.to_definition().definition_hash(), definition.definition_hash());

    let results = rebuilt.run().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.get(0).unwrap().data(), &json!("hola"));
    assert_eq!(results.get(1).unwrap().data(), &json!("x"));
}

#[test]
fn unknown_operator_types_are_rejected_when_building() {
    let mut definition = nested_process().to_definition();
    definition.root.operators[0].type_key = "no_such_type".into();
    let err = Process::from_definition(&definition, registry()).unwrap_err();
    assert!(err.to_string().contains("no_such_type"), "{err}");
}

fn child_definition() -> ProcessDefinition {
    let mut child = Process::with_registry("child", registry()).unwrap();
    let main = child.main_unit();
    let r = child.add_operator("R", Box::new(Relay)).unwrap();
    let g = child.graph_mut();
    g.wire_source(main, "input 1", r, "input").unwrap();
    g.wire_sink(r, "output", main, "result 1").unwrap();
    child.to_definition()
}

fn parent_with(repository: Arc<dyn ProcessRepository>, reference: &str, config: ProcessConfig) -> Process {
    let mut p = Process::with_registry("parent", registry()).unwrap()
                                                             .with_repository(repository)
                                                             .with_location(RepositoryLocation::new("/app/parent")
                                                                                .unwrap())
                                                             .with_config(config);
    let main = p.main_unit();
    let e = p.add_operator("E", Box::new(Emit)).unwrap();
    let x = p.add_operator("X", Box::new(ExecuteProcess::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(x, "process_location", ParameterValue::String(reference.into())).unwrap();
    g.wire(e, "output", x, "input 1").unwrap();
    g.wire_sink(x, "result 1", main, "result 1").unwrap();
    p
}

fn repository() -> Arc<InMemoryProcessRepository> {
    let repository = Arc::new(InMemoryProcessRepository::new());
    repository.store(&RepositoryLocation::new("/lib/child").unwrap(), &child_definition())
              .unwrap();
    repository
}

#[test]
fn embedded_processes_run_with_the_host_inputs() {
    let mut p = parent_with(repository(), "../lib/child", ProcessConfig::default());
    let results = p.run().unwrap();
    let result = results.get(0).unwrap();
    assert_eq!(result.data(), &json!("x"));
    assert_eq!(result.operator_trail(), vec!["E", "R", "X"]);
}

#[test]
fn embedded_metadata_is_known_once_the_process_was_loaded() {
    let mut p = parent_with(repository(), "/lib/child", ProcessConfig::default());
    assert!(p.validate().is_empty());
    assert!(p.result_meta_data()[0].is_unknown());

    p.run().unwrap();
    let report = p.validate();
    assert!(report.is_empty(), "{report}");
    assert_eq!(p.result_meta_data()[0], MetaData::generic("text"));
}

#[test]
fn load_failures_during_validation_are_errors() {
    let config = ProcessConfig { load_during_validation: true,
                                 ..ProcessConfig::default() };
    let mut p = parent_with(repository(), "/lib/missing", config);
    let report = p.validate();
    let issues: Vec<_> = report.for_operator("X").collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains("/lib/missing"), "{}", issues[0].message);

    assert!(p.run().is_err());
}

#[test]
fn processes_can_be_saved_and_loaded_by_location() {
    let repository = repository();
    let location = RepositoryLocation::new("/app/nested").unwrap();
    let original = nested_process().with_repository(repository.clone());
    original.save(&location).unwrap();

    let mut loaded = Process::load(repository, &location, registry()).unwrap();
    assert_eq!(loaded.to_definition(), original.to_definition());
    assert_eq!(loaded.services().location(), Some(&location));
    assert_eq!(loaded.run().unwrap().get(0).unwrap().data(), &json!("hola"));
}

fn location(path: &str) -> RepositoryLocation {
    RepositoryLocation::new(path).unwrap()
}

/// Repositorio en memoria que cuenta cuántas veces se carga algo.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryProcessRepository,
    loads: AtomicUsize,
}

impl CountingRepository {
    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ProcessRepository for CountingRepository {
    fn load(&self, location: &RepositoryLocation) -> Result<ProcessDefinition, RepositoryError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(location)
    }

    fn store(&self, location: &RepositoryLocation, definition: &ProcessDefinition) -> Result<(), RepositoryError> {
        self.inner.store(location, definition)
    }
}

fn set_location(p: &mut Process, reference: &str) {
    let x = p.graph().find_operator("X").unwrap();
    p.graph_mut()
     .set_parameter(x, "process_location", ParameterValue::String(reference.into()))
     .unwrap();
}

#[test]
fn validation_never_loads_a_location_other_than_the_cached_one() {
    let repository = Arc::new(CountingRepository::default());
    repository.store(&location("/lib/a"), &child_definition()).unwrap();
    repository.store(&location("/lib/b"), &child_definition()).unwrap();
    let mut p = parent_with(repository.clone(), "/lib/a", ProcessConfig::default());
    p.run().unwrap();
    assert_eq!(repository.loads(), 1);

    set_location(&mut p, "/lib/b");
    let report = p.validate();
    assert!(!report.has_errors(), "{report}");
    assert_eq!(repository.loads(), 1);
    assert!(p.result_meta_data()[0].is_unknown());

    p.run().unwrap();
    assert_eq!(repository.loads(), 2);
    p.validate();
    assert_eq!(repository.loads(), 2);
    assert_eq!(p.result_meta_data()[0], MetaData::generic("text"));
}

/// Proceso cuyo único operador embebe `reference`.
fn embedder(name: &str, reference: &str) -> ProcessDefinition {
    let mut p = Process::with_registry(name, registry()).unwrap();
    let main = p.main_unit();
    let x = p.add_operator("X", Box::new(ExecuteProcess::new())).unwrap();
    let g = p.graph_mut();
    g.set_parameter(x, "process_location", ParameterValue::String(reference.into())).unwrap();
    g.wire_sink(x, "result 1", main, "result 1").unwrap();
    p.to_definition()
}

#[test]
fn a_process_embedding_itself_fails_instead_of_recursing() {
    let repository = Arc::new(InMemoryProcessRepository::new());
    let at = location("/lib/self");
    repository.store(&at, &embedder("self", "/lib/self")).unwrap();

    let mut p = Process::load(repository.clone(), &at, registry()).unwrap();
    let err = p.run().unwrap_err();
    assert!(!err.is_stop());
    assert_eq!(err.to_string(), "operator 'X': process '/lib/self' embeds itself");

    let config = ProcessConfig { load_during_validation: true,
                                 ..ProcessConfig::default() };
    let mut p = Process::load(repository, &at, registry()).unwrap().with_config(config);
    let report = p.validate();
    let issues: Vec<_> = report.for_operator("X").collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains("embeds itself"), "{}", issues[0].message);
}

#[test]
fn embedding_cycles_through_other_processes_are_detected() {
    let repository = Arc::new(InMemoryProcessRepository::new());
    repository.store(&location("/lib/a"), &embedder("a", "/lib/b")).unwrap();
    repository.store(&location("/lib/b"), &embedder("b", "a")).unwrap();

    let mut p = parent_with(repository, "/lib/a", ProcessConfig::default());
    let err = p.run().unwrap_err();
    assert!(err.to_string().contains("process '/lib/a' embeds itself"), "{err}");
}

#[test]
fn host_macros_apply_only_while_the_host_passes_them() {
    let mut child = Process::with_registry("greet", registry()).unwrap();
    child.define_macro("greeting", "hola");
    let main = child.main_unit();
    let e = child.add_operator("E", Box::new(Emit)).unwrap();
    let g = child.graph_mut();
    g.set_parameter(e, "value", ParameterValue::String("%{greeting}".into())).unwrap();
    g.wire_sink(e, "output", main, "result 1").unwrap();
    let repository = Arc::new(InMemoryProcessRepository::new());
    repository.store(&location("/lib/greet"), &child.to_definition()).unwrap();

    let mut p = parent_with(repository, "/lib/greet", ProcessConfig::default());
    let x = p.graph().find_operator("X").unwrap();
    let overrides = ParameterValue::List(vec![("greeting".into(), "hey".into())]);
    p.graph_mut().set_parameter(x, "macros", overrides).unwrap();
    assert_eq!(p.run().unwrap().get(0).unwrap().data(), &json!("hey"));

    p.graph_mut().set_parameter(x, "macros", ParameterValue::List(Vec::new())).unwrap();
    assert_eq!(p.run().unwrap().get(0).unwrap().data(), &json!("hola"));
}
