//! op-core: motor de grafos de operadores con doble pasada.
//!
//! Pasada estática (`Process::validate`): propaga metadatos por las
//! conexiones y recoge todos los problemas sin ejecutar nada. Pasada
//! dinámica (`Process::run`): mueve datos reales en el mismo orden.
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod hashing;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod operator;
pub mod operators;
pub mod param;
pub mod port;
pub mod process;
pub mod repo;
pub mod report;

pub use config::ProcessConfig;
pub use engine::{ExecutionContext, TransformContext};
pub use errors::{ExecutionError, GraphError, OperatorException, ParameterError, RepositoryError};
pub use graph::{Graph, GroupId, OperatorId, PairId, PortId, UnitId};
pub use logging::{InMemoryLogSink, LogCrateSink, LogRecord, LogSink};
pub use metadata::{Cardinality, MetaData, Precondition, SetRelation, TableMetaData};
pub use model::{IOContainer, IOObject, ObservedValue, ProvenanceEntry};
pub use operator::{Operator, OperatorBuilder, TransformationRule};
pub use operators::{ExecuteProcess, HandleException, IteratingChain, LoopControl, LoopResults, LoopState,
                    Subprocess};
pub use param::{MacroTable, ParameterType, ParameterValue};
pub use process::{Process, ProcessServices, StopHandle};
pub use repo::{InMemoryProcessRepository, OperatorRegistry, ProcessDefinition, ProcessRepository,
               RepositoryLocation};
pub use report::{Severity, ValidationIssue, ValidationReport};
