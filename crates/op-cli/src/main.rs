//! opflow-cli: valida, ejecuta o describe un proceso guardado como JSON.
//!
//! Códigos de salida: 0 ok, 2 la validación encontró errores, 4 no se pudo
//! cargar la definición, 5 la ejecución falló (o se detuvo).

mod console;
mod describe;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use op_core::config::init_dotenv;
use op_core::{InMemoryProcessRepository, Process, ProcessConfig, ProcessDefinition, ProcessRepository,
              RepositoryLocation, ValidationReport};
use serde_json::json;

use console::ConsoleLogSink;

#[derive(Parser)]
#[command(name = "opflow-cli")]
#[command(about = "Validate, run or describe an operator process", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(clap::Args)]
struct Source {
    /// Process definition (JSON).
    definition: PathBuf,

    /// Directory whose *.json definitions are reachable from execute_process
    /// as `/<file stem>`.
    #[arg(long)]
    library: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the static pass and print every problem found.
    Validate {
        #[command(flatten)]
        source: Source,
    },
    /// Validate, then execute and print what reached the results.
    Run {
        #[command(flatten)]
        source: Source,

        /// Execute even if validation reports errors.
        #[arg(long)]
        force: bool,
    },
    /// Print the operator tree.
    Describe {
        #[command(flatten)]
        source: Source,
    },
}

fn read_definition(path: &Path) -> Result<ProcessDefinition, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    ProcessDefinition::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn location_for(path: &Path) -> Result<RepositoryLocation, String> {
    let stem = path.file_stem()
                   .and_then(|s| s.to_str())
                   .ok_or_else(|| format!("{}: not a usable file name", path.display()))?;
    RepositoryLocation::new(&format!("/{stem}")).map_err(|e| e.to_string())
}

/// Repositorio en memoria con todas las definiciones de `library`.
fn load_library(dir: &Path) -> Result<InMemoryProcessRepository, String> {
    let repository = InMemoryProcessRepository::new();
    let entries = std::fs::read_dir(dir).map_err(|e| format!("{}: {e}", dir.display()))?;
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let definition = read_definition(&path)?;
            repository.store(&location_for(&path)?, &definition)
                      .map_err(|e| e.to_string())?;
        }
    }
    Ok(repository)
}

fn load_process(source: &Source) -> Result<Process, String> {
    let definition = read_definition(&source.definition)?;
    let process = Process::from_definition(&definition, op_operators::registry()).map_err(|e| e.to_string())?
                                                                                 .with_config(ProcessConfig::from_env())
                                                                                 .with_log_sink(Arc::new(ConsoleLogSink::new()))
                                                                                 .with_location(location_for(&source.definition)?);
    match &source.library {
        Some(dir) => Ok(process.with_repository(Arc::new(load_library(dir)?))),
        None => Ok(process),
    }
}

fn print_report(report: &ValidationReport) {
    println!("{report}");
    println!("{} errors, {} warnings", report.errors().count(), report.warnings().count());
}

fn main() -> ExitCode {
    init_dotenv();
    let cli = Cli::parse();
    let source = match &cli.cmd {
        Commands::Validate { source } | Commands::Run { source, .. } | Commands::Describe { source } => source,
    };
    let mut process = match load_process(source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[opflow] cannot load process: {e}");
            return ExitCode::from(4);
        }
    };

    match cli.cmd {
        Commands::Describe { .. } => {
            print!("{}", describe::describe(&process));
            ExitCode::SUCCESS
        }
        Commands::Validate { .. } => {
            let report = process.validate();
            print_report(&report);
            if report.has_errors() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Commands::Run { force, .. } => {
            let report = process.validate();
            if report.has_errors() && !force {
                print_report(&report);
                return ExitCode::from(2);
            }
            match process.run() {
                Ok(results) => {
                    for (index, slot) in results.slots().iter().enumerate() {
                        let summary = match slot {
                            Some(obj) => json!({ "result": index + 1,
                                                 "kind": obj.kind(),
                                                 "rows": obj.row_count(),
                                                 "members": obj.members().len(),
                                                 "trail": obj.operator_trail(),
                                                 "data": obj.data() }),
                            None => json!({ "result": index + 1, "kind": null }),
                        };
                        println!("{summary}");
                    }
                    ExitCode::SUCCESS
                }
                Err(e) if e.is_stop() => {
                    eprintln!("[opflow] stopped");
                    ExitCode::from(5)
                }
                Err(e) => {
                    eprintln!("[opflow] run failed: {e}");
                    ExitCode::from(5)
                }
            }
        }
    }
}
