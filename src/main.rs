use op_core::config::init_dotenv;
use op_core::{LogCrateSink, ProcessConfig};
use opflow::demo_process;
use std::sync::Arc;

fn main() {
    init_dotenv();
    println!("== opflow demo ==");
    let process = match demo_process() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("cannot build demo process: {e}");
            std::process::exit(1);
        }
    };
    let mut process = process.with_config(ProcessConfig::from_env())
                             .with_log_sink(Arc::new(LogCrateSink::new()));

    let report = process.validate();
    println!("validation: {report}");
    if report.has_errors() {
        std::process::exit(2);
    }

    match process.run() {
        Ok(results) => {
            for (index, slot) in results.slots().iter().enumerate() {
                match slot {
                    Some(obj) => println!("result {}: {} {}", index + 1, obj.kind(), obj.data()),
                    None => println!("result {}: <no value>", index + 1),
                }
            }
            if let Some(message) = process.services().macros().get("exception") {
                println!("contained: {message}");
            }
        }
        Err(e) => {
            eprintln!("run failed: {e}");
            std::process::exit(5);
        }
    }
}
