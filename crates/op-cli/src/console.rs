//! Sumidero de log que escribe en stderr y además retiene los registros.

use log::Level;
use op_core::{InMemoryLogSink, LogRecord, LogSink};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ConsoleLogSink {
    inner: InMemoryLogSink,
}

impl ConsoleLogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn format_record(record: &LogRecord) -> String {
    let ts = record.ts.format("%H:%M:%S%.3f");
    match &record.operator {
        Some(op) => format!("{ts} {:<5} [{op}] {}", record.level, record.message),
        None => format!("{ts} {:<5} {}", record.level, record.message),
    }
}

impl LogSink for ConsoleLogSink {
    fn append(&self, run_id: Uuid, level: Level, operator: Option<&str>, message: &str) -> LogRecord {
        let record = self.inner.append(run_id, level, operator, message);
        eprintln!("{}", format_record(&record));
        record
    }

    fn records(&self) -> Vec<LogRecord> {
        self.inner.records()
    }
}
