//! Sumidero de log del proceso.
//!
//! Append-only como un almacén de eventos: cada registro recibe número de
//! secuencia y marca de tiempo al añadirse. La implementación en memoria
//! sirve para tests y para la CLI; `LogCrateSink` reenvía a la fachada `log`.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::Level;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub seq: u64,
    pub run_id: Uuid,
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Operador que emitió el mensaje; `None` para mensajes del proceso.
    pub operator: Option<String>,
    pub message: String,
}

pub trait LogSink: Send + Sync {
    /// Añade un mensaje y devuelve el registro completo (con seq y ts).
    fn append(&self, run_id: Uuid, level: Level, operator: Option<&str>, message: &str) -> LogRecord;

    /// Registros retenidos, en orden de `seq`. Un sumidero que sólo reenvía
    /// puede no retener nada.
    fn records(&self) -> Vec<LogRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryLogSink {
    inner: Mutex<Vec<LogRecord>>,
}

impl InMemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogSink for InMemoryLogSink {
    fn append(&self, run_id: Uuid, level: Level, operator: Option<&str>, message: &str) -> LogRecord {
        let mut records = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let record = LogRecord { seq: records.len() as u64,
                                 run_id,
                                 ts: Utc::now(),
                                 level,
                                 operator: operator.map(str::to_string),
                                 message: message.to_string() };
        records.push(record.clone());
        record
    }

    fn records(&self) -> Vec<LogRecord> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Reenvía a la fachada `log` con target `opflow`.
#[derive(Debug, Default)]
pub struct LogCrateSink {
    seq: std::sync::atomic::AtomicU64,
}

impl LogCrateSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogSink for LogCrateSink {
    fn append(&self, run_id: Uuid, level: Level, operator: Option<&str>, message: &str) -> LogRecord {
        let seq = self.seq.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        match operator {
            Some(op) => log::log!(target: "opflow", level, "[{op}] {message}"),
            None => log::log!(target: "opflow", level, "{message}"),
        }
        LogRecord { seq,
                    run_id,
                    ts: Utc::now(),
                    level,
                    operator: operator.map(str::to_string),
                    message: message.to_string() }
    }

    fn records(&self) -> Vec<LogRecord> {
        Vec::new()
    }
}
