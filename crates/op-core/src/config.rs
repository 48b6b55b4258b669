//! Configuración del proceso desde variables de entorno.
//!
//! `OPFLOW_LOG_LEVEL`, `OPFLOW_MAX_LOOP_ITERATIONS` y
//! `OPFLOW_LOAD_DURING_VALIDATION`. El `.env` se carga una sola vez.

use std::env;

use dotenvy::dotenv;
use log::LevelFilter;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_LOG_LEVEL: &str = "OPFLOW_LOG_LEVEL";
pub const ENV_MAX_LOOP_ITERATIONS: &str = "OPFLOW_MAX_LOOP_ITERATIONS";
pub const ENV_LOAD_DURING_VALIDATION: &str = "OPFLOW_LOAD_DURING_VALIDATION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Nivel mínimo que llega al sumidero de log.
    pub log_level: LevelFilter,
    /// Tope de iteraciones de un bucle; `None` = sin tope.
    pub max_loop_iterations: Option<usize>,
    /// Permite cargar procesos embebidos durante la validación.
    pub load_during_validation: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self { log_level: LevelFilter::Info,
               max_loop_iterations: None,
               load_during_validation: false }
    }
}

impl ProcessConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    /// Valores ilegibles caen al default.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let log_level = lookup(ENV_LOG_LEVEL).and_then(|v| v.trim().parse().ok())
                                             .unwrap_or(defaults.log_level);
        let max_loop_iterations = lookup(ENV_MAX_LOOP_ITERATIONS).and_then(|v| v.trim().parse().ok());
        let load_during_validation = lookup(ENV_LOAD_DURING_VALIDATION).map(|v| parse_bool(&v))
                                                                       .unwrap_or(defaults.load_during_validation);
        Self { log_level,
               max_loop_iterations,
               load_during_validation }
    }

    #[must_use]
    pub fn with_max_loop_iterations(mut self, limit: usize) -> Self {
        self.max_loop_iterations = Some(limit);
        self
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [(ENV_LOG_LEVEL, "debug"),
                                         (ENV_MAX_LOOP_ITERATIONS, "50"),
                                         (ENV_LOAD_DURING_VALIDATION, "yes")].into_iter()
                                                                             .collect();
        let cfg = ProcessConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert_eq!(cfg.max_loop_iterations, Some(50));
        assert!(cfg.load_during_validation);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let cfg = ProcessConfig::from_lookup(|k| match k {
                                                 ENV_LOG_LEVEL => Some("loud".into()),
                                                 ENV_MAX_LOOP_ITERATIONS => Some("-3".into()),
                                                 _ => None,
                                             });
        assert_eq!(cfg, ProcessConfig::default());
    }
}
