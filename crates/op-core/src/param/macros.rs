//! Tabla de macros del proceso (`%{nombre}`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const PROCESS_NAME_MACRO: &str = "process_name";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTable {
    values: IndexMap<String, String>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sustituye cada `%{nombre}` definido. Las referencias desconocidas o
    /// sin cerrar se dejan tal cual.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.get(name) {
                        Some(v) => out.push_str(v),
                        None => {
                            out.push_str("%{");
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_macros_only() {
        let mut m = MacroTable::new();
        m.set("n", "3");
        m.set("file", "data.csv");
        assert_eq!(m.substitute("%{file} x%{n} %{missing} %{open"), "data.csv x3 %{missing} %{open");
        assert_eq!(m.substitute("plain"), "plain");
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut m = MacroTable::new();
        m.set("a", "1");
        m.set("b", "2");
        m.set("a", "9");
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![("a", "9"), ("b", "2")]);
    }
}
