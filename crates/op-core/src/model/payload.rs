//! Objetos de datos que viajan por los puertos durante la ejecución.
//!
//! Un `IOObject` es neutral como el `Artifact` del motor: `data` es JSON y el
//! motor no interpreta su semántica salvo para tablas (filas en un array) y
//! colecciones (resultados acumulados por los bucles). Cada `deliver` exitoso
//! desde un puerto de operador añade una entrada al historial de procedencia.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TABLE_KIND: &str = "table";
pub const COLLECTION_KIND: &str = "collection";

/// Paso de un objeto por un puerto de salida de un operador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub operator: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IOObject {
    kind: String,
    data: Value,
    #[serde(default)]
    members: Vec<IOObject>,
    #[serde(default)]
    history: Vec<ProvenanceEntry>,
}

impl IOObject {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self { kind: kind.into(),
               data,
               members: Vec::new(),
               history: Vec::new() }
    }

    /// Tabla: una fila por elemento (objetos JSON atributo -> valor).
    pub fn table(rows: Vec<Value>) -> Self {
        Self::new(TABLE_KIND, Value::Array(rows))
    }

    /// Colección ordenada de objetos (resultados de un bucle).
    pub fn collection(members: Vec<IOObject>) -> Self {
        let data = Value::Array(members.iter().map(|m| m.data.clone()).collect());
        Self { kind: COLLECTION_KIND.to_string(),
               data,
               members,
               history: Vec::new() }
    }

    /// Nuevo objeto del mismo tipo que conserva el historial de éste.
    pub fn derive(&self, data: Value) -> Self {
        Self { kind: self.kind.clone(),
               data,
               members: Vec::new(),
               history: self.history.clone() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn members(&self) -> &[IOObject] {
        &self.members
    }

    pub fn history(&self) -> &[ProvenanceEntry] {
        &self.history
    }

    /// Operadores por los que pasó el objeto, en orden.
    pub fn operator_trail(&self) -> Vec<&str> {
        self.history.iter().map(|h| h.operator.as_str()).collect()
    }

    pub fn is_table(&self) -> bool {
        self.kind == TABLE_KIND
    }

    pub fn rows(&self) -> &[Value] {
        match &self.data {
            Value::Array(rows) if self.is_table() => rows.as_slice(),
            _ => &[],
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        match &self.data {
            Value::Array(rows) if self.is_table() => Some(rows.len()),
            _ => None,
        }
    }

    pub(crate) fn append_history(&mut self, entry: ProvenanceEntry) {
        self.history.push(entry);
    }
}

/// Secuencia ordenada de resultados. Inmutable una vez entregada: las
/// variantes se construyen con `appended`/`from_objects`, nunca in situ.
/// Una posición vacía representa "sin valor en esta ronda".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IOContainer {
    objects: Vec<Option<Arc<IOObject>>>,
}

impl IOContainer {
    pub fn new(objects: Vec<Option<Arc<IOObject>>>) -> Self {
        Self { objects }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_objects<I: IntoIterator<Item = IOObject>>(objects: I) -> Self {
        Self { objects: objects.into_iter().map(|o| Some(Arc::new(o))).collect() }
    }

    pub fn appended(&self, object: IOObject) -> Self {
        let mut objects = self.objects.clone();
        objects.push(Some(Arc::new(object)));
        Self { objects }
    }

    pub fn get(&self, index: usize) -> Option<&Arc<IOObject>> {
        self.objects.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn slots(&self) -> &[Option<Arc<IOObject>>] {
        &self.objects
    }

    /// Objetos presentes, saltando las posiciones vacías.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IOObject>> {
        self.objects.iter().flatten()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Arc<IOObject>> + 'a {
        self.iter().filter(move |o| o.kind() == kind)
    }
}
