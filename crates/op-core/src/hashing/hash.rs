use serde_json::Value;

use super::to_canonical_json;

/// Digest blake3 en hex de unos bytes cualesquiera.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hash del JSON canónico de `value`: dos valores iguales salvo el orden
/// de sus claves dan el mismo resultado.
pub fn hash_value(value: &Value) -> String {
    hash_bytes(to_canonical_json(value).as_bytes())
}
