//! JSON canónico: claves de objetos ordenadas, sin espacios.
//!
//! Se usa para calcular hashes estables de definiciones de procesos y de
//! reportes de validación.

use serde_json::Value;

pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        // Escalares: la forma compacta de serde_json ya es canónica.
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted_at_every_level() {
        let a = json!({"b": 1, "a": [true, null, {"z": "x", "y": 2.5}]});
        assert_eq!(to_canonical_json(&a), r#"{"a":[true,null,{"y":2.5,"z":"x"}],"b":1}"#);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut one = serde_json::Map::new();
        one.insert("k1".into(), json!(1));
        one.insert("k2".into(), json!("dos"));
        let mut two = serde_json::Map::new();
        two.insert("k2".into(), json!("dos"));
        two.insert("k1".into(), json!(1));
        assert_eq!(to_canonical_json(&Value::Object(one)), to_canonical_json(&Value::Object(two)));
    }
}
