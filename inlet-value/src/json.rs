//! Conversions from `serde_json` values, for JSON request bodies.

use crate::{Object, Value};

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // u64 beyond i64::MAX and real floats both land here
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => items.into_iter().collect(),
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Object {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_json_becomes_nested_objects() {
        let value = Value::from(json!({
            "foo": "bar",
            "arr": [1, 2.5, "x"],
            "sub": { "flag": true, "none": null }
        }));
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("foo"), Some(&Value::from("bar")));
        assert_eq!(
            obj.get_path(&["arr", "0"]),
            Some(&Value::Integer(1))
        );
        assert_eq!(obj.get_path(&["arr", "1"]), Some(&Value::Float(2.5)));
        assert_eq!(obj.get_path(&["sub", "flag"]), Some(&Value::Bool(true)));
        assert_eq!(obj.get_path(&["sub", "none"]), Some(&Value::Null));
    }
}
