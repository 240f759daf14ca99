//! Field values of fetched records
//!
//! Records arrive as loosely-typed JSON. They are converted once, on receipt,
//! into [`Value`], a closed set of shapes the literal renderer matches on
//! exhaustively.

use std::fmt;

/// A field value as received from the record source
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Number(Number),
    Bool(bool),
    List(Vec<Value>),
    /// Entries keep the order in which the decoder produced them
    Map(Vec<(String, Value)>),
}

/// A numeric value kept in its source textual form so it renders verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number(String);

impl Number {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<serde_json::Number> for Number {
    fn from(n: serde_json::Number) -> Self {
        Number(n.to_string())
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an entry of a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// The referenced id when this value is a reference object (`{id, ...}`)
    pub fn reference_id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    /// Whether this is a map carrying an `id` entry, whatever its type
    pub fn has_id_key(&self) -> bool {
        self.get("id").is_some()
    }

    /// Collect the ids of every reference object reachable from this value.
    ///
    /// A reference object contributes its own id only; the rest of its
    /// entries never reach the output, so they are not walked.
    pub fn collect_reference_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Map(entries) => {
                if let Some(id) = self.reference_id() {
                    out.push(id);
                } else if !self.has_id_key() {
                    for (_, v) in entries {
                        v.collect_reference_ids(out);
                    }
                }
            }
            Value::List(items) => {
                for item in items {
                    item.collect_reference_ids(out);
                }
            }
            Value::Null | Value::Str(_) | Value::Number(_) | Value::Bool(_) => {}
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.into()),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        let value = Value::from(json!({
            "s": "text",
            "n": 42,
            "f": 3.5,
            "b": true,
            "z": null,
            "l": [1, "two"],
        }));

        assert_eq!(value.get("s"), Some(&Value::Str("text".into())));
        assert_eq!(
            value.get("n").map(|v| matches!(v, Value::Number(n) if n.as_str() == "42")),
            Some(true)
        );
        assert_eq!(
            value.get("f").map(|v| matches!(v, Value::Number(n) if n.as_str() == "3.5")),
            Some(true)
        );
        assert_eq!(value.get("b"), Some(&Value::Bool(true)));
        assert!(value.get("z").is_some_and(Value::is_null));
        assert!(matches!(value.get("l"), Some(Value::List(items)) if items.len() == 2));
    }

    #[test]
    fn test_numbers_keep_source_text() {
        let raw: serde_json::Value =
            serde_json::from_str(r#"{"big": 12345678901234567890123, "exp": 1e3, "frac": 1.50}"#).unwrap();
        let value = Value::from(raw);

        let text = |key: &str| match value.get(key) {
            Some(Value::Number(n)) => n.as_str().to_string(),
            other => panic!("{key}: {other:?}"),
        };
        assert_eq!(text("big"), "12345678901234567890123");
        assert_eq!(text("exp"), "1e3");
        assert_eq!(text("frac"), "1.50");
    }

    #[test]
    fn test_reference_id() {
        let reference = Value::from(json!({"id": "w2", "name": "Other"}));
        assert_eq!(reference.reference_id(), Some("w2"));

        let not_string = Value::from(json!({"id": 7}));
        assert_eq!(not_string.reference_id(), None);
        assert!(not_string.has_id_key());

        assert_eq!(Value::Str("w2".into()).reference_id(), None);
    }

    #[test]
    fn test_collect_reference_ids_walks_lists_and_plain_maps() {
        let value = Value::from(json!([
            {"id": "a", "owner": {"id": "hidden"}},
            {"meta": {"inner": {"id": "b"}}},
            "c",
            [{"id": "d"}]
        ]));

        let mut ids = Vec::new();
        value.collect_reference_ids(&mut ids);
        assert_eq!(ids, vec!["a", "b", "d"]);
    }
}
