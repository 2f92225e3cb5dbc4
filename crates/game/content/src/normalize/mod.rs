//! Legacy shape normalization.
//!
//! Authored records come in several historical shapes: ids as numbers or
//! strings, the same concept under several key spellings, dialogue nodes as a
//! sequence or as a keyed map. Everything is folded into the canonical
//! `nexus-core` model here so the engine never branches on shape.
mod dialogue;
mod entities;
mod scene;
mod steps;

pub use dialogue::normalize_dialogue;
pub use entities::{
    normalize_action, normalize_character, normalize_clue, normalize_configs, normalize_media,
    normalize_sector,
};
pub use scene::normalize_scene;
pub use steps::{normalize_step, normalize_steps};

use serde_json::{Map, Value};

/// `true`, `"true"`, `1` and `"1"` are truthy. Everything else is not.
pub fn fuzzy_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_u64() == Some(1) || n.as_f64() == Some(1.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

/// Read-only view over one JSON object with alias-aware accessors.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Record<'a>(pub &'a Map<String, Value>);

impl<'a> Record<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Record)
    }

    /// First non-null value among `keys`.
    pub fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    pub fn object(&self, keys: &[&str]) -> Option<Record<'a>> {
        self.first(keys).and_then(Record::from_value)
    }

    pub fn array(&self, keys: &[&str]) -> Option<&'a Vec<Value>> {
        self.first(keys).and_then(Value::as_array)
    }

    pub fn id(&self, keys: &[&str]) -> Option<u32> {
        self.first(keys).and_then(as_id)
    }

    pub fn text(&self, keys: &[&str]) -> Option<String> {
        self.first(keys).and_then(as_text)
    }

    pub fn number(&self, keys: &[&str]) -> Option<f32> {
        self.first(keys).and_then(as_number)
    }

    pub fn flag(&self, keys: &[&str]) -> bool {
        fuzzy_true(self.first(keys))
    }
}

pub(crate) fn as_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get("id").or_else(|| obj.get("value")).and_then(as_id),
        _ => None,
    }
}

pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn as_number(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| n as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f32| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fuzzy_truth_accepts_the_four_spellings() {
        for v in [json!(true), json!("true"), json!(1), json!("1")] {
            assert!(fuzzy_true(Some(&v)), "{v}");
        }
        for v in [json!(false), json!("yes"), json!(0), json!(null), json!(2)] {
            assert!(!fuzzy_true(Some(&v)), "{v}");
        }
        assert!(!fuzzy_true(None));
    }

    #[test]
    fn record_reads_first_present_alias() {
        let value = json!({ "dialog_id": null, "dialoog_id": "7", "title": 3 });
        let record = Record::from_value(&value).unwrap();
        assert_eq!(record.id(&["dialog_id", "dialoog_id"]), Some(7));
        assert_eq!(record.text(&["title"]), Some("3".into()));
    }
}
