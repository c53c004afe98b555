//! # Records
//!
//! Records are JSON objects and collections are JSON arrays. The engine treats
//! record contents as opaque except for the hydration key and its foreign-key
//! spellings. Non-object entries in a collection (most commonly `null`) are
//! placeholders that resolvers never see and that survive in place.

use serde_json::{Map, Value};

/// An ordered mapping from field name to value
pub type Record = Map<String, Value>;

/// An ordered collection of records, possibly containing `null` placeholders
pub type Records = Vec<Value>;

/// What a record holds under a given key.
///
/// Every branch on "is this a map, a sequence, or nil" in the shape codec and
/// the key resolver goes through this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    /// Nested record
    Record(&'a Record),
    /// Sequence of records or scalars
    RecordSeq(&'a [Value]),
    /// Present scalar (string, number, bool)
    Atom(&'a Value),
    /// Present with an explicit `null`
    Null,
    /// Key not present, or the entry is not a record at all
    Absent,
}

impl<'a> Slot<'a> {
    /// Classify `entry[key]`
    pub fn of(entry: &'a Value, key: &str) -> Self {
        match entry.as_object().and_then(|record| record.get(key)) {
            None => Slot::Absent,
            Some(value) => Slot::from_value(value),
        }
    }

    /// Classify a present value
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Null => Slot::Null,
            Value::Array(items) => Slot::RecordSeq(items),
            Value::Object(record) => Slot::Record(record),
            other => Slot::Atom(other),
        }
    }
}

/// True when `entry` is a record that already carries `key` (even as `null`)
pub fn has_key(entry: &Value, key: &str) -> bool {
    entry
        .as_object()
        .map(|record| record.contains_key(key))
        .unwrap_or(false)
}

/// True when `entry` is a record that still needs `key` hydrated
pub fn needs_key(entry: &Value, key: &str) -> bool {
    entry.is_object() && !has_key(entry, key)
}

/// The two recognised foreign-key spellings for a hydration key, underscore first
pub fn foreign_key_fields(key: &str) -> [String; 2] {
    [format!("{key}_id"), format!("{key}-id")]
}

/// The foreign-key value carried by `record` for `key`, if either spelling is present
pub fn foreign_key_value<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    foreign_key_fields(key)
        .iter()
        .find_map(|field| record.get(field.as_str()))
}

/// Canonical text of an identifier, used to match foreign keys to fetched rows
pub fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slot_classification() {
        let entry = json!({
            "seq": [1, 2],
            "obj": {"id": 1},
            "atom": "x",
            "nil": null
        });

        assert!(matches!(Slot::of(&entry, "seq"), Slot::RecordSeq(items) if items.len() == 2));
        assert!(matches!(Slot::of(&entry, "obj"), Slot::Record(_)));
        assert!(matches!(Slot::of(&entry, "atom"), Slot::Atom(_)));
        assert_eq!(Slot::of(&entry, "nil"), Slot::Null);
        assert_eq!(Slot::of(&entry, "missing"), Slot::Absent);
        assert_eq!(Slot::of(&Value::Null, "seq"), Slot::Absent);
    }

    #[test]
    fn test_has_and_needs_key() {
        let entry = json!({"user": null, "name": "a"});
        assert!(has_key(&entry, "user"));
        assert!(!needs_key(&entry, "user"));
        assert!(needs_key(&entry, "posts"));
        assert!(!needs_key(&Value::Null, "posts"));
    }

    #[test]
    fn test_foreign_key_spellings() {
        let underscore = json!({"user_id": 100});
        let dashed = json!({"user-id": 101});
        let neither = json!({"userid": 102});

        assert_eq!(
            foreign_key_value(underscore.as_object().unwrap(), "user"),
            Some(&json!(100))
        );
        assert_eq!(
            foreign_key_value(dashed.as_object().unwrap(), "user"),
            Some(&json!(101))
        );
        assert_eq!(foreign_key_value(neither.as_object().unwrap(), "user"), None);
        assert_eq!(foreign_key_value(underscore.as_object().unwrap(), "User"), None);
    }

    #[test]
    fn test_id_text() {
        assert_eq!(id_text(&json!(100)), "100");
        assert_eq!(id_text(&json!("abc")), "abc");
    }
}
