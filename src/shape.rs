//! # Shape Codec
//!
//! Flattens a collection by a key into one uniform sequence and restructures a
//! flat sequence back into the original nesting.
//!
//! ## Round Trip
//!
//! ```text
//! records              describe        flatten
//! {posts: [a, b, c]}   Count(3)        a b c
//! {posts: d}           Atom            d
//! {posts: null}        Nil
//! {}                   Absent
//!                         │               │
//!                         └──── restructure ────► [a, b, c], d, null, <absent>
//! ```
//!
//! The descriptor is captured before the flat sequence is handed to a
//! processing function, so the function may replace elements freely as long as
//! it returns the same number of them.

use crate::error::{HydrationError, HydrationResult};
use crate::record::Slot;
use serde_json::Value;
use std::future::Future;
use tracing::trace;

/// Per-record shape of the value at a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTag {
    /// Sequence of `n` elements
    Count(usize),
    /// Present, non-sequential, non-nil
    Atom,
    /// Present with value `null`
    Nil,
    /// Key not present (or the entry is not a record)
    Absent,
}

impl ShapeTag {
    /// Number of flat elements this tag contributes
    pub fn width(&self) -> usize {
        match self {
            ShapeTag::Count(n) => *n,
            ShapeTag::Atom => 1,
            ShapeTag::Nil | ShapeTag::Absent => 0,
        }
    }
}

impl From<Slot<'_>> for ShapeTag {
    fn from(slot: Slot<'_>) -> Self {
        match slot {
            Slot::RecordSeq(items) => ShapeTag::Count(items.len()),
            Slot::Record(_) | Slot::Atom(_) => ShapeTag::Atom,
            Slot::Null => ShapeTag::Nil,
            Slot::Absent => ShapeTag::Absent,
        }
    }
}

/// Ordered per-record tags for one key over one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDescriptor {
    key: String,
    tags: Vec<ShapeTag>,
}

impl ShapeDescriptor {
    /// Capture the shape of `records` at `key`
    pub fn describe(records: &[Value], key: &str) -> Self {
        Self {
            key: key.to_string(),
            tags: records
                .iter()
                .map(|entry| ShapeTag::from(Slot::of(entry, key)))
                .collect(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tags(&self) -> &[ShapeTag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Length of the flat sequence this descriptor was captured alongside
    pub fn flat_len(&self) -> usize {
        self.tags.iter().map(ShapeTag::width).sum()
    }
}

/// Flatten the values at `key` into one ordered sequence.
///
/// Sequences contribute their elements in order, present scalars and records
/// contribute themselves, `null` and absent values contribute nothing.
pub fn flatten(records: &[Value], key: &str) -> Vec<Value> {
    let mut flat = Vec::new();
    for entry in records {
        match Slot::of(entry, key) {
            Slot::RecordSeq(items) => flat.extend(items.iter().cloned()),
            Slot::Record(_) | Slot::Atom(_) => {
                if let Some(value) = entry.get(key) {
                    flat.push(value.clone());
                }
            }
            Slot::Null | Slot::Absent => {}
        }
    }
    flat
}

/// Rebuild one value per original record from a flat sequence.
///
/// `None` marks an absent key; `Some(Value::Null)` marks an explicit null.
/// A flat sequence whose length differs from the descriptor's is a
/// [`HydrationError::ShapeMismatch`].
pub fn restructure(
    flat: Vec<Value>,
    descriptor: &ShapeDescriptor,
) -> HydrationResult<Vec<Option<Value>>> {
    let expected = descriptor.flat_len();
    if flat.len() != expected {
        return Err(HydrationError::ShapeMismatch {
            key: descriptor.key.clone(),
            expected,
            actual: flat.len(),
        });
    }

    let mut elements = flat.into_iter();
    let restored = descriptor
        .tags
        .iter()
        .map(|tag| match tag {
            ShapeTag::Count(n) => Some(Value::Array(elements.by_ref().take(*n).collect())),
            ShapeTag::Atom => elements.next(),
            ShapeTag::Nil => Some(Value::Null),
            ShapeTag::Absent => None,
        })
        .collect();

    Ok(restored)
}

/// Write a positional patch into `records` under `key`.
///
/// `None` entries and non-record entries are left untouched.
pub fn merge(records: &mut [Value], key: &str, patch: Vec<Option<Value>>) {
    for (entry, value) in records.iter_mut().zip(patch) {
        if let (Some(record), Some(value)) = (entry.as_object_mut(), value) {
            record.insert(key.to_string(), value);
        }
    }
}

/// Flatten `records` at `key`, run `f` once on the whole flat sequence,
/// restructure the result and merge it back by position.
///
/// `records` is only modified when `f` succeeds and its output has the same
/// length as its input.
pub async fn apply_by_key<F, Fut>(records: &mut [Value], key: &str, f: F) -> HydrationResult<()>
where
    F: FnOnce(Vec<Value>) -> Fut,
    Fut: Future<Output = HydrationResult<Vec<Value>>>,
{
    let descriptor = ShapeDescriptor::describe(records, key);
    let flat = flatten(records, key);
    trace!(key = key, records = records.len(), flat = flat.len(), "Flattened collection");

    let processed = f(flat).await?;
    let patch = restructure(processed, &descriptor)?;
    merge(records, key, patch);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mixed() -> Vec<Value> {
        vec![
            json!({"id": 1, "items": [{"n": 1}, {"n": 2}, {"n": 3}]}),
            json!({"id": 2, "items": {"n": 4}}),
            json!({"id": 3, "items": null}),
            json!({"id": 4}),
            Value::Null,
            json!({"id": 5, "items": []}),
            json!({"id": 6, "items": [{"n": 5}]}),
        ]
    }

    #[test]
    fn test_describe_tags() {
        let descriptor = ShapeDescriptor::describe(&mixed(), "items");
        assert_eq!(
            descriptor.tags(),
            &[
                ShapeTag::Count(3),
                ShapeTag::Atom,
                ShapeTag::Nil,
                ShapeTag::Absent,
                ShapeTag::Absent,
                ShapeTag::Count(0),
                ShapeTag::Count(1),
            ]
        );
        assert_eq!(descriptor.flat_len(), 5);
        assert_eq!(descriptor.key(), "items");
    }

    #[test]
    fn test_flatten_order() {
        let flat = flatten(&mixed(), "items");
        let ns: Vec<_> = flat.iter().map(|v| v["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_restructure_round_trip() {
        let records = mixed();
        let descriptor = ShapeDescriptor::describe(&records, "items");
        let restored = restructure(flatten(&records, "items"), &descriptor).unwrap();

        for (entry, value) in records.iter().zip(restored) {
            assert_eq!(entry.get("items").cloned(), value);
        }
    }

    #[test]
    fn test_restructure_length_mismatch() {
        let records = mixed();
        let descriptor = ShapeDescriptor::describe(&records, "items");
        let mut flat = flatten(&records, "items");
        flat.pop();

        let err = restructure(flat, &descriptor).unwrap_err();
        assert_eq!(
            err,
            HydrationError::ShapeMismatch {
                key: "items".to_string(),
                expected: 5,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_merge_skips_absent_and_placeholders() {
        let mut records = vec![json!({"id": 1}), Value::Null, json!({"id": 3})];
        merge(
            &mut records,
            "tag",
            vec![Some(json!("a")), Some(json!("b")), None],
        );
        assert_eq!(records, vec![json!({"id": 1, "tag": "a"}), Value::Null, json!({"id": 3})]);
    }

    #[tokio::test]
    async fn test_apply_by_key_single_call() {
        let mut records = mixed();
        let mut calls = 0;

        apply_by_key(&mut records, "items", |flat| {
            calls += 1;
            let doubled = flat
                .into_iter()
                .map(|mut v| {
                    let n = v["n"].as_i64().unwrap_or_default();
                    v["n"] = json!(n * 10);
                    v
                })
                .collect();
            async move { Ok(doubled) }
        })
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(records[0]["items"], json!([{"n": 10}, {"n": 20}, {"n": 30}]));
        assert_eq!(records[1]["items"], json!({"n": 40}));
        assert_eq!(records[2]["items"], Value::Null);
        assert!(records[3].get("items").is_none());
        assert_eq!(records[4], Value::Null);
        assert_eq!(records[5]["items"], json!([]));
        assert_eq!(records[6]["items"], json!([{"n": 50}]));
    }

    #[tokio::test]
    async fn test_apply_by_key_leaves_records_on_error() {
        let mut records = mixed();
        let before = records.clone();

        let result = apply_by_key(&mut records, "items", |_flat| async {
            Err(HydrationError::resolver("items", "boom"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(records, before);
    }
}
