//! # Resolver Traits
//!
//! Batch and simple resolvers are trait objects so they can hold their own
//! state (pools, clients, caches). Plain async closures are adapted with
//! [`batch_fn`] and [`simple_fn`].
//!
//! ```rust
//! use tasker_hydration::registry::{batch_fn, simple_fn};
//! use serde_json::{json, Value};
//!
//! let word_count = simple_fn(|record| async move {
//!     let text = record.get("body").and_then(Value::as_str).unwrap_or_default();
//!     Ok(json!(text.split_whitespace().count()))
//! });
//!
//! let ranks = batch_fn(|records: Vec<Value>| async move {
//!     Ok(records
//!         .into_iter()
//!         .enumerate()
//!         .map(|(rank, mut record)| {
//!             record["rank"] = json!(rank);
//!             record
//!         })
//!         .collect())
//! });
//! ```

use crate::error::HydrationResult;
use crate::record::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Hydrates a whole collection in one call.
///
/// The returned collection must have the same length and order as `records`,
/// each record carrying its value under `key`. A returned record without
/// `key` leaves the corresponding input record unhydrated.
#[async_trait]
pub trait BatchResolver: Send + Sync {
    async fn resolve_batch(&self, key: &str, records: Vec<Value>) -> HydrationResult<Vec<Value>>;
}

/// Hydrates one record at a time. The returned value is attached under the key.
#[async_trait]
pub trait SimpleResolver: Send + Sync {
    async fn resolve(&self, key: &str, record: &Record) -> HydrationResult<Value>;
}

/// Adapter from an async closure to [`BatchResolver`]
pub struct BatchFn<F>(F);

/// Adapter from an async closure to [`SimpleResolver`]
pub struct SimpleFn<F>(F);

pub fn batch_fn<F, Fut>(f: F) -> BatchFn<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HydrationResult<Vec<Value>>> + Send,
{
    BatchFn(f)
}

pub fn simple_fn<F, Fut>(f: F) -> SimpleFn<F>
where
    F: Fn(Record) -> Fut + Send + Sync,
    Fut: Future<Output = HydrationResult<Value>> + Send,
{
    SimpleFn(f)
}

#[async_trait]
impl<F, Fut> BatchResolver for BatchFn<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HydrationResult<Vec<Value>>> + Send,
{
    async fn resolve_batch(&self, _key: &str, records: Vec<Value>) -> HydrationResult<Vec<Value>> {
        (self.0)(records).await
    }
}

#[async_trait]
impl<F, Fut> SimpleResolver for SimpleFn<F>
where
    F: Fn(Record) -> Fut + Send + Sync,
    Fut: Future<Output = HydrationResult<Value>> + Send,
{
    async fn resolve(&self, _key: &str, record: &Record) -> HydrationResult<Value> {
        (self.0)(record.clone()).await
    }
}

impl<F> fmt::Debug for BatchFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BatchFn(...)")
    }
}

impl<F> fmt::Debug for SimpleFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SimpleFn(...)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_simple_fn_adapter() {
        let resolver = simple_fn(|record| async move { Ok(json!(record.len())) });
        let record = json!({"a": 1, "b": 2});
        let value = resolver
            .resolve("field_count", record.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(value, json!(2));
    }

    #[tokio::test]
    async fn test_batch_fn_adapter() {
        let resolver = batch_fn(|records: Vec<Value>| async move {
            Ok(records
                .into_iter()
                .map(|mut r| {
                    r["seen"] = json!(true);
                    r
                })
                .collect())
        });
        let out = resolver
            .resolve_batch("seen", vec![json!({"id": 1}), json!({"id": 2})])
            .await
            .unwrap();
        assert_eq!(out, vec![json!({"id": 1, "seen": true}), json!({"id": 2, "seen": true})]);
    }
}
