//! # Hydrator
//!
//! The public entry point. Validates specs, normalises the input shape, drives
//! the [`KeyResolver`] over each top-level spec and recurses into nested specs
//! through the shape codec.
//!
//! ## Nested Specs
//!
//! ```text
//! [A{inner: [a1, a2, a3]}, B{inner: [b1]}]   hydrate ["inner", "leaf"]
//!
//!   1. resolve "inner" on [A, B]
//!   2. flatten by "inner"       ──► [a1, a2, a3, b1]   descriptor [Count(3), Count(1)]
//!   3. hydrate "leaf" on the flat collection (one batch for all four)
//!   4. restructure              ──► A{inner: [a1', a2', a3']}, B{inner: [b1']}
//! ```
//!
//! ## Ordering
//!
//! Top-level specs run left to right and later specs see earlier results.
//! With `concurrent_keys` enabled and all head keys distinct, every spec
//! resolves against the same snapshot and patches are merged in spec order, so
//! a later spec no longer sees values written by an earlier one.

use crate::config::HydrationConfig;
use crate::error::HydrationResult;
use crate::key_resolver::{KeyPatch, KeyResolver};
use crate::query::QueryCollaborator;
use crate::record::Record;
use crate::registry::ResolverRegistry;
use crate::shape;
use crate::spec::HydrationSpec;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Hydrator {
    key_resolver: KeyResolver,
    config: HydrationConfig,
}

impl Hydrator {
    pub fn new(registry: Arc<ResolverRegistry>, query: Arc<dyn QueryCollaborator>) -> Self {
        Self::with_config(registry, query, HydrationConfig::default())
    }

    pub fn with_config(
        registry: Arc<ResolverRegistry>,
        query: Arc<dyn QueryCollaborator>,
        config: HydrationConfig,
    ) -> Self {
        let key_resolver = KeyResolver::new(registry, query)
            .with_fetch_missing_as_null(config.fetch_missing_as_null);
        Self {
            key_resolver,
            config,
        }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Hydrate a single record (JSON object) or a collection (JSON array).
    ///
    /// The result has the same shape as the input. `null` and other scalars
    /// are returned unchanged. Every spec is validated before any resolver runs.
    #[instrument(skip_all, fields(hydration_id = %Uuid::new_v4(), specs = specs.len()))]
    pub async fn hydrate(&self, input: Value, specs: &[HydrationSpec]) -> HydrationResult<Value> {
        self.validate(specs)?;
        let started = Instant::now();

        let output = match input {
            Value::Object(record) => {
                let mut records = vec![Value::Object(record)];
                self.hydrate_collection(&mut records, specs).await?;
                records.into_iter().next().unwrap_or(Value::Null)
            }
            Value::Array(mut records) => {
                self.hydrate_collection(&mut records, specs).await?;
                Value::Array(records)
            }
            other => {
                debug!("Input is neither a record nor a collection, returning unchanged");
                other
            }
        };

        debug!(elapsed_us = started.elapsed().as_micros() as u64, "Hydration complete");
        Ok(output)
    }

    /// Hydrate a collection of records
    pub async fn hydrate_records(
        &self,
        mut records: Vec<Value>,
        specs: &[HydrationSpec],
    ) -> HydrationResult<Vec<Value>> {
        self.hydrate_in_place(&mut records, specs).await?;
        Ok(records)
    }

    /// Hydrate `records` in place.
    ///
    /// On error, keys merged before the failure stay merged and the failing
    /// key is not written to any record.
    pub async fn hydrate_in_place(
        &self,
        records: &mut Vec<Value>,
        specs: &[HydrationSpec],
    ) -> HydrationResult<()> {
        self.validate(specs)?;
        self.hydrate_collection(records, specs).await
    }

    /// Hydrate one record
    pub async fn hydrate_record(
        &self,
        record: Record,
        specs: &[HydrationSpec],
    ) -> HydrationResult<Record> {
        self.validate(specs)?;
        let mut records = vec![Value::Object(record)];
        self.hydrate_collection(&mut records, specs).await?;
        match records.pop() {
            Some(Value::Object(record)) => Ok(record),
            _ => Ok(Record::new()),
        }
    }

    /// Parse raw JSON specs (`"user"`, `["posts", "author"]`), then hydrate
    pub async fn hydrate_json(&self, input: Value, raw_specs: &[Value]) -> HydrationResult<Value> {
        let specs = raw_specs
            .iter()
            .map(HydrationSpec::from_json)
            .collect::<HydrationResult<Vec<_>>>()?;
        self.hydrate(input, &specs).await
    }

    fn validate(&self, specs: &[HydrationSpec]) -> HydrationResult<()> {
        specs
            .iter()
            .try_for_each(|spec| spec.validate(self.config.max_spec_depth))
    }

    fn hydrate_collection<'a>(
        &'a self,
        records: &'a mut Vec<Value>,
        specs: &'a [HydrationSpec],
    ) -> BoxFuture<'a, HydrationResult<()>> {
        async move {
            if records.is_empty() || specs.is_empty() {
                return Ok(());
            }

            if self.config.concurrent_keys && specs.len() > 1 && distinct_heads(specs) {
                return self.hydrate_concurrently(records, specs).await;
            }

            for spec in specs {
                let patch = self.resolve_spec(records, spec).await?;
                shape::merge(records, spec.head(), patch);
            }
            Ok(())
        }
        .boxed()
    }

    async fn hydrate_concurrently(
        &self,
        records: &mut [Value],
        specs: &[HydrationSpec],
    ) -> HydrationResult<()> {
        let snapshot: &[Value] = records;
        let results = join_all(specs.iter().map(|spec| self.resolve_spec(snapshot, spec))).await;

        let mut first_error = None;
        for (spec, result) in specs.iter().zip(results) {
            match result {
                Ok(patch) => shape::merge(records, spec.head(), patch),
                Err(error) => {
                    warn!(key = spec.head(), error = %error, "Concurrent key resolution failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Compute the patch one top-level spec writes under its head key
    async fn resolve_spec(
        &self,
        records: &[Value],
        spec: &HydrationSpec,
    ) -> HydrationResult<KeyPatch> {
        match spec {
            HydrationSpec::Key(key) => self.key_resolver.resolve(key, records).await,
            HydrationSpec::Nested { key, inner } => {
                let resolved = self.key_resolver.resolve(key, records).await?;

                // Only the head key travels through the recursion
                let mut shells: Vec<Value> = records
                    .iter()
                    .zip(resolved)
                    .map(|(entry, value)| {
                        let Some(record) = entry.as_object() else {
                            return Value::Null;
                        };
                        let mut shell = Record::new();
                        if let Some(value) = value.or_else(|| record.get(key).cloned()) {
                            shell.insert(key.clone(), value);
                        }
                        Value::Object(shell)
                    })
                    .collect();

                shape::apply_by_key(&mut shells, key, |flat| async move {
                    let mut inner_records = flat;
                    self.hydrate_collection(&mut inner_records, inner).await?;
                    Ok(inner_records)
                })
                .await?;

                Ok(shells
                    .into_iter()
                    .map(|shell| match shell {
                        Value::Object(mut record) => record.remove(key.as_str()),
                        _ => None,
                    })
                    .collect())
            }
        }
    }
}

fn distinct_heads(specs: &[HydrationSpec]) -> bool {
    let mut heads = HashSet::new();
    specs.iter().all(|spec| heads.insert(spec.head()))
}
