//! # Key Resolver
//!
//! Applies exactly one strategy to one hydration key across a whole collection,
//! performing at most one bulk fetch.
//!
//! Resolution produces a positional patch (one `Option<Value>` per input
//! entry) instead of mutating the collection. The patch is only produced when
//! the strategy fully succeeds, so a failing resolver never leaves a partial
//! write behind, and concurrent keys can resolve against the same snapshot.
//!
//! Entries that are not records (`null` placeholders) and records that already
//! carry the key are never handed to a resolver; their patch slot is `None`.

use crate::error::{HydrationError, HydrationResult};
use crate::query::{QueryCollaborator, RelationTarget};
use crate::record::{foreign_key_value, id_text, needs_key, Record};
use crate::registry::{BatchResolver, ResolverRegistry, SimpleResolver, Strategy};
use crate::shape;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One value per input entry; `None` leaves the entry untouched
pub type KeyPatch = Vec<Option<Value>>;

#[derive(Clone)]
pub struct KeyResolver {
    registry: Arc<ResolverRegistry>,
    query: Arc<dyn QueryCollaborator>,
    fetch_missing_as_null: bool,
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("registry", &self.registry)
            .field("fetch_missing_as_null", &self.fetch_missing_as_null)
            .finish()
    }
}

impl KeyResolver {
    pub fn new(registry: Arc<ResolverRegistry>, query: Arc<dyn QueryCollaborator>) -> Self {
        Self {
            registry,
            query,
            fetch_missing_as_null: true,
        }
    }

    /// Whether a relation id with no matching entity hydrates to `null` (default)
    /// or leaves the key absent
    pub fn with_fetch_missing_as_null(mut self, enabled: bool) -> Self {
        self.fetch_missing_as_null = enabled;
        self
    }

    /// Resolve `key` for every record in `records` that lacks it
    #[instrument(skip(self, records), fields(key = key, records = records.len()))]
    pub async fn resolve(&self, key: &str, records: &[Value]) -> HydrationResult<KeyPatch> {
        let mut patch: KeyPatch = vec![None; records.len()];

        let pending: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, entry)| needs_key(entry, key))
            .map(|(position, _)| position)
            .collect();

        if pending.is_empty() {
            debug!("Every record already carries the key");
            return Ok(patch);
        }

        let strategy = self.registry.strategy_for(key, records);
        debug!(strategy = ?strategy, pending = pending.len(), "Resolving key");

        match strategy {
            Strategy::Relation(target) => {
                self.resolve_relation(key, &target, records, &pending, &mut patch)
                    .await?
            }
            Strategy::Batch(resolver) => {
                resolve_batch(key, resolver.as_ref(), records, &pending, &mut patch).await?
            }
            Strategy::Simple(resolver) => {
                resolve_simple(key, resolver.as_ref(), records, &pending, &mut patch).await?
            }
            Strategy::None => {
                debug!("No strategy registered for key, passing records through");
            }
        }

        Ok(patch)
    }

    /// Resolve and merge in place
    pub async fn apply(&self, key: &str, records: &mut [Value]) -> HydrationResult<()> {
        let patch = self.resolve(key, records).await?;
        shape::merge(records, key, patch);
        Ok(())
    }

    async fn resolve_relation(
        &self,
        key: &str,
        target: &RelationTarget,
        records: &[Value],
        pending: &[usize],
        patch: &mut KeyPatch,
    ) -> HydrationResult<()> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for &position in pending {
            let Some(id) = pending_foreign_key(records, position, key) else {
                continue;
            };
            if !id.is_null() && seen.insert(id_text(id)) {
                ids.push(id.clone());
            }
        }

        let mut by_id: HashMap<String, Value> = HashMap::new();
        if !ids.is_empty() {
            let rows = self.query.fetch_by_ids(target, &ids).await?;
            debug!(
                target = %target,
                requested = ids.len(),
                found = rows.len(),
                "Bulk fetch complete"
            );
            for row in rows {
                if let Some(id) = row.get(&target.primary_key) {
                    by_id.insert(id_text(id), row);
                }
            }
        }

        for &position in pending {
            let Some(id) = pending_foreign_key(records, position, key) else {
                continue;
            };
            patch[position] = if id.is_null() {
                Some(Value::Null)
            } else {
                match by_id.get(&id_text(id)) {
                    Some(entity) => Some(entity.clone()),
                    None if self.fetch_missing_as_null => Some(Value::Null),
                    None => None,
                }
            };
        }
        Ok(())
    }
}

fn pending_record(records: &[Value], position: usize) -> Option<&Record> {
    records.get(position).and_then(Value::as_object)
}

fn pending_foreign_key<'a>(records: &'a [Value], position: usize, key: &str) -> Option<&'a Value> {
    pending_record(records, position).and_then(|record| foreign_key_value(record, key))
}

async fn resolve_batch(
    key: &str,
    resolver: &dyn BatchResolver,
    records: &[Value],
    pending: &[usize],
    patch: &mut KeyPatch,
) -> HydrationResult<()> {
    let input: Vec<Value> = pending.iter().map(|&p| records[p].clone()).collect();
    let output = resolver.resolve_batch(key, input).await?;

    if output.len() != pending.len() {
        return Err(HydrationError::ResolverContract {
            key: key.to_string(),
            reason: format!(
                "batch resolver returned {} records for {} inputs",
                output.len(),
                pending.len()
            ),
        });
    }

    for (&position, resolved) in pending.iter().zip(output) {
        patch[position] = match resolved {
            Value::Object(mut record) => record.remove(key),
            _ => None,
        };
    }
    Ok(())
}

async fn resolve_simple(
    key: &str,
    resolver: &dyn SimpleResolver,
    records: &[Value],
    pending: &[usize],
    patch: &mut KeyPatch,
) -> HydrationResult<()> {
    for &position in pending {
        if let Some(record) = pending_record(records, position) {
            patch[position] = Some(resolver.resolve(key, record).await?);
        }
    }
    Ok(())
}
