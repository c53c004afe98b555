//! # Resolver Registry
//!
//! Holds the three resolver registrations per hydration key and answers which
//! strategy applies to a key for a given collection.
//!
//! ## Priority
//!
//! Strategies are checked in a fixed order, first match wins:
//!
//! ```text
//! 1. Relation  registered AND every record lacking the key carries
//!              `{key}_id` or `{key}-id`
//! 2. Batch     registered
//! 3. Simple    registered
//! 4. None      collection passes through unchanged
//! ```
//!
//! ## Lifecycle
//!
//! Populated at process start, read-only while hydrating. Registration for a
//! key and kind that is already registered is rejected with
//! [`HydrationError::DuplicateRegistration`]. [`ResolverRegistry::reset`]
//! drops every registration of every kind so an interactive session can
//! re-register from scratch.

use super::resolvers::{BatchResolver, SimpleResolver};
use crate::error::{HydrationError, HydrationResult};
use crate::query::RelationTarget;
use crate::record::{foreign_key_value, needs_key};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// The three registration kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Relation,
    Batch,
    Simple,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverKind::Relation => write!(f, "relation"),
            ResolverKind::Batch => write!(f, "batch"),
            ResolverKind::Simple => write!(f, "simple"),
        }
    }
}

/// The strategy chosen for one key over one collection
#[derive(Clone)]
pub enum Strategy {
    Relation(RelationTarget),
    Batch(Arc<dyn BatchResolver>),
    Simple(Arc<dyn SimpleResolver>),
    None,
}

impl Strategy {
    pub fn kind(&self) -> Option<ResolverKind> {
        match self {
            Strategy::Relation(_) => Some(ResolverKind::Relation),
            Strategy::Batch(_) => Some(ResolverKind::Batch),
            Strategy::Simple(_) => Some(ResolverKind::Simple),
            Strategy::None => None,
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Relation(target) => write!(f, "Relation({target})"),
            Strategy::Batch(_) => write!(f, "Batch(...)"),
            Strategy::Simple(_) => write!(f, "Simple(...)"),
            Strategy::None => write!(f, "None"),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub relations: usize,
    pub batch_resolvers: usize,
    pub simple_resolvers: usize,
}

impl RegistryStats {
    pub fn total(&self) -> usize {
        self.relations + self.batch_resolvers + self.simple_resolvers
    }
}

#[derive(Default)]
struct RegistryTables {
    relations: HashMap<String, RelationTarget>,
    batch: HashMap<String, Arc<dyn BatchResolver>>,
    simple: HashMap<String, Arc<dyn SimpleResolver>>,
}

/// Thread-safe registry of hydration resolvers.
///
/// Share it behind an `Arc`. Reads take a short `parking_lot` read lock and
/// never contend with each other; registration and reset take the write lock.
#[derive(Default)]
pub struct ResolverRegistry {
    tables: RwLock<RegistryTables>,
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("ResolverRegistry")
            .field("relations", &tables.relations)
            .field("batch", &tables.batch.keys().collect::<Vec<_>>())
            .field("simple", &tables.simple.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to bulk-fetching entities from `target` via `{key}_id` / `{key}-id`
    pub fn register_relation(
        &self,
        key: impl Into<String>,
        target: RelationTarget,
    ) -> HydrationResult<()> {
        let key = key.into();
        let mut tables = self.tables.write();
        if tables.relations.contains_key(&key) {
            return Err(duplicate(ResolverKind::Relation, key));
        }
        info!(key = %key, target = %target, "Registered relation resolver");
        tables.relations.insert(key, target);
        Ok(())
    }

    pub fn register_batch_resolver<R>(
        &self,
        key: impl Into<String>,
        resolver: R,
    ) -> HydrationResult<()>
    where
        R: BatchResolver + 'static,
    {
        self.register_batch_resolver_arc(key, Arc::new(resolver))
    }

    pub fn register_batch_resolver_arc(
        &self,
        key: impl Into<String>,
        resolver: Arc<dyn BatchResolver>,
    ) -> HydrationResult<()> {
        let key = key.into();
        let mut tables = self.tables.write();
        if tables.batch.contains_key(&key) {
            return Err(duplicate(ResolverKind::Batch, key));
        }
        info!(key = %key, "Registered batch resolver");
        tables.batch.insert(key, resolver);
        Ok(())
    }

    pub fn register_simple_resolver<R>(
        &self,
        key: impl Into<String>,
        resolver: R,
    ) -> HydrationResult<()>
    where
        R: SimpleResolver + 'static,
    {
        self.register_simple_resolver_arc(key, Arc::new(resolver))
    }

    pub fn register_simple_resolver_arc(
        &self,
        key: impl Into<String>,
        resolver: Arc<dyn SimpleResolver>,
    ) -> HydrationResult<()> {
        let key = key.into();
        let mut tables = self.tables.write();
        if tables.simple.contains_key(&key) {
            return Err(duplicate(ResolverKind::Simple, key));
        }
        info!(key = %key, "Registered simple resolver");
        tables.simple.insert(key, resolver);
        Ok(())
    }

    /// Remove one registration. Returns `true` if something was removed.
    pub fn unregister(&self, kind: ResolverKind, key: &str) -> bool {
        let mut tables = self.tables.write();
        let removed = match kind {
            ResolverKind::Relation => tables.relations.remove(key).is_some(),
            ResolverKind::Batch => tables.batch.remove(key).is_some(),
            ResolverKind::Simple => tables.simple.remove(key).is_some(),
        };
        if removed {
            debug!(key = key, kind = %kind, "Unregistered resolver");
        }
        removed
    }

    /// Drop every registration of every kind
    pub fn reset(&self) {
        let mut tables = self.tables.write();
        let cleared = tables.relations.len() + tables.batch.len() + tables.simple.len();
        *tables = RegistryTables::default();
        info!(cleared = cleared, "Reset resolver registry");
    }

    pub fn is_registered(&self, kind: ResolverKind, key: &str) -> bool {
        let tables = self.tables.read();
        match kind {
            ResolverKind::Relation => tables.relations.contains_key(key),
            ResolverKind::Batch => tables.batch.contains_key(key),
            ResolverKind::Simple => tables.simple.contains_key(key),
        }
    }

    pub fn relation_target(&self, key: &str) -> Option<RelationTarget> {
        self.tables.read().relations.get(key).cloned()
    }

    /// All keys with at least one registration, sorted and deduplicated
    pub fn registered_keys(&self) -> Vec<String> {
        let tables = self.tables.read();
        let mut keys: Vec<String> = tables
            .relations
            .keys()
            .chain(tables.batch.keys())
            .chain(tables.simple.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn stats(&self) -> RegistryStats {
        let tables = self.tables.read();
        RegistryStats {
            relations: tables.relations.len(),
            batch_resolvers: tables.batch.len(),
            simple_resolvers: tables.simple.len(),
        }
    }

    /// Pick the strategy for `key` over `records`.
    ///
    /// Evaluated fresh on every call: relation eligibility depends on which
    /// records still lack the key and which foreign-key fields they carry.
    pub fn strategy_for(&self, key: &str, records: &[Value]) -> Strategy {
        let tables = self.tables.read();

        if let Some(target) = tables.relations.get(key) {
            if relation_eligible(key, records) {
                return Strategy::Relation(target.clone());
            }
            debug!(key = key, "Relation resolver registered but foreign keys missing");
        }
        if let Some(resolver) = tables.batch.get(key) {
            return Strategy::Batch(Arc::clone(resolver));
        }
        if let Some(resolver) = tables.simple.get(key) {
            return Strategy::Simple(Arc::clone(resolver));
        }
        Strategy::None
    }
}

/// Every record still lacking `key` carries one of its foreign-key spellings
fn relation_eligible(key: &str, records: &[Value]) -> bool {
    records
        .iter()
        .filter(|entry| needs_key(entry, key))
        .filter_map(Value::as_object)
        .all(|record| foreign_key_value(record, key).is_some())
}

fn duplicate(kind: ResolverKind, key: String) -> HydrationError {
    HydrationError::DuplicateRegistration {
        kind: kind.to_string(),
        key,
    }
}
