//! # Query Collaborators
//!
//! The relation strategy fetches related entities through a [`QueryCollaborator`],
//! one bulk point-lookup per key per hydrate call.
//!
//! ## Key Components
//!
//! - [`RelationTarget`] - names the store collection and its identifier field
//! - [`InMemoryStore`] - concurrent in-process store with a fetch log
//! - [`PgQueryCollaborator`] - PostgreSQL lookups through `sqlx` (feature `postgres`)
//! - [`FetchByIdsQuery`] - SQL generation for the PostgreSQL collaborator

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sql;

use crate::error::HydrationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use memory::{FetchRecord, InMemoryStore};
#[cfg(feature = "postgres")]
pub use postgres::PgQueryCollaborator;
pub use sql::FetchByIdsQuery;

/// Default identifier field of a relation target
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// How to bulk-fetch the entities a relation key points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTarget {
    /// Store collection or table name
    pub source: String,
    /// Identifier field matched against the foreign key values
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl RelationTarget {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            primary_key: default_primary_key(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Parse `source` or `source:primary_key`
    pub fn parse(input: &str) -> Self {
        match input.split_once(':') {
            Some((source, pk)) if !pk.trim().is_empty() => {
                Self::new(source.trim()).with_primary_key(pk.trim())
            }
            Some((source, _)) => Self::new(source.trim()),
            None => Self::new(input.trim()),
        }
    }
}

impl fmt::Display for RelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source, self.primary_key)
    }
}

/// Bulk point-lookup against an external store.
///
/// Implementations return the entities whose identifier is in `ids`, in any
/// order. Missing ids are simply absent from the result.
#[async_trait]
pub trait QueryCollaborator: Send + Sync {
    async fn fetch_by_ids(
        &self,
        target: &RelationTarget,
        ids: &[Value],
    ) -> HydrationResult<Vec<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_target_parse() {
        assert_eq!(RelationTarget::parse("users"), RelationTarget::new("users"));
        assert_eq!(
            RelationTarget::parse("accounts:account_uuid"),
            RelationTarget::new("accounts").with_primary_key("account_uuid")
        );
        assert_eq!(RelationTarget::parse("users:"), RelationTarget::new("users"));
        assert_eq!(RelationTarget::new("users").to_string(), "users.id");
    }
}
