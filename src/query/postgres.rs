//! # PostgreSQL Query Collaborator
//!
//! Bulk point-lookups against PostgreSQL tables through a shared `sqlx` pool.
//! One `fetch_by_ids` call issues exactly one `= ANY($1)` query.

use super::{FetchByIdsQuery, QueryCollaborator, RelationTarget};
use crate::error::{HydrationError, HydrationResult};
use crate::record::id_text;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct PgQueryCollaborator {
    pool: PgPool,
    schema: Option<String>,
}

impl PgQueryCollaborator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, schema: None }
    }

    /// Qualify every relation source with a schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn query_for(&self, target: &RelationTarget) -> HydrationResult<FetchByIdsQuery> {
        let query = FetchByIdsQuery::new(target)?;
        Ok(match &self.schema {
            Some(schema) => query.in_schema(schema),
            None => query,
        })
    }
}

#[async_trait]
impl QueryCollaborator for PgQueryCollaborator {
    #[instrument(skip(self, ids), fields(target = %target, ids = ids.len()))]
    async fn fetch_by_ids(
        &self,
        target: &RelationTarget,
        ids: &[Value],
    ) -> HydrationResult<Vec<Value>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = self.query_for(target)?.build_sql();
        let id_texts: Vec<String> = ids.iter().map(id_text).collect();

        let rows: Vec<Value> = sqlx::query_scalar::<_, Value>(&sql)
            .bind(&id_texts)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HydrationError::query(target.to_string(), e.to_string()))?;

        debug!(found = rows.len(), "PostgreSQL fetch by ids");
        Ok(rows)
    }
}
