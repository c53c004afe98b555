use super::RelationTarget;
use crate::error::{HydrationError, HydrationResult};

/// SQL for a bulk point-lookup by identifier set.
///
/// Identifiers are bound as one text array parameter (`$1`) and compared
/// against the primary key cast to text, so integer, uuid and text keys share
/// one query shape. Rows come back as JSON objects via `row_to_json`.
#[derive(Debug, Clone)]
pub struct FetchByIdsQuery {
    source: String,
    primary_key: String,
    select_fields: Vec<String>,
    schema: Option<String>,
}

impl FetchByIdsQuery {
    /// Create a query for the given relation target, validating identifiers
    pub fn new(target: &RelationTarget) -> HydrationResult<Self> {
        validate_identifier(&target.source, target)?;
        validate_identifier(&target.primary_key, target)?;
        Ok(Self {
            source: target.source.clone(),
            primary_key: target.primary_key.clone(),
            select_fields: vec!["*".to_string()],
            schema: None,
        })
    }

    /// Set specific columns to select
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Qualify the source table with a schema
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Build the complete SQL query string
    pub fn build_sql(&self) -> String {
        let table = match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.source),
            None => self.source.clone(),
        };

        let mut sql = String::new();
        sql.push_str("SELECT row_to_json(t) FROM (SELECT ");
        sql.push_str(&self.select_fields.join(", "));
        sql.push_str(&format!(" FROM {table}"));
        sql.push_str(&format!(" WHERE {}::text = ANY($1)", self.primary_key));
        sql.push_str(") t");
        sql
    }
}

/// Table and column names are interpolated, so only plain identifiers pass
fn validate_identifier(name: &str, target: &RelationTarget) -> HydrationResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && name.len() <= 63 {
        Ok(())
    } else {
        Err(HydrationError::query(
            target.to_string(),
            format!("'{name}' is not a valid SQL identifier"),
        ))
    }
}
