#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Hydration
//!
//! Batch relation hydration for heterogeneous, arbitrarily nested record
//! collections.
//!
//! ## Overview
//!
//! Given records fetched from a data store, the hydrator augments each record
//! with related data under requested keys while performing at most one bulk
//! fetch per key across the whole collection, never one fetch per record.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Hydrator ──► KeyResolver ──► ResolverRegistry (pick strategy)
//!               │              │
//!               │              └──► QueryCollaborator (one fetch_by_ids per key)
//!               └──► shape codec (flatten / restructure for nested specs)
//! ```
//!
//! ## Module Organization
//!
//! - [`hydrator`] - Public entry point and nested-spec recursion
//! - [`key_resolver`] - One key over one collection, one strategy
//! - [`registry`] - Relation, batch and simple resolver registrations
//! - [`shape`] - Flatten a collection by key and restructure it back
//! - [`spec`] - Hydration spec parsing and validation
//! - [`query`] - Query collaborators (in-memory, PostgreSQL)
//! - [`record`] - Record aliases and the `Slot` sum type
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tasker_hydration::{
//!     HydrationSpec, Hydrator, InMemoryStore, RelationTarget, ResolverRegistry,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new().with_rows(
//!     "users",
//!     vec![json!({"id": 100, "name": "ada"}), json!({"id": 101, "name": "grace"})],
//! ));
//!
//! let registry = Arc::new(ResolverRegistry::new());
//! registry.register_relation("user", RelationTarget::new("users"))?;
//!
//! let hydrator = Hydrator::new(registry, store.clone());
//! let posts = hydrator
//!     .hydrate(json!([{"user_id": 100}, {"user_id": 101}]), &[HydrationSpec::key("user")])
//!     .await?;
//!
//! assert_eq!(posts[1]["user"]["name"], "grace");
//! assert_eq!(store.fetch_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hydrator;
pub mod key_resolver;
pub mod logging;
pub mod query;
pub mod record;
pub mod registry;
pub mod shape;
pub mod spec;

pub use config::{HydrationConfig, LoggingConfig};
pub use error::{HydrationError, HydrationResult};
pub use hydrator::Hydrator;
pub use key_resolver::{KeyPatch, KeyResolver};
#[cfg(feature = "postgres")]
pub use query::PgQueryCollaborator;
pub use query::{InMemoryStore, QueryCollaborator, RelationTarget};
pub use record::{Record, Records, Slot};
pub use registry::{
    batch_fn, simple_fn, BatchResolver, RegistryStats, ResolverKind, ResolverRegistry,
    SimpleResolver, Strategy,
};
pub use shape::{ShapeDescriptor, ShapeTag};
pub use spec::HydrationSpec;
