//! # Registry Infrastructure
//!
//! Resolver registration and strategy resolution for hydration keys.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ResolverRegistry      (relation / batch / simple tables per key)
//! ├── Strategy              (the one strategy chosen for a key and collection)
//! └── resolvers
//!     ├── BatchResolver     (whole collection in one call)
//!     └── SimpleResolver    (one record at a time)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tasker_hydration::query::RelationTarget;
//! use tasker_hydration::registry::{simple_fn, ResolverRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ResolverRegistry::new();
//! registry.register_relation("user", RelationTarget::new("users"))?;
//! registry.register_simple_resolver("greeting", simple_fn(|record| async move {
//!     Ok(json!(format!("hello {}", record["name"])))
//! }))?;
//! assert_eq!(registry.stats().total(), 2);
//! # Ok(())
//! # }
//! ```

pub mod resolver_registry;
pub mod resolvers;

pub use resolver_registry::{RegistryStats, ResolverKind, ResolverRegistry, Strategy};
pub use resolvers::{batch_fn, simple_fn, BatchFn, BatchResolver, SimpleFn, SimpleResolver};
