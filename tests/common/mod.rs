//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod strategies;

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tasker_hydration::{HydrationConfig, Hydrator, InMemoryStore, ResolverRegistry};

/// Store with `users` and `teams` sources
pub fn user_store() -> Arc<InMemoryStore> {
    Arc::new(
        InMemoryStore::new()
            .with_rows(
                "users",
                vec![
                    json!({"id": 100, "name": "ada", "team_id": 1}),
                    json!({"id": 101, "name": "grace", "team_id": 2}),
                    json!({"id": 102, "name": "barbara", "team_id": 1}),
                ],
            )
            .with_rows(
                "teams",
                vec![json!({"id": 1, "name": "compilers"}), json!({"id": 2, "name": "kernels"})],
            ),
    )
}

pub fn hydrator(registry: &Arc<ResolverRegistry>, store: &Arc<InMemoryStore>) -> Hydrator {
    Hydrator::new(Arc::clone(registry), store.clone())
}

pub fn concurrent_hydrator(
    registry: &Arc<ResolverRegistry>,
    store: &Arc<InMemoryStore>,
) -> Hydrator {
    let config = HydrationConfig {
        concurrent_keys: true,
        ..HydrationConfig::default()
    };
    Hydrator::with_config(Arc::clone(registry), store.clone(), config)
}

/// Counts invocations and records the size of each batch
#[derive(Debug, Default)]
pub struct CallCounter {
    calls: AtomicUsize,
    sizes: parking_lot::Mutex<Vec<usize>>,
}

impl CallCounter {
    pub fn record(&self, size: usize) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().push(size);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.sizes.lock().clone()
    }
}

/// Sorted textual ids from a fetch, for order-independent comparison
pub fn sorted_ids(ids: &[Value]) -> Vec<String> {
    let mut ids: Vec<String> = ids.iter().map(Value::to_string).collect();
    ids.sort();
    ids
}
