//! Shared GET response cache with per-collection invalidation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.stored_at.elapsed() >= ttl)
    }
}

/// Invalidation counter of a collection, taken before a fetch and checked
/// again when the fetched value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Counter value at the last invalidation of each collection.
    invalidated: HashMap<String, u64>,
    /// Counter value at the last full clear.
    cleared: u64,
    counter: u64,
}

impl CacheState {
    fn generation(&self, collection: &str) -> Generation {
        let invalidated = self.invalidated.get(collection).copied().unwrap_or_default();
        Generation(invalidated.max(self.cleared))
    }

    fn bump(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

/// In-memory cache of GET responses, keyed by endpoint.
///
/// Shared by all clones of a client. A write to any endpoint of a collection
/// drops every cached entry of that collection, and a value fetched before
/// that write is never stored afterwards.
#[derive(Debug, Default)]
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, endpoint: &str) -> Option<Value> {
        let mut state = self.lock();
        match state.entries.get(endpoint) {
            Some(entry) if entry.is_expired(self.ttl) => {
                state.entries.remove(endpoint);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Current generation of the collection `endpoint` belongs to.
    pub fn generation(&self, endpoint: &str) -> Generation {
        self.lock().generation(collection_of(endpoint))
    }

    /// Stores `value` unless the collection was invalidated since
    /// `generation` was taken. Returns whether the value was stored.
    pub fn insert(
        &self,
        endpoint: impl Into<String>,
        generation: Generation,
        value: Value,
    ) -> bool {
        let endpoint = endpoint.into();
        let mut state = self.lock();
        if state.generation(collection_of(&endpoint)) != generation {
            return false;
        }

        state.entries.insert(
            endpoint,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drops every entry belonging to the same collection as `endpoint`.
    pub fn invalidate_collection(&self, endpoint: &str) {
        let collection = collection_of(endpoint);
        let mut state = self.lock();
        let generation = state.bump();
        state.invalidated.insert(collection.to_string(), generation);
        state
            .entries
            .retain(|key, _| collection_of(key) != collection);
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.cleared = state.bump();
        state.invalidated.clear();
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First path segment of an endpoint: `tagInstances/4` -> `tagInstances`.
pub fn collection_of(endpoint: &str) -> &str {
    endpoint
        .trim_start_matches('/')
        .split(['/', '?'])
        .next()
        .unwrap_or_default()
}
