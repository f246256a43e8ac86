//! Read cache for the query layer.
//!
//! Entries are keyed by resource plus the serialized filter they were fetched
//! with, and go stale after a fixed time. Every resource carries a generation
//! counter; invalidating a resource drops its entries and bumps the counter,
//! so a fetch that was already in flight cannot write its older answer back.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Factions,
    Geometries,
    Regions,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Users, Resource::Factions, Resource::Geometries, Resource::Regions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Factions => "factions",
            Resource::Geometries => "geometries",
            Resource::Regions => "regions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    resource: Resource,
    params: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    generations: HashMap<Resource, u64>,
}

impl Inner {
    fn generation(&self, resource: Resource) -> u64 {
        self.generations.get(&resource).copied().unwrap_or(1)
    }
}

/// Handed out before a fetch starts; redeemed by [`QueryCache::store`].
#[derive(Debug, Clone)]
pub struct Ticket {
    key: CacheKey,
    generation: u64,
}

pub struct QueryCache {
    stale_time: Duration,
    inner: RwLock<Inner>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self { stale_time, inner: RwLock::new(Inner::default()) }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Fresh entry for `(resource, params)`, if any.
    pub fn get(&self, resource: Resource, params: &str) -> Option<Value> {
        self.get_at(resource, params, Instant::now())
    }

    pub fn get_at(&self, resource: Resource, params: &str, now: Instant) -> Option<Value> {
        let key = CacheKey { resource, params: params.to_string() };
        let inner = self.inner.read();
        let hit = inner.entries.get(&key)?;
        if now.saturating_duration_since(hit.stored_at) < self.stale_time {
            debug!(resource = resource.as_str(), %params, "query cache hit");
            Some(hit.value.clone())
        } else {
            None
        }
    }

    pub fn ticket(&self, resource: Resource, params: &str) -> Ticket {
        let generation = self.inner.read().generation(resource);
        Ticket { key: CacheKey { resource, params: params.to_string() }, generation }
    }

    /// Store a fetched value. Refused when the resource was invalidated after the ticket was taken.
    pub fn store(&self, ticket: Ticket, value: Value) -> bool {
        let mut inner = self.inner.write();
        if inner.generation(ticket.key.resource) != ticket.generation {
            debug!(resource = ticket.key.resource.as_str(), "dropping result of a fetch that predates an invalidation");
            return false;
        }
        inner.entries.insert(ticket.key, CacheEntry { value, stored_at: Instant::now() });
        true
    }

    /// Drop every entry of `resource` and bump its generation. Returns how many entries went.
    pub fn invalidate(&self, resource: Resource) -> usize {
        let mut inner = self.inner.write();
        let next = inner.generation(resource) + 1;
        inner.generations.insert(resource, next);
        let before = inner.entries.len();
        inner.entries.retain(|k, _| k.resource != resource);
        let dropped = before - inner.entries.len();
        debug!(resource = resource.as_str(), dropped, generation = next, "query cache invalidated");
        dropped
    }

    /// Forget everything, including what in-flight fetches would bring back.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        for r in Resource::ALL {
            let next = inner.generation(r) + 1;
            inner.generations.insert(r, next);
        }
        inner.entries.clear();
    }

    pub fn generation(&self, resource: Resource) -> u64 {
        self.inner.read().generation(resource)
    }

    pub fn contains(&self, resource: Resource, params: &str) -> bool {
        self.inner.read().entries.contains_key(&CacheKey { resource, params: params.to_string() })
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
