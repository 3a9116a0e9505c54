// cache.rs - TTL cache for derived read views
//
// Derived views (map, hubs overview, curated/citizens by year) are costly to
// assemble and read far more often than written. Entries expire after the
// configured TTL and write services invalidate the keys they affect.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache keys for every derived view.
pub mod keys {
    pub const MAP: &str = "view:map";
    pub const ROUTES: &str = "view:routes";
    pub const HUBS: &str = "view:hubs";
    pub const CURATED: &str = "view:curated";
    pub const CITIZENS: &str = "view:citizens";
    pub const PARTICIPANTS: &str = "view:participants";

    /// Every view that reads participant or user rows.
    pub const PEOPLE: &[&str] = &[MAP, HUBS, CURATED, CITIZENS, PARTICIPANTS];
}

pub struct ViewCache {
    ttl: Duration,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, (Instant, Value)>,
    /// Bumped by `invalidate`; a build only lands if its key's generation
    /// is unchanged.
    generations: HashMap<String, u64>,
    /// Bumped by `clear`.
    epoch: u64,
}

impl Inner {
    fn stamp(&self, key: &str) -> (u64, u64) {
        (self.epoch, self.generations.get(key).copied().unwrap_or(0))
    }
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn put(&self, key: &str, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        self.inner
            .write()
            .await
            .entries
            .insert(key.to_string(), (Instant::now(), value));
    }

    /// Return the cached view or build, store and return it. A build that
    /// overlaps an invalidation of its key is returned but not stored.
    pub async fn get_or_try_insert<F, Fut, E>(&self, key: &str, build: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let stamp = {
            let inner = self.inner.read().await;
            if let Some(hit) = inner
                .entries
                .get(key)
                .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            {
                debug!("view cache hit: {}", key);
                return Ok(hit.1.clone());
            }
            inner.stamp(key)
        };

        let value = build().await?;
        if self.ttl.is_zero() {
            return Ok(value);
        }

        let mut inner = self.inner.write().await;
        if inner.stamp(key) == stamp {
            inner.entries.insert(key.to_string(), (Instant::now(), value.clone()));
        } else {
            debug!("view cache: {} invalidated during build, not stored", key);
        }
        Ok(value)
    }

    pub async fn invalidate(&self, keys: &[&str]) {
        let mut inner = self.inner.write().await;
        for key in keys {
            inner.entries.remove(*key);
            *inner.generations.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.epoch += 1;
    }
}
