use async_trait::async_trait;
use bytes::Bytes;
use conduit::legacy::{LegacyCache, LegacyCacheMulti, LegacyCacheWithTtl, TtlItem};
use conduit::shutdown::ShutdownSignal;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::{LegacyError, LegacyResult};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Debug)]
struct Slot {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            // A TTL too large to represent never expires.
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// DashMap-backed cache speaking the legacy contract, including the TTL and
/// batch surfaces. Expired entries are dropped lazily when touched.
pub struct MemoryCache {
    map: DashMap<String, Slot>,
    shutdown: ShutdownSignal,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn put(&self, key: &str, value: Bytes, ttl: Option<Duration>) {
        self.map.insert(key.to_string(), Slot::new(value, ttl));
    }

    fn put_new(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> LegacyResult<()> {
        match self.map.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(Instant::now()) {
                    return Err(LegacyError::KeyAlreadyExists);
                }
                occupied.insert(Slot::new(value, ttl));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value, ttl));
            }
        }
        Ok(())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LegacyCache for MemoryCache {
    async fn get(&self, key: &str) -> LegacyResult<Bytes> {
        let now = Instant::now();
        if let Some(slot) = self.map.get(key) {
            if !slot.is_expired(now) {
                return Ok(slot.value.clone());
            }
        }
        self.map.remove_if(key, |_, slot| slot.is_expired(now));
        Err(LegacyError::KeyNotFound)
    }

    async fn set(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        self.put(key, value, None);
        Ok(())
    }

    async fn add(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        self.put_new(key, value, None)
    }

    async fn delete(&self, key: &str) -> LegacyResult<()> {
        self.map.remove(key);
        Ok(())
    }

    fn close_async(&self) {
        if self.shutdown.begin_close() {
            self.map.clear();
            self.shutdown.complete();
            info!("memory cache closed");
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> LegacyResult<()> {
        if self.shutdown.wait_closed(timeout).await {
            Ok(())
        } else {
            Err(LegacyError::Timeout)
        }
    }

    fn as_ttl(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheWithTtl>> {
        Some(self)
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheMulti>> {
        Some(self)
    }
}

#[async_trait]
impl LegacyCacheWithTtl for MemoryCache {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        self.put(key, value, ttl);
        Ok(())
    }

    async fn add_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        self.put_new(key, value, ttl)
    }

    async fn set_multi_with_ttl(&self, items: Vec<(String, TtlItem)>) -> LegacyResult<()> {
        for (key, item) in items {
            self.map.insert(key, Slot::new(item.value, item.ttl));
        }
        Ok(())
    }
}

#[async_trait]
impl LegacyCacheMulti for MemoryCache {
    async fn set_multi(&self, items: Vec<(String, Bytes)>) -> LegacyResult<()> {
        for (key, value) in items {
            self.map.insert(key, Slot::new(value, None));
        }
        Ok(())
    }
}

impl Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.map.len())
            .field("shutdown", &self.shutdown.state())
            .finish()
    }
}
