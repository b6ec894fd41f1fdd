use async_trait::async_trait;
use bytes::Bytes;
use conduit::Context;
use conduit::ports::{Cache, CacheItem, CacheMulti};
use moka::Expiry;
use moka::future::Cache as Store;
use shared::config::Config;
use shared::{Error, Result};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Debug)]
struct Entry {
    value: Bytes,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL, or the cache default when it has none.
struct PerEntryExpiry {
    default_ttl: Option<Duration>,
}

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }
}

/// Moka-based cache speaking the context-aware contract.
/// Lock-free and concurrent, with optional size bound and per-entry TTL.
pub struct MokaCache {
    cache: Store<String, Entry>,
}

impl MokaCache {
    /// Create a new unbounded Moka cache with optional default TTL
    pub fn new_unbounded(default_ttl: Option<Duration>) -> Self {
        Self {
            cache: Store::builder()
                .expire_after(PerEntryExpiry { default_ttl })
                .build(),
        }
    }

    /// Create a new bounded Moka cache with max entries and optional default TTL
    pub fn new_bounded(max_entries: u64, default_ttl: Option<Duration>) -> Self {
        Self {
            cache: Store::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryExpiry { default_ttl })
                .build(),
        }
    }

    pub fn new(name: &str, max_entries: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Store::builder().name(name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.expire_after(PerEntryExpiry { default_ttl }).build(),
        }
    }

    pub fn from_config(name: &str, config: &Config) -> Self {
        Self::new(name, config.cache_max_entries, config.default_ttl)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl Cache for MokaCache {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Bytes> {
        match self.cache.get(key).await {
            Some(entry) => Ok(entry.value),
            None => Err(Error::KeyNotFound), // Either doesn't exist or TTL expired
        }
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.cache.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn add(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let entry = self
            .cache
            .entry_by_ref(key)
            .or_insert_with(async move { Entry { value, ttl } })
            .await;

        if entry.is_fresh() {
            Ok(())
        } else {
            Err(Error::KeyAlreadyExists)
        }
    }

    async fn delete(&self, _ctx: &Context, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn close(&self, ctx: &Context) -> Result<()> {
        self.cache.invalidate_all();
        tokio::select! {
            _ = self.cache.run_pending_tasks() => {}
            _ = ctx.done() => return Err(Error::Timeout),
        }
        info!("moka cache closed");
        Ok(())
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn CacheMulti>> {
        Some(self)
    }
}

#[async_trait]
impl CacheMulti for MokaCache {
    async fn set_multi(&self, _ctx: &Context, items: Vec<CacheItem>) -> Result<()> {
        for item in items {
            self.cache
                .insert(
                    item.key,
                    Entry {
                        value: item.value,
                        ttl: item.ttl,
                    },
                )
                .await;
        }
        Ok(())
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
