use crate::context::Context;
use crate::legacy::{LegacyCache, LegacyCacheMulti, LegacyCacheWithTtl, TtlItem};
use crate::metrics::{self, Metrics, NoopMetrics};
use crate::ports::{Cache, CacheItem};
use crate::probe::ModernCapabilities;
use crate::shutdown::{ShutdownSignal, ShutdownState};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{LegacyError, LegacyResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

/// Exposes a context-aware [`Cache`] through the legacy contract.
///
/// Legacy calls carry no context, so every call into the wrapped cache runs
/// under [`Context::background`]. TTL is native to the modern contract, which
/// means the TTL surface is always available. Batch writes go to the backend's
/// native multi-set when it has one and are otherwise replayed key by key.
pub struct ModernToLegacy {
    cache: Arc<dyn Cache>,
    caps: ModernCapabilities,
    metrics: Arc<dyn Metrics>,
    shutdown: Arc<ShutdownSignal>,
}

impl ModernToLegacy {
    pub fn new(cache: Arc<dyn Cache>, metrics: Arc<dyn Metrics>) -> Self {
        let caps = ModernCapabilities::probe(&cache);
        debug!("wrapping modern cache for legacy callers: {:?}", caps);

        Self {
            cache,
            caps,
            metrics,
            shutdown: Arc::new(ShutdownSignal::new()),
        }
    }

    pub fn without_metrics(cache: Arc<dyn Cache>) -> Self {
        Self::new(cache, Arc::new(NoopMetrics))
    }

    /// Wrap `cache` and hand it out as a legacy trait object.
    pub fn wrap(cache: Arc<dyn Cache>, metrics: Arc<dyn Metrics>) -> Arc<dyn LegacyCache> {
        Arc::new(Self::new(cache, metrics))
    }

    pub fn capabilities(&self) -> &ModernCapabilities {
        &self.caps
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown.state()
    }

    async fn set_items(&self, items: Vec<CacheItem>) -> LegacyResult<()> {
        let ctx = Context::background();

        if let Some(native) = &self.caps.multi {
            return native.set_multi(&ctx, items).await.map_err(LegacyError::from);
        }

        // No native batching: apply in input order and stop at the first
        // failure. Entries already written stay written.
        self.metrics.incr(metrics::SET_MULTI_FALLBACK);
        for item in items {
            self.cache.set(&ctx, &item.key, item.value, item.ttl).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModernToLegacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModernToLegacy")
            .field("capabilities", &self.caps)
            .field("shutdown", &self.shutdown.state())
            .finish()
    }
}

#[async_trait]
impl LegacyCache for ModernToLegacy {
    async fn get(&self, key: &str) -> LegacyResult<Bytes> {
        Ok(self.cache.get(&Context::background(), key).await?)
    }

    async fn set(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        Ok(self.cache.set(&Context::background(), key, value, None).await?)
    }

    async fn add(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        Ok(self.cache.add(&Context::background(), key, value, None).await?)
    }

    async fn delete(&self, key: &str) -> LegacyResult<()> {
        Ok(self.cache.delete(&Context::background(), key).await?)
    }

    fn close_async(&self) {
        if !self.shutdown.begin_close() {
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                error!("close requested outside of a tokio runtime, cache left open");
                return;
            }
        };

        let cache = self.cache.clone();
        let shutdown = self.shutdown.clone();
        handle.spawn(async move {
            match cache.close(&Context::background()).await {
                Ok(()) => shutdown.complete(),
                Err(e) => error!("failed to close wrapped cache: {}", e),
            }
        });
    }

    async fn wait_for_close(&self, timeout: Duration) -> LegacyResult<()> {
        if self.shutdown.wait_closed(timeout).await {
            return Ok(());
        }
        self.metrics.incr(metrics::CLOSE_TIMEOUT);
        warn!(
            "cache did not close within {:?} (state: {:?})",
            timeout,
            self.shutdown.state()
        );
        Err(LegacyError::Timeout)
    }

    fn as_ttl(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheWithTtl>> {
        Some(self)
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheMulti>> {
        Some(self)
    }
}

#[async_trait]
impl LegacyCacheWithTtl for ModernToLegacy {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        Ok(self.cache.set(&Context::background(), key, value, ttl).await?)
    }

    async fn add_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        Ok(self.cache.add(&Context::background(), key, value, ttl).await?)
    }

    async fn set_multi_with_ttl(&self, items: Vec<(String, TtlItem)>) -> LegacyResult<()> {
        let items = items
            .into_iter()
            .map(|(key, item)| CacheItem {
                key,
                value: item.value,
                ttl: item.ttl,
            })
            .collect();
        self.set_items(items).await
    }
}

#[async_trait]
impl LegacyCacheMulti for ModernToLegacy {
    async fn set_multi(&self, items: Vec<(String, Bytes)>) -> LegacyResult<()> {
        let items = items
            .into_iter()
            .map(|(key, value)| CacheItem {
                key,
                value,
                ttl: None,
            })
            .collect();
        self.set_items(items).await
    }
}
