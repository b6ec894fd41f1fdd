use crate::context::Context;
use crate::legacy::{LegacyCache, TtlItem};
use crate::ports::{Cache, CacheItem, CacheMulti};
use crate::probe::LegacyCapabilities;
use crate::shutdown::{ShutdownSignal, ShutdownState};
use async_trait::async_trait;
use bytes::Bytes;
use shared::config::Config;
use shared::{Error, LegacyError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Exposes a legacy cache through the context-aware contract.
///
/// The legacy backend has no way to observe cancellation, so the context given
/// to `get`, `set`, `add` and `delete` is not propagated: an ended context does
/// not abort a call already handed to the backend. Only [`Cache::close`] reacts
/// to the context, and then only by giving up the wait.
///
/// Optional surfaces are handled asymmetrically. A TTL passed to a backend
/// without the TTL surface is dropped and the write goes through without
/// expiry. A batch write on a backend without the multi surface fails with
/// [`Error::NotImplemented`]. Losing a TTL is tolerated as degraded service,
/// losing batching is a correctness gap the caller has to see, so do not make
/// these two paths consistent.
pub struct LegacyToModern {
    cache: Arc<dyn LegacyCache>,
    caps: LegacyCapabilities,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
}

impl LegacyToModern {
    pub fn new(cache: Arc<dyn LegacyCache>) -> Self {
        Self::with_poll_interval(
            cache,
            Duration::from_millis(Config::DEFAULT_CLOSE_POLL_MS),
        )
    }

    pub fn with_config(cache: Arc<dyn LegacyCache>, config: &Config) -> Self {
        Self::with_poll_interval(cache, config.close_poll_interval)
    }

    fn with_poll_interval(cache: Arc<dyn LegacyCache>, poll_interval: Duration) -> Self {
        let caps = LegacyCapabilities::probe(&cache);
        debug!("wrapping legacy cache for modern callers: {:?}", caps);

        Self {
            cache,
            caps,
            shutdown: ShutdownSignal::new(),
            poll_interval,
        }
    }

    /// Wrap `cache` and hand it out as a modern trait object.
    pub fn wrap(cache: Arc<dyn LegacyCache>) -> Arc<dyn Cache> {
        Arc::new(Self::new(cache))
    }

    pub fn capabilities(&self) -> &LegacyCapabilities {
        &self.caps
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown.state()
    }
}

impl fmt::Debug for LegacyToModern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyToModern")
            .field("capabilities", &self.caps)
            .field("shutdown", &self.shutdown.state())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[async_trait]
impl Cache for LegacyToModern {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Bytes> {
        Ok(self.cache.get(key).await?)
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        match (ttl, &self.caps.ttl) {
            (Some(ttl), Some(with_ttl)) => Ok(with_ttl.set_with_ttl(key, value, Some(ttl)).await?),
            (Some(ttl), None) => {
                debug!("dropping ttl {:?} for key '{}': backend has no ttl support", ttl, key);
                Ok(self.cache.set(key, value).await?)
            }
            (None, _) => Ok(self.cache.set(key, value).await?),
        }
    }

    async fn add(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        match (ttl, &self.caps.ttl) {
            (Some(ttl), Some(with_ttl)) => Ok(with_ttl.add_with_ttl(key, value, Some(ttl)).await?),
            (Some(ttl), None) => {
                debug!("dropping ttl {:?} for key '{}': backend has no ttl support", ttl, key);
                Ok(self.cache.add(key, value).await?)
            }
            (None, _) => Ok(self.cache.add(key, value).await?),
        }
    }

    async fn delete(&self, _ctx: &Context, key: &str) -> Result<()> {
        Ok(self.cache.delete(key).await?)
    }

    async fn close(&self, ctx: &Context) -> Result<()> {
        if self.shutdown.state() == ShutdownState::Closed {
            return Ok(());
        }
        if self.shutdown.begin_close() {
            self.cache.close_async();
        }

        loop {
            let started = Instant::now();
            tokio::select! {
                res = self.cache.wait_for_close(self.poll_interval) => match res {
                    Ok(()) => {
                        self.shutdown.complete();
                        return Ok(());
                    }
                    Err(LegacyError::Timeout) => {}
                    Err(e) => return Err(e.into()),
                },
                _ = ctx.done() => break,
            }

            // A backend may report Timeout without waiting; hold the poll cadence
            // ourselves so the runtime gets a chance to end the context.
            let remaining = self.poll_interval.saturating_sub(started.elapsed());
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = ctx.done() => break,
            }
        }

        warn!("gave up waiting for legacy cache to close");
        Err(Error::Timeout)
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn CacheMulti>> {
        Some(self)
    }
}

#[async_trait]
impl CacheMulti for LegacyToModern {
    async fn set_multi(&self, _ctx: &Context, items: Vec<CacheItem>) -> Result<()> {
        let Some(multi) = &self.caps.multi else {
            return Err(Error::NotImplemented);
        };

        if items.iter().any(|item| item.ttl.is_some()) {
            if let Some(with_ttl) = &self.caps.ttl {
                let items = items
                    .into_iter()
                    .map(|item| (item.key, TtlItem::new(item.value, item.ttl)))
                    .collect();
                return Ok(with_ttl.set_multi_with_ttl(items).await?);
            }
            debug!("dropping ttls from batch of {}: backend has no ttl support", items.len());
        }

        let items = items.into_iter().map(|item| (item.key, item.value)).collect();
        Ok(multi.set_multi(items).await?)
    }
}
