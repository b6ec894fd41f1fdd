//! The legacy cache contract: no context on any call, TTL and batching as
//! optional extra surfaces, and a two-phase shutdown.

use async_trait::async_trait;
use bytes::Bytes;
use shared::LegacyResult;
use std::sync::Arc;
use std::time::Duration;

/// Value plus optional TTL, the unit of [`LegacyCacheWithTtl::set_multi_with_ttl`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TtlItem {
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl TtlItem {
    pub fn new(value: impl Into<Bytes>, ttl: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            ttl,
        }
    }
}

#[async_trait]
pub trait LegacyCache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> LegacyResult<Bytes>;
    async fn set(&self, key: &str, value: Bytes) -> LegacyResult<()>;
    async fn add(&self, key: &str, value: Bytes) -> LegacyResult<()>;
    async fn delete(&self, key: &str) -> LegacyResult<()>;

    /// Signals shutdown without waiting for it.
    fn close_async(&self);

    /// Waits up to `timeout` for shutdown to finish, returning
    /// [`shared::LegacyError::Timeout`] if it has not.
    async fn wait_for_close(&self, timeout: Duration) -> LegacyResult<()>;

    /// Capability probe for the TTL surface.
    fn as_ttl(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheWithTtl>> {
        None
    }

    /// Capability probe for the batch surface.
    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheMulti>> {
        None
    }
}

#[async_trait]
pub trait LegacyCacheWithTtl: LegacyCache {
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Option<Duration>)
    -> LegacyResult<()>;

    async fn add_with_ttl(&self, key: &str, value: Bytes, ttl: Option<Duration>)
    -> LegacyResult<()>;

    async fn set_multi_with_ttl(&self, items: Vec<(String, TtlItem)>) -> LegacyResult<()>;
}

#[async_trait]
pub trait LegacyCacheMulti: LegacyCache {
    async fn set_multi(&self, items: Vec<(String, Bytes)>) -> LegacyResult<()>;
}
