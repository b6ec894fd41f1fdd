// Ports are the pluggable extension points for cache implementations.
// This module holds the context-aware contract; `legacy` holds the older one.

use crate::context::Context;
use async_trait::async_trait;
use bytes::Bytes;
use shared::Result;
use std::sync::Arc;
use std::time::Duration;

/// One entry of a multi-key write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheItem {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl CacheItem {
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>, ttl: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl,
        }
    }
}

/// Context-aware cache contract.
///
/// `ttl` of `None` leaves expiry to the implementation; `Some(Duration::ZERO)`
/// is a real TTL and must not be treated as absent.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Returns [`shared::Error::KeyNotFound`] when the key is absent.
    async fn get(&self, ctx: &Context, key: &str) -> Result<Bytes>;

    async fn set(&self, ctx: &Context, key: &str, value: Bytes, ttl: Option<Duration>)
    -> Result<()>;

    /// Conditional insert. Returns [`shared::Error::KeyAlreadyExists`] and
    /// leaves the stored value alone when the key is present.
    async fn add(&self, ctx: &Context, key: &str, value: Bytes, ttl: Option<Duration>)
    -> Result<()>;

    async fn delete(&self, ctx: &Context, key: &str) -> Result<()>;

    /// Blocks until the cache has released its resources or `ctx` ends.
    async fn close(&self, ctx: &Context) -> Result<()>;

    /// Capability probe for native multi-key writes.
    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn CacheMulti>> {
        None
    }
}

/// Optional native batch write.
#[async_trait]
pub trait CacheMulti: Cache {
    async fn set_multi(&self, ctx: &Context, items: Vec<CacheItem>) -> Result<()>;
}
