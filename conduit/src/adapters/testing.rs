//! In-memory doubles for both contract generations. They record what reached
//! them (values, TTLs, batches, close calls) so tests can assert on it.

use crate::context::Context;
use crate::legacy::{LegacyCache, LegacyCacheMulti, LegacyCacheWithTtl, TtlItem};
use crate::metrics::Metrics;
use crate::ports::{Cache, CacheItem, CacheMulti};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Error, LegacyError, LegacyResult, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stored {
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl Stored {
    pub fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: Bytes::copy_from_slice(value.as_bytes()),
            ttl,
        }
    }
}

fn to_map<'a>(entries: impl IntoIterator<Item = (&'a str, Stored)>) -> HashMap<String, Stored> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[derive(Default)]
pub struct RecordingMetrics {
    names: Mutex<Vec<&'static str>>,
}

impl RecordingMetrics {
    pub fn count(&self, name: &str) -> usize {
        self.names
            .lock()
            .unwrap()
            .iter()
            .filter(|n| **n == name)
            .count()
    }
}

impl Metrics for RecordingMetrics {
    fn incr(&self, name: &'static str) {
        self.names.lock().unwrap().push(name);
    }
}

/// Modern-contract double.
#[derive(Default)]
pub struct TestCache {
    entries: Mutex<HashMap<String, Stored>>,
    batches: Mutex<Vec<Vec<CacheItem>>>,
    set_order: Mutex<Vec<String>>,
    error: Option<Error>,
    fail_on: Option<(String, Error)>,
    close_error: Option<Error>,
    native_multi: bool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl TestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, Stored)>) -> Self {
        Self {
            entries: Mutex::new(to_map(entries)),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, err: Error) -> Self {
        self.error = Some(err);
        self
    }

    pub fn failing_on(mut self, key: &str, err: Error) -> Self {
        self.fail_on = Some((key.to_string(), err));
        self
    }

    pub fn with_close_error(mut self, err: Error) -> Self {
        self.close_error = Some(err);
        self
    }

    pub fn with_native_multi(mut self) -> Self {
        self.native_multi = true;
        self
    }

    pub fn entries(&self) -> HashMap<String, Stored> {
        self.entries.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<CacheItem>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn set_order(&self) -> Vec<String> {
        self.set_order.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Cache for TestCache {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Bytes> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|stored| stored.value.clone())
            .ok_or(Error::KeyNotFound)
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.check()?;
        self.set_order.lock().unwrap().push(key.to_string());
        if let Some((fail_key, err)) = &self.fail_on {
            if fail_key == key {
                return Err(err.clone());
            }
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), Stored { value, ttl });
        Ok(())
    }

    async fn add(
        &self,
        _ctx: &Context,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Err(Error::KeyAlreadyExists);
        }
        entries.insert(key.to_string(), Stored { value, ttl });
        Ok(())
    }

    async fn delete(&self, _ctx: &Context, key: &str) -> Result<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn close(&self, _ctx: &Context) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.close_error {
            return Err(err.clone());
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn CacheMulti>> {
        if self.native_multi { Some(self) } else { None }
    }
}

#[async_trait]
impl CacheMulti for TestCache {
    async fn set_multi(&self, _ctx: &Context, items: Vec<CacheItem>) -> Result<()> {
        self.check()?;
        self.batches.lock().unwrap().push(items);
        Ok(())
    }
}

/// Legacy-contract double. Has the TTL surface unless told otherwise, and the
/// multi surface only when asked for.
pub struct TestLegacyCache {
    entries: Mutex<HashMap<String, Stored>>,
    multi_batches: Mutex<Vec<Vec<(String, TtlItem)>>>,
    ttl_batches: AtomicUsize,
    error: Option<LegacyError>,
    close_error: Option<LegacyError>,
    ttl: bool,
    multi: bool,
    /// Number of `wait_for_close` calls that time out before close completes.
    pending_waits: Option<usize>,
    /// Report `Timeout` from `wait_for_close` without waiting at all.
    instant_timeout: bool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    wait_calls: AtomicUsize,
}

impl Default for TestLegacyCache {
    fn default() -> Self {
        Self {
            entries: Mutex::default(),
            multi_batches: Mutex::default(),
            ttl_batches: AtomicUsize::new(0),
            error: None,
            close_error: None,
            ttl: true,
            multi: false,
            pending_waits: Some(0),
            instant_timeout: false,
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
        }
    }
}

impl TestLegacyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, Stored)>) -> Self {
        Self {
            entries: Mutex::new(to_map(entries)),
            ..Self::default()
        }
    }

    pub fn without_ttl(mut self) -> Self {
        self.ttl = false;
        self
    }

    pub fn with_multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn with_error(mut self, err: LegacyError) -> Self {
        self.error = Some(err);
        self
    }

    pub fn with_close_error(mut self, err: LegacyError) -> Self {
        self.close_error = Some(err);
        self
    }

    pub fn closing_after(mut self, waits: usize) -> Self {
        self.pending_waits = Some(waits);
        self
    }

    pub fn never_closing(mut self) -> Self {
        self.pending_waits = None;
        self
    }

    pub fn timing_out_instantly(mut self) -> Self {
        self.pending_waits = None;
        self.instant_timeout = true;
        self
    }

    pub fn entries(&self) -> HashMap<String, Stored> {
        self.entries.lock().unwrap().clone()
    }

    pub fn multi_batches(&self) -> Vec<Vec<(String, TtlItem)>> {
        self.multi_batches.lock().unwrap().clone()
    }

    pub fn ttl_batches(&self) -> usize {
        self.ttl_batches.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> LegacyResult<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn store(&self, key: &str, value: Bytes, ttl: Option<Duration>) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), Stored { value, ttl });
    }

    fn store_new(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> LegacyResult<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Err(LegacyError::KeyAlreadyExists);
        }
        entries.insert(key.to_string(), Stored { value, ttl });
        Ok(())
    }
}

#[async_trait]
impl LegacyCache for TestLegacyCache {
    async fn get(&self, key: &str) -> LegacyResult<Bytes> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|stored| stored.value.clone())
            .ok_or(LegacyError::KeyNotFound)
    }

    async fn set(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        self.check()?;
        self.store(key, value, None);
        Ok(())
    }

    async fn add(&self, key: &str, value: Bytes) -> LegacyResult<()> {
        self.check()?;
        self.store_new(key, value, None)
    }

    async fn delete(&self, key: &str) -> LegacyResult<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn close_async(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn wait_for_close(&self, timeout: Duration) -> LegacyResult<()> {
        let call = self.wait_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.close_error {
            return Err(err.clone());
        }
        match self.pending_waits {
            Some(pending) if call >= pending => Ok(()),
            _ => {
                if !self.instant_timeout {
                    tokio::time::sleep(timeout).await;
                }
                Err(LegacyError::Timeout)
            }
        }
    }

    fn as_ttl(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheWithTtl>> {
        if self.ttl { Some(self) } else { None }
    }

    fn as_multi(self: Arc<Self>) -> Option<Arc<dyn LegacyCacheMulti>> {
        if self.multi { Some(self) } else { None }
    }
}

#[async_trait]
impl LegacyCacheWithTtl for TestLegacyCache {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        self.check()?;
        self.store(key, value, ttl);
        Ok(())
    }

    async fn add_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> LegacyResult<()> {
        self.check()?;
        self.store_new(key, value, ttl)
    }

    async fn set_multi_with_ttl(&self, items: Vec<(String, TtlItem)>) -> LegacyResult<()> {
        self.check()?;
        self.ttl_batches.fetch_add(1, Ordering::SeqCst);
        self.multi_batches.lock().unwrap().push(items);
        Ok(())
    }
}

#[async_trait]
impl LegacyCacheMulti for TestLegacyCache {
    async fn set_multi(&self, items: Vec<(String, Bytes)>) -> LegacyResult<()> {
        self.check()?;
        let items = items
            .into_iter()
            .map(|(key, value)| (key, TtlItem::new(value, None)))
            .collect();
        self.multi_batches.lock().unwrap().push(items);
        Ok(())
    }
}
