/// Sink for adapter counters. Emission is up to the implementation.
pub trait Metrics: Send + Sync + 'static {
    fn incr(&self, name: &'static str);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn incr(&self, _name: &'static str) {}
}

pub const SET_MULTI_FALLBACK: &str = "cache.set_multi.fallback";
pub const CLOSE_TIMEOUT: &str = "cache.close.timeout";
