//! One-time capability checks performed when an adapter wraps a backend.
//!
//! A probe only asks the backend's type whether it also implements an optional
//! surface; it never calls into the backend's data path. The answer is kept for
//! the adapter's lifetime.

use crate::legacy::{LegacyCache, LegacyCacheMulti, LegacyCacheWithTtl};
use crate::ports::{Cache, CacheMulti};
use std::fmt;
use std::sync::Arc;

/// Optional surfaces found on a legacy backend.
#[derive(Clone, Default)]
pub struct LegacyCapabilities {
    pub ttl: Option<Arc<dyn LegacyCacheWithTtl>>,
    pub multi: Option<Arc<dyn LegacyCacheMulti>>,
}

impl LegacyCapabilities {
    pub fn probe(cache: &Arc<dyn LegacyCache>) -> Self {
        Self {
            ttl: cache.clone().as_ttl(),
            multi: cache.clone().as_multi(),
        }
    }

    pub fn has_ttl(&self) -> bool {
        self.ttl.is_some()
    }

    pub fn has_multi(&self) -> bool {
        self.multi.is_some()
    }
}

impl fmt::Debug for LegacyCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyCapabilities")
            .field("ttl", &self.has_ttl())
            .field("multi", &self.has_multi())
            .finish()
    }
}

/// Optional surfaces found on a modern backend. TTL is part of the modern core
/// contract, so batching is the only thing left to probe.
#[derive(Clone, Default)]
pub struct ModernCapabilities {
    pub multi: Option<Arc<dyn CacheMulti>>,
}

impl ModernCapabilities {
    pub fn probe(cache: &Arc<dyn Cache>) -> Self {
        Self {
            multi: cache.clone().as_multi(),
        }
    }

    pub fn has_multi(&self) -> bool {
        self.multi.is_some()
    }
}

impl fmt::Debug for ModernCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModernCapabilities")
            .field("multi", &self.has_multi())
            .finish()
    }
}
