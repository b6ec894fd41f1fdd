//! In-process cache backends, one per contract generation.

pub mod memory_cache;
pub mod moka_cache;

pub use memory_cache::MemoryCache;
pub use moka_cache::MokaCache;
