#![deny(clippy::all)]

//! Cache contract reconciliation for the pipeline runtime.
//!
//! Two generations of the cache plugin contract live side by side: the legacy
//! one ([`legacy::LegacyCache`]) has no context and a two-phase shutdown, the
//! modern one ([`ports::Cache`]) takes a [`context::Context`] on every call and
//! closes in a single blocking step. [`adapters`] wraps either generation so it
//! can be driven through the other.

pub mod adapters;
pub mod context;
pub mod legacy;
pub mod metrics;
pub mod ports;
pub mod probe;
pub mod shutdown;

pub use adapters::{LegacyToModern, ModernToLegacy};
pub use context::Context;
pub use shared::{BackendError, Error, ErrorKind, LegacyError, LegacyResult, Result};
