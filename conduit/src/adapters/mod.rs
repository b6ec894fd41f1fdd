//! Wrappers translating between the two cache contract generations.
//!
//! [`ModernToLegacy`] lets legacy call sites drive a context-aware backend,
//! [`LegacyToModern`] lets context-aware call sites drive a legacy backend.
//! Both map the not-found / already-exists / timed-out conditions onto the
//! caller's own error type and pass every other backend error through as is.

pub mod forward;
pub mod reverse;

#[cfg(test)]
pub(crate) mod testing;

pub use forward::ModernToLegacy;
pub use reverse::LegacyToModern;
