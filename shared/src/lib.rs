// shared/src/lib.rs

use std::fmt;
use std::sync::Arc;

pub mod config;

/// Condition carried by an error, independent of which contract generation raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyNotFound,
    KeyAlreadyExists,
    Timeout,
    NotImplemented,
    Backend,
}

/// Opaque error raised by a wrapped backend.
///
/// Cloning shares the same underlying error, and equality is identity: two
/// `BackendError`s are equal only when they wrap the very same error value.
#[derive(Clone)]
pub struct BackendError(Arc<dyn std::error::Error + Send + Sync + 'static>);

impl BackendError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Build a backend error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(Message(message.into())))
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl PartialEq for BackendError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for BackendError {}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

/// Errors of the context-aware cache contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("key does not exist")]
    KeyNotFound,
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("action timed out")]
    Timeout,
    #[error("not implemented")]
    NotImplemented,
    #[error(transparent)]
    Backend(BackendError),
}

/// Errors of the legacy cache contract.
///
/// Carries the same conditions as [`Error`] but is a distinct type, so a value
/// always says which side of an adapter produced it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LegacyError {
    #[error("key does not exist")]
    KeyNotFound,
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("action timed out")]
    Timeout,
    #[error("not implemented")]
    NotImplemented,
    #[error(transparent)]
    Backend(BackendError),
}

impl Error {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(BackendError::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyNotFound => ErrorKind::KeyNotFound,
            Error::KeyAlreadyExists => ErrorKind::KeyAlreadyExists,
            Error::Timeout => ErrorKind::Timeout,
            Error::NotImplemented => ErrorKind::NotImplemented,
            Error::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl LegacyError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LegacyError::Backend(BackendError::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LegacyError::KeyNotFound => ErrorKind::KeyNotFound,
            LegacyError::KeyAlreadyExists => ErrorKind::KeyAlreadyExists,
            LegacyError::Timeout => ErrorKind::Timeout,
            LegacyError::NotImplemented => ErrorKind::NotImplemented,
            LegacyError::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<LegacyError> for Error {
    fn from(err: LegacyError) -> Self {
        match err {
            LegacyError::KeyNotFound => Error::KeyNotFound,
            LegacyError::KeyAlreadyExists => Error::KeyAlreadyExists,
            LegacyError::Timeout => Error::Timeout,
            LegacyError::NotImplemented => Error::NotImplemented,
            LegacyError::Backend(inner) => Error::Backend(inner),
        }
    }
}

impl From<Error> for LegacyError {
    fn from(err: Error) -> Self {
        match err {
            Error::KeyNotFound => LegacyError::KeyNotFound,
            Error::KeyAlreadyExists => LegacyError::KeyAlreadyExists,
            Error::Timeout => LegacyError::Timeout,
            Error::NotImplemented => LegacyError::NotImplemented,
            Error::Backend(inner) => LegacyError::Backend(inner),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
pub type LegacyResult<T> = std::result::Result<T, LegacyError>;
