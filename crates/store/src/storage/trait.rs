use std::sync::Arc;

use thiserror::Error;

/// Storage operation error.
///
/// These are **infrastructure errors** (IO, encoding) as opposed to domain
/// errors (validation, unknown members).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read '{target}': {source}")]
    Read {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{target}': {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored payload is not the expected JSON shape.
    #[error("corrupt payload under '{target}': {source}")]
    Corrupt {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{target}': {source}")]
    Encode {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Persistent string key/value storage (the browser's `localStorage`, a data
/// directory, or plain memory).
///
/// ## Semantics
///
/// - `get` returns `Ok(None)` for keys never written.
/// - `set` replaces the whole value; a later `get` sees either the previous
///   or the new value, never a mix.
/// - `remove` on a missing key is a no-op.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStorage for Arc<S>
where
    S: KeyValueStorage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
