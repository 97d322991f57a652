use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or writing the persisted store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read or replaced.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A writer panicked while holding the store lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;
