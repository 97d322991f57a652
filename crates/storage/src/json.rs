use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{KeyValueStore, Result, StorageError};

/// Typed JSON access on top of any [`KeyValueStore`].
pub trait JsonStoreExt: KeyValueStore {
    /// Reads and decodes the value under `key`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Serialization {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encodes `value` and stores it under `key`.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = encode_json(key, value)?;
        self.set(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {}

/// Encodes a value for `key` without writing it, for use in batches.
pub fn encode_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}
