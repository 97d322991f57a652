use crate::Result;

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Sets `key` to `value`.
    Set { key: String, value: String },
    /// Removes `key` if present.
    Remove { key: String },
}

impl StoreWrite {
    /// Builds a set write.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a remove write.
    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }

    /// Returns the key this write touches.
    pub fn key(&self) -> &str {
        match self {
            StoreWrite::Set { key, .. } | StoreWrite::Remove { key } => key,
        }
    }
}

/// Core trait for the persisted key-value store.
///
/// Values are opaque strings; structured values are JSON encoded by the
/// callers (see [`crate::JsonStoreExt`]). Every operation completes
/// synchronously, so the in-memory state of a caller and the persisted
/// representation never diverge between two operations.
///
/// Implementations must be thread-safe (Send + Sync) and are expected to be
/// cheap to clone, with clones sharing the same backing data.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Applies several writes.
    ///
    /// The default applies them in order; durable implementations override
    /// this so the whole batch lands in a single replacement.
    fn write_batch(&self, writes: Vec<StoreWrite>) -> Result<()> {
        for write in writes {
            match write {
                StoreWrite::Set { key, value } => self.set(&key, &value)?,
                StoreWrite::Remove { key } => self.remove(&key)?,
            }
        }
        Ok(())
    }
}
