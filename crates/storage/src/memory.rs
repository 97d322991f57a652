use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::{KeyValueStore, Result, StorageError, StoreWrite};

/// In-memory store, used in tests and for sessions that need no durability.
///
/// Clones share the same map, so a cart engine and a checkout session built
/// from clones of one store see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    /// Returns how many write operations (set, remove or batch) were applied.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Removes every key.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_batch(&self, writes: Vec<StoreWrite>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        for write in writes {
            match write {
                StoreWrite::Set { key, value } => {
                    entries.insert(key, value);
                }
                StoreWrite::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
