use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{KeyValueStore, Result, StorageError, StoreWrite};

/// Durable store kept as a single JSON object on disk.
///
/// The whole document lives in memory and every write replaces the file by
/// writing a sibling temp file and renaming it over the original, so a
/// reload sees either the previous or the new document, never a mix.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<Mutex<FileState>>,
}

#[derive(Debug)]
struct FileState {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`, reading any existing document.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| {
                StorageError::Serialization {
                    key: path.display().to_string(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        Ok(Self {
            inner: Arc::new(Mutex::new(FileState { path, entries })),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> Result<PathBuf> {
        let state = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(state.path.clone())
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut state = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = state.entries.clone();
        apply(&mut next);
        persist(&state.path, &next)?;
        state.entries = next;
        Ok(())
    }
}

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(entries).map_err(|source| {
        StorageError::Serialization {
            key: path.display().to_string(),
            source,
        }
    })?;

    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(&encoded).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(io_err)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn write_batch(&self, writes: Vec<StoreWrite>) -> Result<()> {
        self.mutate(|entries| {
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
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(store.get("carrinho").unwrap(), None);
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set("carrinho", "[]").unwrap();
        store.set("formaPagamento", "boleto").unwrap();
        store.remove("formaPagamento").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("carrinho").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("formaPagamento").unwrap(), None);
    }

    #[test]
    fn batch_is_applied_in_one_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();

        store
            .write_batch(vec![StoreWrite::remove("a"), StoreWrite::set("b", "2")])
            .unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ broken").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }
}
