//! Durable key-value storage backends for the local authority.
//!
//! Persistence is a string-per-namespace contract so the cart and wishlist
//! records stay independent and the medium stays swappable: a file on disk
//! for native hosts, an in-memory map for tests.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be serialized or parsed.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A synchronous, namespaced key-value medium.
///
/// `get`/`put` are whole-record operations: callers serialize the entire
/// collection for a namespace on every save. Cart and wishlist records are
/// small enough that partial updates are not worth the complexity.
pub trait StorageBackend: Send + Sync {
    /// Read the record stored under `namespace`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the medium cannot be read.
    fn get(&self, namespace: &str) -> Result<Option<String>, StorageError>;

    /// Replace the record stored under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the medium cannot be written.
    fn put(&self, namespace: &str, value: &str) -> Result<(), StorageError>;
}

/// File-per-namespace backend for native hosts.
///
/// Writes go through a temporary file and an atomic rename so a crash
/// mid-write never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, namespace: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(namespace);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, namespace: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(namespace);
        let tmp = tmp_path(&path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(namespace, path = %path.display(), "persisted record");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with a record, for corrupt-state tests.
    #[must_use]
    pub fn with_record(namespace: &str, value: &str) -> Self {
        let backend = Self::new();
        backend
            .lock_records()
            .insert(namespace.to_string(), value.to_string());
        backend
    }

    fn lock_records(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, namespace: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock_records().get(namespace).cloned())
    }

    fn put(&self, namespace: &str, value: &str) -> Result<(), StorageError> {
        self.lock_records()
            .insert(namespace.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path());

        assert!(backend.get("opaline.cart").expect("read").is_none());

        backend.put("opaline.cart", "[1,2,3]").expect("write");
        assert_eq!(
            backend.get("opaline.cart").expect("read").as_deref(),
            Some("[1,2,3]")
        );

        // Overwrite replaces the whole record.
        backend.put("opaline.cart", "[]").expect("write");
        assert_eq!(
            backend.get("opaline.cart").expect("read").as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_file_backend_namespaces_are_independent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path());

        backend.put("opaline.cart", "cart").expect("write");
        backend.put("opaline.wishlist", "wishlist").expect("write");

        assert_eq!(
            backend.get("opaline.cart").expect("read").as_deref(),
            Some("cart")
        );
        assert_eq!(
            backend.get("opaline.wishlist").expect("read").as_deref(),
            Some("wishlist")
        );
    }

    #[test]
    fn test_file_backend_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path());
        backend.put("opaline.cart", "[]").expect("write");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec!["opaline.cart.json"]);
    }

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.get("ns").expect("read").is_none());
        backend.put("ns", "value").expect("write");
        assert_eq!(backend.get("ns").expect("read").as_deref(), Some("value"));
    }
}
