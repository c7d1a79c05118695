//! Durable storage for the remembered checkout ID.
//!
//! Storage is a capability, not a requirement: every adapter reports whether
//! it is usable through [`CheckoutIdStore::is_available`], and callers must
//! check that before reading or writing. An unavailable store is a normal
//! steady state (disabled storage, no state directory configured).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Well-known storage keys.
pub mod storage_keys {
    /// The remembered remote checkout ID.
    pub const CHECKOUT_ID: &str = "shopify_checkout_id";
}

/// Errors writing to a checkout ID store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

/// A durable string key-value store, gated by an availability probe.
pub trait CheckoutIdStore: Send + Sync {
    /// Whether the store can currently be used.
    fn is_available(&self) -> bool;

    /// Read a value. Returns `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process store. Always available; forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CheckoutIdStore for MemoryStore {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// DisabledStore
// =============================================================================

/// A store that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

impl CheckoutIdStore for DisabledStore {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// JSON-file store inside a state directory.
///
/// Available only while the directory exists. Writes go to a temporary file
/// that is renamed over the previous one, so readers never see a torn file.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    const FILE_NAME: &'static str = "checkout.json";

    /// Create a store rooted at `dir`. The directory is not created.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }

    fn read_all(path: &Path) -> Result<HashMap<String, String>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CheckoutIdStore for FileStore {
    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }

    fn get(&self, key: &str) -> Option<String> {
        match Self::read_all(&self.path()) {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                debug!(path = %self.path().display(), error = %e, "Unreadable checkout store");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let path = self.path();
        // Start over rather than fail when the previous file is corrupt
        let mut values = Self::read_all(&path).unwrap_or_default();
        values.insert(key.to_string(), value.to_string());

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&values)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("checkout-store-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_available());
        assert_eq!(store.get(storage_keys::CHECKOUT_ID), None);

        store.set(storage_keys::CHECKOUT_ID, "c1").unwrap();
        assert_eq!(store.get(storage_keys::CHECKOUT_ID).as_deref(), Some("c1"));
    }

    #[test]
    fn test_disabled_store_is_unavailable() {
        let store = DisabledStore;
        assert!(!store.is_available());
        assert!(matches!(
            store.set(storage_keys::CHECKOUT_ID, "c1"),
            Err(StoreError::Unavailable)
        ));
    }

    #[test]
    fn test_file_store_unavailable_without_dir() {
        let store = FileStore::new(std::env::temp_dir().join("checkout-store-missing-dir"));
        assert!(!store.is_available());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = temp_dir();

        FileStore::new(&dir)
            .set(storage_keys::CHECKOUT_ID, "gid://shopify/Checkout/c1")
            .unwrap();

        let reopened = FileStore::new(&dir);
        assert!(reopened.is_available());
        assert_eq!(
            reopened.get(storage_keys::CHECKOUT_ID).as_deref(),
            Some("gid://shopify/Checkout/c1")
        );

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_overwrites_corrupt_file() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);
        fs::write(store.path(), b"not json").unwrap();

        assert_eq!(store.get(storage_keys::CHECKOUT_ID), None);
        store.set(storage_keys::CHECKOUT_ID, "c2").unwrap();
        assert_eq!(store.get(storage_keys::CHECKOUT_ID).as_deref(), Some("c2"));

        fs::remove_dir_all(dir).unwrap();
    }
}
