//! Durable key-value storage and the selection persistence adapter.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use regimen_core::{Product, RegimenError, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Slot holding the selected products unless configured otherwise.
pub const DEFAULT_SELECTION_SLOT: &str = "selected_products";

/// Trait for durable string slots.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a slot. Absent slots are `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a slot. Deleting an absent slot is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory implementation of KeyValueStore.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.slots.write().await.remove(key);
        Ok(())
    }
}

/// File-backed KeyValueStore: slot `k` lives in `<dir>/k.json`.
///
/// Writes go to a temp file that is renamed over the slot, so a crash never
/// leaves a half-written slot behind.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_slot_name(key) {
            return Err(storage_error(key, "invalid slot name"));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Slot names map to file names: ASCII alphanumerics, `_`, `-` and `.`,
/// without a leading dot.
pub fn is_valid_slot_name(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn storage_error(slot: &str, message: impl ToString) -> RegimenError {
    RegimenError::Storage {
        slot: slot.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error(key, e))?;

        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| storage_error(key, e))?;
        file.write_all(value.as_bytes())
            .await
            .map_err(|e| storage_error(key, e))?;
        // Durable before it replaces the previous slot.
        file.sync_all().await.map_err(|e| storage_error(key, e))?;
        drop(file);

        fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(key, e))?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote slot");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(key, e)),
        }
    }
}

/// Reads and writes the selection to one named slot.
///
/// Both directions are best-effort: a corrupt slot is discarded and a failed
/// write is logged, never returned.
#[derive(Clone)]
pub struct SelectionPersistence {
    store: Arc<dyn KeyValueStore>,
    slot: String,
}

impl SelectionPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    /// Persistence over the default slot.
    pub fn with_default_slot(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_SELECTION_SLOT)
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Load the stored selection. Never fails.
    pub async fn load(&self) -> Vec<Product> {
        let raw = match self.store.get(&self.slot).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to read selection; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Product>>(&raw) {
            Ok(products) => dedupe_by_id(products),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Discarding corrupt selection");
                if let Err(e) = self.store.remove(&self.slot).await {
                    warn!(slot = %self.slot, error = %e, "Failed to clear corrupt selection");
                }
                Vec::new()
            }
        }
    }

    /// Write the selection. Failures are logged and swallowed.
    pub async fn save(&self, products: &[Product]) {
        let raw = match serde_json::to_string(products) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to serialize selection");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.slot, &raw).await {
            warn!(slot = %self.slot, error = %e, "Failed to save selection");
        }
    }
}

fn dedupe_by_id(products: Vec<Product>) -> Vec<Product> {
    let mut unique: Vec<Product> = Vec::with_capacity(products.len());
    for product in products {
        if !unique.iter().any(|p| p.id == product.id) {
            unique.push(product);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, key: &str, _value: &str) -> Result<()> {
            Err(storage_error(key, "quota exceeded"))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn sample() -> Vec<Product> {
        vec![
            Product::new("p1", "Cleanser", "X", "cleanser"),
            Product::new("p2", "Serum", "Y", "serum").with_description("Vitamin C"),
        ]
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let persistence = SelectionPersistence::with_default_slot(store);

        persistence.save(&sample()).await;
        assert_eq!(persistence.load().await, sample());
    }

    #[tokio::test]
    async fn test_missing_slot_is_empty() {
        let persistence =
            SelectionPersistence::with_default_slot(Arc::new(MemoryKeyValueStore::new()));
        assert!(persistence.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_slot_is_cleared() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let persistence = SelectionPersistence::with_default_slot(store.clone());

        for raw in ["{not json", r#"{"products": []}"#, r#"[{"id": "p1"}]"#] {
            store.set(DEFAULT_SELECTION_SLOT, raw).await.unwrap();
            assert!(persistence.load().await.is_empty(), "{raw}");
            assert_eq!(store.get(DEFAULT_SELECTION_SLOT).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_duplicates_collapse_on_load() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .set(
                DEFAULT_SELECTION_SLOT,
                r#"[{"id": 1, "name": "a", "brand": "b", "category": "c"},
                    {"id": "1", "name": "dup", "brand": "b", "category": "c"}]"#,
            )
            .await
            .unwrap();

        let loaded = SelectionPersistence::with_default_slot(store).load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "a");
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let persistence = SelectionPersistence::new(Arc::new(ReadOnlyStore), "slot");
        persistence.save(&sample()).await;
        assert!(persistence.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("data"));

        assert_eq!(store.get("slot").await.unwrap(), None);
        store.set("slot", "[]").await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data/slot.json").exists());

        store.remove("slot").await.unwrap();
        store.remove("slot").await.unwrap();
        assert_eq!(store.get("slot").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        assert!(store.set("../escape", "x").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_replaces_slot_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        store.set("slot", "[1]").await.unwrap();
        store.set("slot", "[2]").await.unwrap();

        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("[2]"));
        assert!(!dir.path().join("slot.json.tmp").exists());
    }

    #[test]
    fn test_slot_names() {
        for valid in ["selected_products", "v2.picks", "a-b"] {
            assert!(is_valid_slot_name(valid), "{valid}");
        }
        for invalid in ["", ".hidden", "my/slot", "a b", "..", "slot\\x"] {
            assert!(!is_valid_slot_name(invalid), "{invalid}");
        }
    }
}
