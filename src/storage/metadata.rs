// imagen/src/storage/metadata.rs
use super::{sort_newest_first, ImageRecord, MetadataStore};
use crate::core::{Result, ServiceError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<String, ImageRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_records(records: Vec<ImageRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(map),
        }
    }

    async fn remove(&self, id: &str) {
        self.records.write().await.remove(id);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, id: &str, locator: &str) -> Result<ImageRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(ServiceError::Storage(format!("image id already exists: {}", id)));
        }

        let record = ImageRecord {
            id: id.to_string(),
            locator: locator.to_string(),
            created_at: Utc::now(),
        };
        records.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<ImageRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ImageRecord>> {
        let mut records: Vec<ImageRecord> = self.records.read().await.values().cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

/// Metadata kept in memory and mirrored to a JSON file on every write.
pub struct JsonFileMetadataStore {
    path: PathBuf,
    inner: InMemoryMetadataStore,
    write_lock: Mutex<()>,
}

impl JsonFileMetadataStore {
    /// Load existing records from `path`; a missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let records: Vec<ImageRecord> = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                ServiceError::Storage(format!(
                    "Failed to parse metadata file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Loaded {} image records from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            inner: InMemoryMetadataStore::from_records(records),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(&self) -> Result<()> {
        let records = self.inner.list().await?;
        let data = serde_json::to_vec_pretty(&records)
            .map_err(|e| ServiceError::Storage(format!("Failed to serialize metadata: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonFileMetadataStore {
    async fn put(&self, id: &str, locator: &str) -> Result<ImageRecord> {
        let _guard = self.write_lock.lock().await;

        let record = self.inner.put(id, locator).await?;
        if let Err(e) = self.persist().await {
            log::warn!("Failed to persist metadata for {}: {}", id, e);
            self.inner.remove(id).await;
            return Err(e);
        }
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<ImageRecord>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<ImageRecord>> {
        self.inner.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryMetadataStore::new();
        let record = store.put("a", "/tmp/a.png").await.unwrap();
        assert_eq!(record.locator, "/tmp/a.png");
        assert_eq!(store.get("a").await.unwrap(), Some(record));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = InMemoryMetadataStore::new();
        store.put("a", "one").await.unwrap();
        let result = store.put("a", "two").await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert_eq!(store.get("a").await.unwrap().unwrap().locator, "one");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryMetadataStore::new();
        store.put("first", "1").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.put("second", "2").await.unwrap();

        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn json_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta").join("images.json");

        let store = JsonFileMetadataStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        let record = store.put("x", "https://example.com/x.png").await.unwrap();
        drop(store);

        let reopened = JsonFileMetadataStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("x").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_the_record() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("meta");
        let store = JsonFileMetadataStore::open(parent.join("images.json")).await.unwrap();

        // A regular file where the parent directory should be.
        std::fs::write(&parent, b"").unwrap();
        assert!(store.put("x", "/tmp/x.png").await.is_err());
        assert_eq!(store.get("x").await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());

        std::fs::remove_file(&parent).unwrap();
        let record = store.put("x", "/tmp/x.png").await.unwrap();
        assert_eq!(store.get("x").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn corrupt_json_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = JsonFileMetadataStore::open(&path).await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));
    }
}
