// imagen/src/storage/mod.rs
//! Metadata and blob storage behind swappable traits.

mod blob;
mod metadata;

pub use blob::{
    BlobRouter, HttpBlobStore, LocalBlobStore, StorageBackend, DEFAULT_MAX_FETCH_BYTES,
};
pub use metadata::{InMemoryMetadataStore, JsonFileMetadataStore};

use crate::core::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An uploaded image: its id and where its bytes live. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub locator: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Register a new record. Ids are never overwritten.
    async fn put(&self, id: &str, locator: &str) -> Result<ImageRecord>;

    async fn get(&self, id: &str) -> Result<Option<ImageRecord>>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ImageRecord>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` and return their locator.
    async fn store(&self, bytes: Bytes) -> Result<String>;

    async fn fetch(&self, locator: &str) -> Result<Bytes>;
}

/// Where a locator points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local(PathBuf),
    Remote(Url),
}

impl Locator {
    /// `http`/`https` URLs are remote, `file://` URLs and everything else are
    /// local paths.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Locator::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Locator::Local(path),
                Err(()) => Locator::Local(PathBuf::from(raw)),
            },
            _ => Locator::Local(PathBuf::from(raw)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

fn sort_newest_first(records: &mut [ImageRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
