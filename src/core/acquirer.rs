// imagen/src/core/acquirer.rs
use super::{Result, ServiceError};
use crate::storage::{BlobStore, ImageRecord, MetadataStore};
use bytes::Bytes;
use std::sync::Arc;

/// Resolves an image id to the original encoded bytes.
#[derive(Clone)]
pub struct SourceAcquirer {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SourceAcquirer {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { metadata, blobs }
    }

    pub async fn record(&self, image_id: &str) -> Result<ImageRecord> {
        self.metadata
            .get(image_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("image not found".to_string()))
    }

    /// Look up `image_id` and fetch its bytes. Failures are returned as-is,
    /// nothing is retried.
    pub async fn acquire(&self, image_id: &str) -> Result<Bytes> {
        let record = self.record(image_id).await?;
        log::debug!("Acquiring {} from {}", image_id, record.locator);

        let bytes = self.blobs.fetch(&record.locator).await?;
        if bytes.is_empty() {
            log::warn!("Source for {} is empty", image_id);
        }
        Ok(bytes)
    }
}
