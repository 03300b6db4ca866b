// imagen/src/storage/blob.rs
use super::{BlobStore, Locator};
use crate::core::{Result, ServiceError};
use crate::utils::extension_for_bytes;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Url};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Which store receives new uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Local,
    Remote,
}

/// Blobs as files under a root directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let path = match Locator::parse(locator) {
            Locator::Local(path) => path,
            Locator::Remote(url) => {
                return Err(ServiceError::Storage(format!(
                    "not a local locator: {}",
                    url
                )))
            }
        };

        let escapes = path.components().any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(ServiceError::Storage(format!(
                "locator outside storage root: {}",
                locator
            )));
        }

        Ok(path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: Bytes) -> Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let name = format!("{}.{}", Uuid::new_v4(), extension_for_bytes(&bytes));
        let path = self.root.join(name);
        tokio::fs::write(&path, &bytes).await?;

        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn fetch(&self, locator: &str) -> Result<Bytes> {
        let path = self.resolve(locator)?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Blob missing on disk: {}", path.display());
                Err(ServiceError::NotFound("file missing".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Largest remote original read into memory unless configured otherwise.
pub const DEFAULT_MAX_FETCH_BYTES: usize = 50 * 1024 * 1024;

/// Blobs behind plain HTTP(S) URLs.
pub struct HttpBlobStore {
    client: Client,
    upload_base: Option<Url>,
    max_body_bytes: usize,
}

impl HttpBlobStore {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upload_base: None,
            max_body_bytes: DEFAULT_MAX_FETCH_BYTES,
        })
    }

    /// Enable uploads via `PUT <base>/<uuid>.<ext>`. The base is treated as a
    /// directory whether or not it ends in `/`.
    pub fn with_upload_base(mut self, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.upload_base = Some(base);
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn too_large(&self, url: &Url) -> ServiceError {
        log::warn!("Body of {} exceeds {} bytes", url, self.max_body_bytes);
        ServiceError::UpstreamFetch(format!(
            "remote body exceeds {} bytes",
            self.max_body_bytes
        ))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn store(&self, bytes: Bytes) -> Result<String> {
        let base = self
            .upload_base
            .as_ref()
            .ok_or_else(|| ServiceError::Storage("remote store is read-only".to_string()))?;

        let name = format!("{}.{}", Uuid::new_v4(), extension_for_bytes(&bytes));
        let url = base
            .join(&name)
            .map_err(|e| ServiceError::Storage(format!("invalid upload url: {}", e)))?;

        let response = self
            .client
            .put(url.clone())
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::UpstreamFetch(format!("upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::UpstreamFetch(format!(
                "upload to {} failed with status {}",
                url,
                response.status()
            )));
        }

        Ok(url.to_string())
    }

    async fn fetch(&self, locator: &str) -> Result<Bytes> {
        let url = match Locator::parse(locator) {
            Locator::Remote(url) => url,
            Locator::Local(_) => {
                return Err(ServiceError::Storage(format!(
                    "not a remote locator: {}",
                    locator
                )))
            }
        };

        log::debug!("Fetching {}", url);

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            log::warn!("Fetch of {} failed: {}", url, e);
            ServiceError::UpstreamFetch(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Fetch of {} returned {}", url, status);
            return Err(ServiceError::UpstreamFetch(format!(
                "remote responded with status {}",
                status
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(self.too_large(&url));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ServiceError::UpstreamFetch(format!("failed to read body: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large(&url));
            }
            body.extend_from_slice(&chunk);
        }

        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }
}

/// The single blob store the service talks to: reads dispatch on the locator,
/// writes go to the configured backend.
pub struct BlobRouter {
    local: LocalBlobStore,
    remote: HttpBlobStore,
    backend: StorageBackend,
}

impl BlobRouter {
    pub fn new(local: LocalBlobStore, remote: HttpBlobStore, backend: StorageBackend) -> Self {
        Self {
            local,
            remote,
            backend,
        }
    }
}

#[async_trait]
impl BlobStore for BlobRouter {
    async fn store(&self, bytes: Bytes) -> Result<String> {
        match self.backend {
            StorageBackend::Local => self.local.store(bytes).await,
            StorageBackend::Remote => self.remote.store(bytes).await,
        }
    }

    async fn fetch(&self, locator: &str) -> Result<Bytes> {
        if Locator::parse(locator).is_remote() {
            self.remote.fetch(locator).await
        } else {
            self.local.fetch(locator).await
        }
    }
}
