// imagen/src/core/service.rs
use super::acquirer::SourceAcquirer;
use super::params::RenditionRequest;
use super::processor::ImageProcessor;
use super::{Result, ServiceError};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionKind {
    /// Resampled and quantized, encoder default quality.
    Digitized,
    /// Resampled, quantized and encoded at an explicit quality.
    Compressed,
}

impl fmt::Display for RenditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenditionKind::Digitized => write!(f, "digitized"),
            RenditionKind::Compressed => write!(f, "compressed"),
        }
    }
}

impl RenditionKind {
    /// Keep only the parameters this kind accepts. Compressed renditions
    /// require a quality, digitized ones drop it.
    pub fn prepare(&self, mut request: RenditionRequest) -> Result<RenditionRequest> {
        match self {
            RenditionKind::Digitized => request.quality = None,
            RenditionKind::Compressed if request.quality.is_none() => {
                return Err(ServiceError::InvalidParameter("missing quality".to_string()))
            }
            RenditionKind::Compressed => {}
        }
        Ok(request)
    }
}

/// Acquire the source, then transform it off the async executor.
#[derive(Clone)]
pub struct RenditionService {
    acquirer: SourceAcquirer,
    processor: Arc<ImageProcessor>,
}

impl RenditionService {
    pub fn new(acquirer: SourceAcquirer, processor: Arc<ImageProcessor>) -> Self {
        Self {
            acquirer,
            processor,
        }
    }

    pub fn acquirer(&self) -> &SourceAcquirer {
        &self.acquirer
    }

    pub async fn render(
        &self,
        image_id: &str,
        kind: RenditionKind,
        request: RenditionRequest,
    ) -> Result<Bytes> {
        let raw = self.acquirer.acquire(image_id).await?;
        let request = kind.prepare(request)?;

        let processor = self.processor.clone();
        let encoded = tokio::task::spawn_blocking(move || processor.transform(&raw, &request))
            .await
            .map_err(|e| ServiceError::Internal(format!("transform task failed: {}", e)))??;

        log::info!(
            "Rendered {} rendition of {} ({} bytes)",
            kind,
            image_id,
            encoded.len()
        );
        Ok(Bytes::from(encoded))
    }
}
