// imagen/src/processors/compressor.rs
use crate::core::{Result, ServiceError};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

/// JPEG encoder for finished renditions.
#[derive(Default)]
pub struct Compressor;

impl Compressor {
    pub fn new() -> Self {
        Self
    }

    /// Encode as baseline JPEG. `None` keeps the encoder's default quality;
    /// `Some(0)` is the lowest fidelity and maps to the encoder's minimum setting.
    pub fn compress_to_bytes(&self, image: &RgbImage, quality: Option<u8>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        let mut encoder = match quality {
            Some(q) => JpegEncoder::new_with_quality(&mut buffer, q.clamp(1, 100)),
            None => JpegEncoder::new(&mut buffer),
        };

        encoder
            .encode_image(image)
            .map_err(|e| ServiceError::Encode(format!("JPEG encoding failed: {}", e)))?;

        log::debug!(
            "Encoded {}x{} JPEG (quality: {}): {} bytes",
            image.width(),
            image.height(),
            quality
                .map(|q| q.to_string())
                .unwrap_or_else(|| "default".to_string()),
            buffer.len()
        );

        Ok(buffer)
    }

    pub fn calculate_savings(&self, original_size: u64, compressed_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }

        let savings = (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
        savings.max(0.0)
    }
}
