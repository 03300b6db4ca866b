// imagen/src/core/processor.rs
use super::params::RenditionRequest;
use super::{ImageMetadata, ProcessConfig, Result, ServiceError};
use crate::processors::{Compressor, Loader, Quantizer, Resizer};
use std::path::Path;

/// Decode, validate, resample, quantize and re-encode as JPEG.
///
/// Holds no per-request state; one instance is shared by every request.
pub struct ImageProcessor {
    config: ProcessConfig,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
}

impl ImageProcessor {
    pub fn new(config: ProcessConfig) -> Self {
        let loader = Loader::new()
            .with_max_dimensions(config.max_source_dimension, config.max_source_dimension);
        let resizer = Resizer::new(config.algorithm);

        Self {
            config,
            loader,
            resizer,
            compressor: Compressor::new(),
        }
    }

    /// Run the full pipeline. Any stage failing aborts the rest; no partial
    /// output is ever returned.
    pub fn transform(&self, raw: &[u8], request: &RenditionRequest) -> Result<Vec<u8>> {
        let image = self.loader.load_from_bytes(raw)?;
        let params = request.validate(&self.config)?;

        let resized = self.resizer.resize_exact(&image, params.resolution);
        let quantized = Quantizer::new(params.bits_per_channel).quantize(&resized);
        let encoded = self
            .compressor
            .compress_to_bytes(&quantized, params.quality)?;

        log::debug!(
            "Rendered {} at {} bits/channel: {} -> {} bytes ({:.1}% smaller)",
            params.resolution,
            params.bits_per_channel,
            raw.len(),
            encoded.len(),
            self.compressor
                .calculate_savings(raw.len() as u64, encoded.len() as u64)
        );

        Ok(encoded)
    }

    /// Transform a file on disk and write the JPEG result to `output_path`.
    pub fn process_file<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        request: &RenditionRequest,
    ) -> Result<u64> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        self.validate_paths(input_path, output_path)?;

        let raw = std::fs::read(input_path)?;
        let encoded = self.transform(&raw, request)?;
        std::fs::write(output_path, &encoded)?;

        log::info!(
            "Saved image: {} ({} bytes)",
            output_path.display(),
            encoded.len()
        );

        Ok(encoded.len() as u64)
    }

    pub fn get_metadata<P: AsRef<Path>>(&self, path: P) -> Result<ImageMetadata> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ServiceError::NotFound(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)?;
        let (width, height, format) = self.loader.get_dimensions_and_format(path)?;

        Ok(ImageMetadata {
            width,
            height,
            format,
            file_size: metadata.len(),
        })
    }

    fn validate_paths(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        if input_path.to_string_lossy().contains("..") {
            return Err(ServiceError::InvalidParameter(
                "Path traversal detected in input path".to_string(),
            ));
        }

        if output_path.to_string_lossy().contains("..") {
            return Err(ServiceError::InvalidParameter(
                "Path traversal detected in output path".to_string(),
            ));
        }

        if !input_path.exists() {
            return Err(ServiceError::NotFound(format!(
                "Input file does not exist: {}",
                input_path.display()
            )));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(())
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(ProcessConfig::default())
    }
}
