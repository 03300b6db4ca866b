// imagen/src/processors/loader.rs
use crate::core::{Result, ServiceError};
use crate::utils::image_format_to_string;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Decodes encoded image bytes into a three-channel raster.
#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    /// Decode `data` and drop any alpha channel.
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<RgbImage> {
        if data.is_empty() {
            return Err(ServiceError::Decode("image payload is empty".to_string()));
        }

        let image = self.decode(data)?;

        let (width, height) = image.dimensions();
        if let Some((max_w, max_h)) = self.max_dimensions {
            if width > max_w || height > max_h {
                return Err(ServiceError::Decode(format!(
                    "image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        if width == 0 || height == 0 {
            return Err(ServiceError::Decode("decoded image has no pixels".to_string()));
        }

        log::debug!(
            "Decoded image: {}x{} pixels, color: {:?}",
            width,
            height,
            image.color()
        );

        Ok(image.into_rgb8())
    }

    pub fn get_dimensions_and_format(&self, path: &Path) -> Result<(u32, u32, String)> {
        let reader = ImageReader::open(path)?
            .with_guessed_format()?;

        let format = reader
            .format()
            .map(image_format_to_string)
            .unwrap_or_else(|| "Unknown".to_string());

        let dimensions = reader
            .into_dimensions()
            .map_err(|e| ServiceError::Decode(format!("Failed to read dimensions: {}", e)))?;

        Ok((dimensions.0, dimensions.1, format))
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
            .map_err(|e| ServiceError::Decode(format!("Failed to decode image: {}", e)))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_and_drops_alpha() {
        let rgba = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 128]));
        let bytes = encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

        let decoded = Loader::new().load_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn empty_payload_is_a_decode_error() {
        let result = Loader::new().load_from_bytes(&[]);
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = Loader::new().load_from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(16, 16));
        let bytes = encode(&image, ImageFormat::Png);
        let result = Loader::new().load_from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[test]
    fn oversized_source_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(32, 8));
        let bytes = encode(&image, ImageFormat::Png);
        let result = Loader::new()
            .with_max_dimensions(16, 16)
            .load_from_bytes(&bytes);
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }
}
