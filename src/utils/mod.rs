// imagen/src/utils/mod.rs
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Default output path for a rendition of `input_path`: a timestamped
/// `<stem>_<suffix>_<ts>.jpg` next to the input, never overwriting a file.
pub fn generate_output_path(input_path: &Path, output: Option<&Path>, suffix: &str) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = input_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image");

            let timestamp = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);

            let mut candidate = input_path.with_file_name(format!("{}_{}_{}.jpg", stem, suffix, timestamp));
            let mut counter = 1;

            while candidate.exists() {
                candidate = input_path.with_file_name(format!(
                    "{}_{}_{}_{}.jpg",
                    stem, suffix, timestamp, counter
                ));
                counter += 1;
            }

            candidate
        }
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as i32).min(UNITS.len() as i32 - 1);
    let size = bytes_f64 / base.powi(exponent);

    format!("{:.2} {}", size, UNITS[exponent as usize])
}

pub fn calculate_aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        0.0
    } else {
        width as f32 / height as f32
    }
}

pub fn image_format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WebP",
        ImageFormat::Pnm => "PNM",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Tga => "TGA",
        ImageFormat::Dds => "DDS",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Hdr => "HDR",
        ImageFormat::OpenExr => "OpenEXR",
        ImageFormat::Farbfeld => "Farbfeld",
        ImageFormat::Avif => "AVIF",
        ImageFormat::Qoi => "QOI",
        _ => "Unknown",
    }
    .to_string()
}

/// Sniffed image format of an encoded payload, if any.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}

/// File extension for a stored blob, `bin` when the payload is not a known image.
pub fn extension_for_bytes(data: &[u8]) -> &'static str {
    sniff_format(data)
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("bin")
}

/// Media type for serving an original, `application/octet-stream` when unknown.
pub fn content_type_for_bytes(data: &[u8]) -> &'static str {
    sniff_format(data)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
