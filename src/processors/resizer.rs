// imagen/src/processors/resizer.rs
use crate::core::params::Resolution;
use crate::core::ResizeAlgorithm;
use image::{imageops::FilterType, RgbImage};
use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Resamples a raster to an exact target size. Aspect ratio is not preserved.
pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn resize_exact(&self, image: &RgbImage, target: Resolution) -> RgbImage {
        let Resolution { width, height } = target;

        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {} using {:?}",
            image.width(),
            image.height(),
            target,
            self.algorithm
        );

        match self.get_filter_type() {
            Some(filter) => image::imageops::resize(image, width, height, filter),
            None => area_resize(image, width, height),
        }
    }

    fn get_filter_type(&self) -> Option<FilterType> {
        match self.algorithm {
            ResizeAlgorithm::Area => None,
            ResizeAlgorithm::Nearest => Some(FilterType::Nearest),
            ResizeAlgorithm::Bilinear => Some(FilterType::Triangle),
            ResizeAlgorithm::Bicubic => Some(FilterType::CatmullRom),
            ResizeAlgorithm::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::Area)
    }
}

/// Source taps for one output sample: `(source index, weight)`, weights sum to 1.
type Taps = Vec<(usize, f32)>;

/// Coverage of each destination cell over the source axis. Every output
/// sample averages the source samples its footprint overlaps, weighted by
/// the overlapped length.
fn area_taps(src: u32, dst: u32) -> Vec<Taps> {
    let scale = src as f64 / dst as f64;
    let src = src as usize;

    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (start + scale).min(src as f64);
            let mut taps = Vec::new();
            let mut s = start.floor() as usize;

            while s < src && (s as f64) < end {
                let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                if overlap > 1e-9 {
                    taps.push((s, overlap as f32));
                }
                s += 1;
            }

            let total: f32 = taps.iter().map(|(_, w)| w).sum();
            if total > 0.0 {
                for (_, w) in &mut taps {
                    *w /= total;
                }
            } else {
                taps.push((src.saturating_sub(1), 1.0));
            }
            taps
        })
        .collect()
}

fn area_resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    let src = image.as_raw();
    let x_taps = area_taps(src_w, width);
    let y_taps = area_taps(src_h, height);

    let dst_w = width as usize;
    let src_row_len = src_w as usize * CHANNELS;
    let mid_row_len = dst_w * CHANNELS;

    // Horizontal pass: src_h rows of dst_w samples.
    let mut horizontal = vec![0f32; mid_row_len * src_h as usize];
    horizontal
        .par_chunks_mut(mid_row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * src_row_len..(y + 1) * src_row_len];
            for (x, taps) in x_taps.iter().enumerate() {
                let mut acc = [0f32; CHANNELS];
                for &(sx, w) in taps {
                    let px = &src_row[sx * CHANNELS..sx * CHANNELS + CHANNELS];
                    for c in 0..CHANNELS {
                        acc[c] += px[c] as f32 * w;
                    }
                }
                row[x * CHANNELS..x * CHANNELS + CHANNELS].copy_from_slice(&acc);
            }
        });

    // Vertical pass.
    let mut out = vec![0u8; mid_row_len * height as usize];
    out.par_chunks_mut(mid_row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let taps = &y_taps[y];
            for (i, sample) in row.iter_mut().enumerate() {
                let mut acc = 0f32;
                for &(sy, w) in taps {
                    acc += horizontal[sy * mid_row_len + i] * w;
                }
                *sample = acc.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbImage::from_raw(width, height, out)
        .unwrap_or_else(|| RgbImage::new(width, height))
}
