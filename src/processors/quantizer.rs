// imagen/src/processors/quantizer.rs
//! Per-channel bit-depth reduction.
//!
//! With `levels = 2^bits`, a sample `v` maps to
//! `floor(v / (256 / levels)) * floor(255 / (levels - 1))`, giving `levels`
//! evenly spaced outputs from 0 upwards. Depths of 8 and above are the identity.

use image::{GrayImage, Luma, Rgb, RgbImage};
use rayon::prelude::*;

pub struct Quantizer {
    bits_per_channel: u32,
    table: [u8; 256],
}

impl Quantizer {
    /// `bits_per_channel` must be positive; callers validate it beforehand.
    pub fn new(bits_per_channel: u32) -> Self {
        let mut table = [0u8; 256];
        for (v, out) in table.iter_mut().enumerate() {
            *out = quantize_sample(v as u8, bits_per_channel);
        }
        Self {
            bits_per_channel,
            table,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.bits_per_channel >= 8
    }

    pub fn quantize_channel(&self, channel: &mut GrayImage) {
        if self.is_identity() {
            return;
        }
        for sample in channel.iter_mut() {
            *sample = self.table[*sample as usize];
        }
    }

    /// Split into three channels, quantize each independently and recombine
    /// in the original channel order.
    pub fn quantize(&self, image: &RgbImage) -> RgbImage {
        if self.is_identity() {
            log::debug!("{} bits per channel, quantization skipped", self.bits_per_channel);
            return image.clone();
        }

        log::debug!(
            "Quantizing {}x{} image to {} bits per channel",
            image.width(),
            image.height(),
            self.bits_per_channel
        );

        let mut channels = split_channels(image);
        channels
            .par_iter_mut()
            .for_each(|channel| self.quantize_channel(channel));
        merge_channels(&channels)
    }
}

pub fn quantize_sample(value: u8, bits_per_channel: u32) -> u8 {
    if bits_per_channel >= 8 {
        return value;
    }
    let levels = 1u32 << bits_per_channel;
    let step = 256 / levels;
    let scale = 255 / (levels - 1);
    (value as u32 / step * scale).min(255) as u8
}

pub fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (width, height) = image.dimensions();
    let channel = |c: usize| GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[c]]));
    [channel(0), channel(1), channel(2)]
}

pub fn merge_channels(channels: &[GrayImage; 3]) -> RgbImage {
    let (width, height) = channels[0].dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y)[0],
            channels[1].get_pixel(x, y)[0],
            channels[2].get_pixel(x, y)[0],
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn distinct_outputs_match_level_count() {
        for bits in 1..=8u32 {
            let outputs: BTreeSet<u8> = (0..=255u8).map(|v| quantize_sample(v, bits)).collect();
            assert_eq!(outputs.len(), 1 << bits, "bits = {bits}");
            assert_eq!(quantize_sample(0, bits), 0);
        }
    }

    #[test]
    fn eight_bits_is_identity() {
        for v in 0..=255u8 {
            assert_eq!(quantize_sample(v, 8), v);
        }
        assert_eq!(quantize_sample(77, 16), 77);
    }

    #[test]
    fn one_bit_is_black_or_white() {
        assert_eq!(quantize_sample(200, 1), 255);
        assert_eq!(quantize_sample(127, 1), 0);
        assert_eq!(quantize_sample(128, 1), 255);
        assert_eq!(quantize_sample(255, 1), 255);
    }

    #[test]
    fn two_bits_known_values() {
        assert_eq!(quantize_sample(100, 2), 85);
        assert_eq!(quantize_sample(255, 2), 255);
        assert_eq!(quantize_sample(63, 2), 0);
        assert_eq!(quantize_sample(64, 2), 85);
    }

    #[test]
    fn monotonic_for_every_depth() {
        for bits in 1..=7u32 {
            let outputs: Vec<u8> = (0..=255u8).map(|v| quantize_sample(v, bits)).collect();
            assert!(outputs.windows(2).all(|w| w[0] <= w[1]), "bits = {bits}");
        }
    }

    #[test]
    fn channels_are_quantized_independently_in_order() {
        let image = RgbImage::from_fn(2, 2, |x, y| Rgb([200, 100, (x * 60 + y * 30) as u8]));
        let quantized = Quantizer::new(2).quantize(&image);

        assert_eq!(quantized.dimensions(), (2, 2));
        assert_eq!(quantized.get_pixel(0, 0).0, [255, 85, 0]);
        assert_eq!(quantized.get_pixel(1, 1).0, [255, 85, 85]);
    }

    #[test]
    fn split_then_merge_is_lossless() {
        let image = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8, y as u8, (x * y) as u8]));
        assert_eq!(merge_channels(&split_channels(&image)), image);
    }

    #[test]
    fn image_sample_sets_are_bounded_by_levels() {
        let image = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, (x + y) as u8]));
        let quantized = Quantizer::new(4).quantize(&image);
        for c in 0..3 {
            let values: BTreeSet<u8> = quantized.pixels().map(|p| p[c]).collect();
            assert!(values.len() <= 16);
        }
    }
}
