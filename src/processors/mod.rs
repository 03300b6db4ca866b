// imagen/src/processors/mod.rs
mod compressor;
mod loader;
mod quantizer;
mod resizer;

pub use compressor::Compressor;
pub use loader::Loader;
pub use quantizer::{merge_channels, quantize_sample, split_channels, Quantizer};
pub use resizer::Resizer;
