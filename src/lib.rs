pub mod cli;
pub mod core;
pub mod processors;
pub mod server;
pub mod storage;
pub mod utils;

pub use cli::{Algorithm, Backend, Cli, Commands};
pub use crate::core::acquirer::SourceAcquirer;
pub use crate::core::params::{RenditionRequest, Resolution, TransformParams};
pub use crate::core::processor::ImageProcessor;
pub use crate::core::service::{RenditionKind, RenditionService};
pub use crate::core::{
    validate_config, BitDepthPolicy, ImageMetadata, ProcessConfig, ResizeAlgorithm, Result,
    ServiceError,
};
pub use processors::{Compressor, Loader, Quantizer, Resizer};
pub use server::{AppState, ServerConfig};
pub use storage::{
    BlobRouter, BlobStore, HttpBlobStore, ImageRecord, InMemoryMetadataStore,
    JsonFileMetadataStore, LocalBlobStore, Locator, MetadataStore, StorageBackend,
};
pub use utils::{calculate_aspect_ratio, format_file_size, generate_output_path};

// Re-export commonly used types
pub use image::RgbImage;
