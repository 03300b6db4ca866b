// imagen/src/core/mod.rs
pub mod acquirer;
pub mod params;
pub mod processor;
pub mod service;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeAlgorithm {
    /// Fractional-coverage box filter, used for both up- and down-sampling.
    #[default]
    Area,
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// Upper-bound policy for `bits_per_channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepthPolicy {
    /// Values above 8 are rejected.
    #[default]
    Strict,
    /// Values of 8 and above pass through quantization unchanged.
    Permissive,
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub algorithm: ResizeAlgorithm,
    pub bit_depth_policy: BitDepthPolicy,
    /// Largest accepted target width or height.
    pub max_dimension: u32,
    /// Largest decodable source width or height.
    pub max_source_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub file_size: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            algorithm: ResizeAlgorithm::Area,
            bit_depth_policy: BitDepthPolicy::Strict,
            max_dimension: 10_000,
            max_source_dimension: 100_000,
        }
    }
}

impl ProcessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 || self.max_source_dimension == 0 {
            return Err(ServiceError::InvalidParameter(
                "Dimension limits must be positive".to_string(),
            ));
        }

        if self.max_dimension > 100_000 || self.max_source_dimension > 100_000 {
            return Err(ServiceError::InvalidParameter(
                "Dimension limits too large (max 100,000 pixels)".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("upstream fetch error: {0}")]
    UpstreamFetch(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidParameter(_) => "invalid_parameter",
            ServiceError::Decode(_) => "decode_error",
            ServiceError::UpstreamFetch(_) => "upstream_fetch_error",
            ServiceError::Encode(_) => "encode_error",
            ServiceError::Storage(_) => "storage_error",
            ServiceError::Io(_) => "io_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub fn validate_config(config: &ProcessConfig) -> Result<()> {
    config.validate()
}
