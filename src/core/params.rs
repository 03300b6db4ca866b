// imagen/src/core/params.rs
//! Request parameters for digitized and compressed renditions.
//!
//! Parameters arrive as raw strings (query strings or CLI flags) and are only
//! turned into [`TransformParams`] once the source image has been decoded.

use super::{BitDepthPolicy, ProcessConfig, Result, ServiceError};
use std::fmt;

/// Target raster size, both components positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Parse `"<width>x<height>"`. Both components must be plain decimal
    /// digits and greater than zero.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || ServiceError::InvalidParameter(format!("invalid resolution: {:?}", raw));

        let (w, h) = raw.split_once('x').ok_or_else(invalid)?;
        let width = parse_dimension(w).ok_or_else(invalid)?;
        let height = parse_dimension(h).ok_or_else(invalid)?;

        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_dimension(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|v| *v > 0)
}

/// Unvalidated parameters for one rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenditionRequest {
    pub resolution: Option<String>,
    pub bits_per_channel: Option<String>,
    pub quality: Option<String>,
}

impl RenditionRequest {
    pub fn new(resolution: impl Into<String>, bits_per_channel: impl Into<String>) -> Self {
        Self {
            resolution: Some(resolution.into()),
            bits_per_channel: Some(bits_per_channel.into()),
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn validate(&self, config: &ProcessConfig) -> Result<TransformParams> {
        let resolution = Resolution::parse(required(&self.resolution, "resolution")?)?;
        if resolution.width > config.max_dimension || resolution.height > config.max_dimension {
            return Err(ServiceError::InvalidParameter(format!(
                "invalid resolution: {} exceeds maximum of {} pixels per side",
                resolution, config.max_dimension
            )));
        }

        let bits_per_channel = parse_bits(
            required(&self.bits_per_channel, "bits_per_channel")?,
            config.bit_depth_policy,
        )?;

        let quality = self.quality.as_deref().map(parse_quality).transpose()?;

        Ok(TransformParams {
            resolution,
            bits_per_channel,
            quality,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| ServiceError::InvalidParameter(format!("missing {}", field)))
}

fn parse_bits(raw: &str, policy: BitDepthPolicy) -> Result<u32> {
    let bits: i64 = raw.parse().map_err(|_| {
        ServiceError::InvalidParameter(format!("invalid bits_per_channel: {:?}", raw))
    })?;

    if bits <= 0 {
        return Err(ServiceError::InvalidParameter(format!(
            "bits_per_channel must be positive, got {}",
            bits
        )));
    }

    if bits > 8 && policy == BitDepthPolicy::Strict {
        return Err(ServiceError::InvalidParameter(format!(
            "bits_per_channel must be at most 8, got {}",
            bits
        )));
    }

    Ok(u32::try_from(bits).unwrap_or(u32::MAX))
}

fn parse_quality(raw: &str) -> Result<u8> {
    let quality: i64 = raw
        .parse()
        .map_err(|_| ServiceError::InvalidParameter(format!("invalid quality: {:?}", raw)))?;

    if !(0..=100).contains(&quality) {
        return Err(ServiceError::InvalidParameter(format!(
            "quality out of range: {} (expected 0-100)",
            quality
        )));
    }

    Ok(quality as u8)
}

/// Validated parameters for the transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    pub resolution: Resolution,
    pub bits_per_channel: u32,
    /// `None` keeps the encoder's default quality.
    pub quality: Option<u8>,
}
