// imagen/src/cli.rs
use crate::core::{BitDepthPolicy, ProcessConfig, ResizeAlgorithm};
use crate::server::ServerConfig;
use crate::storage::StorageBackend;
use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "imagen", version, about = "Image ingestion service with digitized and compressed renditions")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Resample and quantize a local image, keeping the encoder's default quality
    Digitize {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Resample, quantize and JPEG-encode a local image at an explicit quality
    Compress {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,

        /// JPEG quality, 0-100
        #[arg(short, long, allow_hyphen_values = true)]
        quality: String,
    },

    /// Show dimensions, format and size of an image
    Info { input: PathBuf },
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Target size as <width>x<height>
    #[arg(short, long)]
    pub resolution: String,

    /// Bits kept per channel
    #[arg(short, long, allow_hyphen_values = true)]
    pub bits_per_channel: String,

    #[command(flatten)]
    pub process: ProcessArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Resampling filter
    #[arg(long, value_enum, default_value_t = Algorithm::Area, env = "IMAGEN_RESAMPLE")]
    pub algorithm: Algorithm,

    /// Accept bits_per_channel above 8 as a no-op instead of rejecting it
    #[arg(long, env = "IMAGEN_PERMISSIVE_BITS")]
    pub permissive_bits: bool,

    /// Largest accepted target width or height
    #[arg(long, default_value_t = 10_000, env = "IMAGEN_MAX_DIMENSION")]
    pub max_dimension: u32,

    /// Largest decodable source width or height
    #[arg(long, default_value_t = 100_000, env = "IMAGEN_MAX_SOURCE_DIMENSION")]
    pub max_source_dimension: u32,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000", env = "IMAGEN_BIND")]
    pub bind: String,

    /// Directory for locally stored uploads
    #[arg(long, default_value = "storage", env = "IMAGEN_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// JSON file holding image records; in-memory when omitted
    #[arg(long, env = "IMAGEN_METADATA_FILE")]
    pub metadata_file: Option<PathBuf>,

    /// Where new uploads are stored
    #[arg(long, value_enum, default_value_t = Backend::Local, env = "IMAGEN_STORAGE_BACKEND")]
    pub storage_backend: Backend,

    /// Base URL uploads are PUT under when the backend is remote
    #[arg(long, env = "IMAGEN_REMOTE_UPLOAD_BASE")]
    pub remote_upload_base: Option<Url>,

    /// Timeout for fetching remote originals, in seconds
    #[arg(long, default_value_t = 30, env = "IMAGEN_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    /// Largest remote original read into memory, in bytes
    #[arg(long, default_value_t = 50 * 1024 * 1024, env = "IMAGEN_MAX_FETCH_BYTES")]
    pub max_fetch_bytes: usize,

    /// Largest accepted upload body, in bytes
    #[arg(long, default_value_t = 20 * 1024 * 1024, env = "IMAGEN_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Number of HTTP worker threads
    #[arg(long, env = "IMAGEN_WORKERS")]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub process: ProcessArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Area,
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Area => ResizeAlgorithm::Area,
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

impl From<Backend> for StorageBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Local => StorageBackend::Local,
            Backend::Remote => StorageBackend::Remote,
        }
    }
}

impl From<ProcessArgs> for ProcessConfig {
    fn from(args: ProcessArgs) -> Self {
        ProcessConfig {
            algorithm: args.algorithm.into(),
            bit_depth_policy: if args.permissive_bits {
                BitDepthPolicy::Permissive
            } else {
                BitDepthPolicy::Strict
            },
            max_dimension: args.max_dimension,
            max_source_dimension: args.max_source_dimension,
        }
    }
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        ServerConfig {
            bind: args.bind,
            storage_dir: args.storage_dir,
            metadata_file: args.metadata_file,
            storage_backend: args.storage_backend.into(),
            remote_upload_base: args.remote_upload_base,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
            max_fetch_bytes: args.max_fetch_bytes,
            max_upload_bytes: args.max_upload_bytes,
            workers: args.workers,
            process: args.process.into(),
        }
    }
}
