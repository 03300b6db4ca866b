// imagen/src/server/mod.rs
//! HTTP surface: upload, listing, originals and the two renditions.

mod error;
pub mod handlers;

pub use error::ErrorBody;

use crate::core::acquirer::SourceAcquirer;
use crate::core::processor::ImageProcessor;
use crate::core::service::RenditionService;
use crate::core::{ProcessConfig, Result};
use crate::storage::{
    BlobRouter, BlobStore, HttpBlobStore, InMemoryMetadataStore, JsonFileMetadataStore,
    LocalBlobStore, MetadataStore, StorageBackend, DEFAULT_MAX_FETCH_BYTES,
};
use actix_web::{middleware::Logger, web, App, HttpServer};
use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub storage_dir: PathBuf,
    /// JSON-backed metadata when set, in-memory otherwise.
    pub metadata_file: Option<PathBuf>,
    pub storage_backend: StorageBackend,
    pub remote_upload_base: Option<Url>,
    pub fetch_timeout: Duration,
    /// Cap on a remote original's body.
    pub max_fetch_bytes: usize,
    pub max_upload_bytes: usize,
    pub workers: Option<usize>,
    pub process: ProcessConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            storage_dir: PathBuf::from("storage"),
            metadata_file: None,
            storage_backend: StorageBackend::Local,
            remote_upload_base: None,
            fetch_timeout: Duration::from_secs(30),
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            max_upload_bytes: 20 * 1024 * 1024,
            workers: None,
            process: ProcessConfig::default(),
        }
    }
}

/// Shared per-process handles, injected into every handler.
pub struct AppState {
    pub metadata: Arc<dyn MetadataStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub renditions: RenditionService,
}

impl AppState {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        process: ProcessConfig,
    ) -> Self {
        let acquirer = SourceAcquirer::new(metadata.clone(), blobs.clone());
        let processor = Arc::new(ImageProcessor::new(process));
        Self {
            metadata,
            blobs,
            renditions: RenditionService::new(acquirer, processor),
        }
    }

    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        config.process.validate()?;

        let metadata: Arc<dyn MetadataStore> = match &config.metadata_file {
            Some(path) => Arc::new(JsonFileMetadataStore::open(path).await?),
            None => {
                log::warn!("No metadata file configured, image records are kept in memory only");
                Arc::new(InMemoryMetadataStore::new())
            }
        };

        let storage_dir = if config.storage_dir.is_absolute() {
            config.storage_dir.clone()
        } else {
            std::env::current_dir()?.join(&config.storage_dir)
        };
        let local = LocalBlobStore::new(storage_dir);

        let mut remote =
            HttpBlobStore::new(config.fetch_timeout)?.with_max_body_bytes(config.max_fetch_bytes);
        if let Some(base) = &config.remote_upload_base {
            remote = remote.with_upload_base(base.clone());
        }

        log::info!(
            "Blob storage: {:?} backend, local root {}",
            config.storage_backend,
            local.root().display()
        );

        let blobs: Arc<dyn BlobStore> =
            Arc::new(BlobRouter::new(local, remote, config.storage_backend));

        Ok(Self::new(metadata, blobs, config.process.clone()))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/upload_image_url", web::post().to(handlers::upload_image_url))
        .route("/upload_image", web::post().to(handlers::upload_image))
        .route("/images", web::get().to(handlers::list_images))
        .service(
            web::scope("/image/{image_id}")
                .route("/original", web::get().to(handlers::get_original))
                .route("/digitized", web::get().to(handlers::get_digitized))
                .route("/compressed", web::get().to(handlers::get_compressed)),
        );
}

pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(state);
    let max_upload_bytes = config.max_upload_bytes;

    log::info!("Starting image service on {}", config.bind);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(Logger::default())
            .configure(configure)
    });

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(&config.bind)?.run().await
}
