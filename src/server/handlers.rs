// imagen/src/server/handlers.rs
use super::AppState;
use crate::core::params::RenditionRequest;
use crate::core::service::RenditionKind;
use crate::core::{Result, ServiceError};
use crate::storage::{ImageRecord, Locator};
use crate::utils::{content_type_for_bytes, sniff_format};
use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageSummary {
    pub image_id: String,
    pub image_url: String,
    pub upload_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageList {
    pub images: Vec<ImageSummary>,
}

/// Query parameters are kept as strings so malformed values surface as
/// `InvalidParameter` naming the field.
#[derive(Debug, Default, Deserialize)]
pub struct RenditionQuery {
    pub resolution: Option<String>,
    pub bits_per_channel: Option<String>,
    pub quality: Option<String>,
}

impl From<RenditionQuery> for RenditionRequest {
    fn from(query: RenditionQuery) -> Self {
        RenditionRequest {
            resolution: query.resolution,
            bits_per_channel: query.bits_per_channel,
            quality: query.quality,
        }
    }
}

impl From<ImageRecord> for ImageSummary {
    fn from(record: ImageRecord) -> Self {
        ImageSummary {
            image_id: record.id,
            image_url: record.locator,
            upload_time: record.created_at.to_rfc3339(),
        }
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Register an image already hosted elsewhere.
pub async fn upload_image_url(
    state: web::Data<AppState>,
    body: web::Json<UploadUrlRequest>,
) -> Result<HttpResponse> {
    let image_url = body.into_inner().image_url;
    if !Locator::parse(&image_url).is_remote() {
        return Err(ServiceError::InvalidParameter(
            "image_url must be an http or https URL".to_string(),
        ));
    }

    let image_id = Uuid::new_v4().to_string();
    let record = state.metadata.put(&image_id, &image_url).await?;
    log::info!("Registered {} -> {}", record.id, record.locator);

    Ok(HttpResponse::Created().json(UploadResponse {
        image_id: record.id,
        image_url: record.locator,
    }))
}

/// Store a raw image body in the blob store and register it.
pub async fn upload_image(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    if body.is_empty() {
        return Err(ServiceError::InvalidParameter("empty upload".to_string()));
    }
    if sniff_format(&body).is_none() {
        return Err(ServiceError::InvalidParameter(
            "upload is not a supported image".to_string(),
        ));
    }

    let size = body.len();
    let locator = state.blobs.store(body).await?;
    let image_id = Uuid::new_v4().to_string();
    let record = state.metadata.put(&image_id, &locator).await.map_err(|e| {
        log::warn!("Blob {} stored but not registered: {}", locator, e);
        e
    })?;

    log::info!("Uploaded {} ({} bytes) to {}", record.id, size, record.locator);

    Ok(HttpResponse::Created().json(UploadResponse {
        image_id: record.id,
        image_url: record.locator,
    }))
}

pub async fn list_images(state: web::Data<AppState>) -> Result<HttpResponse> {
    let images = state
        .metadata
        .list()
        .await?
        .into_iter()
        .map(ImageSummary::from)
        .collect();

    Ok(HttpResponse::Ok().json(ImageList { images }))
}

/// Remote originals redirect to their URL, local ones are streamed.
pub async fn get_original(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let image_id = path.into_inner();
    let record = state.renditions.acquirer().record(&image_id).await?;

    match Locator::parse(&record.locator) {
        Locator::Remote(url) => Ok(HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, url.as_str()))
            .finish()),
        Locator::Local(_) => {
            let bytes = state.blobs.fetch(&record.locator).await?;
            Ok(HttpResponse::Ok()
                .content_type(content_type_for_bytes(&bytes))
                .body(bytes))
        }
    }
}

pub async fn get_digitized(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RenditionQuery>,
) -> Result<HttpResponse> {
    render(state, path.into_inner(), RenditionKind::Digitized, query.into_inner()).await
}

pub async fn get_compressed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RenditionQuery>,
) -> Result<HttpResponse> {
    render(state, path.into_inner(), RenditionKind::Compressed, query.into_inner()).await
}

async fn render(
    state: web::Data<AppState>,
    image_id: String,
    kind: RenditionKind,
    query: RenditionQuery,
) -> Result<HttpResponse> {
    let bytes = state
        .renditions
        .render(&image_id, kind, query.into())
        .await?;

    Ok(HttpResponse::Ok().content_type("image/jpeg").body(bytes))
}
