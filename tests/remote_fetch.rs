use actix_web::{http::StatusCode, test, web, App, HttpResponse, HttpServer};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use imagen::server::configure;
use imagen::{
    AppState, BlobRouter, BlobStore, HttpBlobStore, InMemoryMetadataStore, LocalBlobStore,
    MetadataStore, ProcessConfig, ServiceError, StorageBackend,
};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use reqwest::Url;
use tempfile::TempDir;

fn png_bytes() -> Bytes {
    let image = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 128]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    Bytes::from(buffer.into_inner())
}

type Bucket = web::Data<Mutex<HashMap<String, Bytes>>>;

async fn put_object(bucket: Bucket, name: web::Path<String>, body: Bytes) -> HttpResponse {
    bucket.lock().unwrap().insert(name.into_inner(), body);
    HttpResponse::Created().finish()
}

async fn get_object(bucket: Bucket, name: web::Path<String>) -> HttpResponse {
    match bucket.lock().unwrap().get(name.as_str()) {
        Some(body) => HttpResponse::Ok().body(body.clone()),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Serve `/photo.png`, a 404 at `/missing.png`, a stalled `/slow.png`, a
/// 4 KiB `/big.bin` and a writable bucket under `/bucket/images/`.
fn spawn_origin() -> String {
    let png = png_bytes();
    let bucket: Bucket = web::Data::new(Mutex::new(HashMap::new()));
    let server = HttpServer::new(move || {
        let png = png.clone();
        App::new()
            .app_data(bucket.clone())
            .service(
                web::resource("/bucket/images/{name}")
                    .route(web::put().to(put_object))
                    .route(web::get().to(get_object)),
            )
            .route(
                "/big.bin",
                web::get().to(|| async { HttpResponse::Ok().body(vec![7u8; 4096]) }),
            )
            .route(
                "/photo.png",
                web::get().to(move || {
                    let png = png.clone();
                    async move { HttpResponse::Ok().content_type("image/png").body(png) }
                }),
            )
            .route(
                "/missing.png",
                web::get().to(|| async { HttpResponse::NotFound().finish() }),
            )
            .route(
                "/slow.png",
                web::get().to(|| async {
                    actix_web::rt::time::sleep(Duration::from_secs(5)).await;
                    HttpResponse::Ok().finish()
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

fn remote_store() -> HttpBlobStore {
    HttpBlobStore::new(Duration::from_millis(500)).unwrap()
}

#[actix_web::test]
async fn fetches_remote_bytes() {
    let origin = spawn_origin();
    let bytes = remote_store()
        .fetch(&format!("{origin}/photo.png"))
        .await
        .unwrap();
    assert_eq!(bytes, png_bytes());
}

#[actix_web::test]
async fn non_success_status_is_upstream_error() {
    let origin = spawn_origin();
    let result = remote_store().fetch(&format!("{origin}/missing.png")).await;
    match result {
        Err(ServiceError::UpstreamFetch(msg)) => assert!(msg.contains("404")),
        other => panic!("expected UpstreamFetch, got {:?}", other),
    }
}

#[actix_web::test]
async fn timeout_is_upstream_error() {
    let origin = spawn_origin();
    let result = remote_store().fetch(&format!("{origin}/slow.png")).await;
    assert!(matches!(result, Err(ServiceError::UpstreamFetch(_))));
}

#[actix_web::test]
async fn body_over_cap_is_upstream_error() {
    let origin = spawn_origin();
    let url = format!("{origin}/big.bin");

    let result = remote_store().with_max_body_bytes(1024).fetch(&url).await;
    match result {
        Err(ServiceError::UpstreamFetch(msg)) => assert!(msg.contains("exceeds")),
        other => panic!("expected UpstreamFetch, got {:?}", other),
    }

    let bytes = remote_store().with_max_body_bytes(4096).fetch(&url).await.unwrap();
    assert_eq!(bytes.len(), 4096);
}

#[actix_web::test]
async fn uploads_land_under_base_without_trailing_slash() {
    let origin = spawn_origin();
    let base = Url::parse(&format!("{origin}/bucket/images")).unwrap();
    let store = remote_store().with_upload_base(base);

    let locator = store.store(png_bytes()).await.unwrap();
    assert!(
        locator.starts_with(&format!("{origin}/bucket/images/")),
        "{locator}"
    );
    assert!(locator.ends_with(".png"));
    assert_eq!(store.fetch(&locator).await.unwrap(), png_bytes());
}

#[actix_web::test]
async fn upload_rejected_by_remote_is_upstream_error() {
    let origin = spawn_origin();
    let base = Url::parse(&format!("{origin}/elsewhere")).unwrap();
    let result = remote_store().with_upload_base(base).store(png_bytes()).await;
    assert!(matches!(result, Err(ServiceError::UpstreamFetch(_))));
}

#[actix_web::test]
async fn renditions_of_remote_originals() {
    let origin = spawn_origin();
    let dir = TempDir::new().unwrap();

    let metadata = Arc::new(InMemoryMetadataStore::new());
    let blobs = Arc::new(BlobRouter::new(
        LocalBlobStore::new(dir.path()),
        remote_store(),
        StorageBackend::Local,
    ));
    metadata
        .put("remote", &format!("{origin}/photo.png"))
        .await
        .unwrap();
    metadata
        .put("broken", &format!("{origin}/missing.png"))
        .await
        .unwrap();

    let state = web::Data::new(AppState::new(metadata, blobs, ProcessConfig::default()));
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/image/remote/digitized?resolution=20x10&bits_per_channel=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (20, 10));

    let req = test::TestRequest::get()
        .uri("/image/broken/compressed?resolution=20x10&bits_per_channel=2&quality=40")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let req = test::TestRequest::get()
        .uri("/image/remote/original")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}
