//! Multipart image uploads.

mod common;

use std::io::Cursor;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{FILES_URL, TestApp, token};
use futures::TryStreamExt;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use shutterlink_storage::{GalleryStore, Path, object_store::ObjectStore};

const BOUNDARY: &str = "shutterlink-test-boundary";

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 40]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(file_name, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: &TestApp,
    token: Option<&str>,
    parts: Vec<Part<'_>>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.send(builder.body(Body::from(multipart(parts))).unwrap())
        .await
}

async fn stored_paths(app: &TestApp, gallery_id: &str) -> Vec<Path> {
    let prefix = GalleryStore::gallery_prefix(gallery_id);
    app.state
        .store
        .as_generic()
        .list(Some(&prefix))
        .map_ok(|meta| meta.location)
        .try_collect()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_stores_originals_and_thumbnails() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;

    let (status, body) = upload(
        &app,
        Some(&token("ph_1")),
        vec![
            Part::Text("galleryId", &gallery.id),
            Part::File("wide shot.png", "image/png", png(640, 480)),
            Part::File("detail.png", "image/png", png(120, 90)),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["filename"], "wide shot.png");
    assert_eq!(images[0]["width"], 640);
    assert_eq!(images[0]["height"], 480);
    assert_eq!(images[0]["price"], 0.0);
    assert!(
        images[0]["thumbnailUrl"]
            .as_str()
            .unwrap()
            .starts_with(&format!("{FILES_URL}/galleries/{}/thumbnails/", gallery.id))
    );

    let records = app.images(&gallery.id).await;
    assert_eq!(records.len(), 2);
    let wide = records.iter().find(|r| r.width == 640).unwrap();
    let thumbnail = app
        .state
        .store
        .get(&Path::from(wide.thumbnail_key.as_str()))
        .await
        .unwrap();
    let thumbnail = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!(thumbnail.dimensions(), (300, 225));

    assert_eq!(stored_paths(&app, &gallery.id).await.len(), 4);
}

#[tokio::test]
async fn one_bad_file_rejects_the_whole_upload() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;

    let (status, body) = upload(
        &app,
        Some(&token("ph_1")),
        vec![
            Part::Text("galleryId", &gallery.id),
            Part::File("ok.png", "image/png", png(50, 50)),
            Part::File("notes.txt", "text/plain", b"not an image".to_vec()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "files[1]");
    assert!(app.images(&gallery.id).await.is_empty());
    assert!(stored_paths(&app, &gallery.id).await.is_empty());
}

#[tokio::test]
async fn a_corrupt_image_is_rejected() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;

    let (status, _) = upload(
        &app,
        Some(&token("ph_1")),
        vec![
            Part::Text("galleryId", &gallery.id),
            Part::File("broken.png", "image/png", b"\x89PNG garbage".to_vec()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.images(&gallery.id).await.is_empty());
}

#[tokio::test]
async fn upload_checks_auth_gallery_and_files_in_order() {
    let app = TestApp::new().await;
    let theirs = app.seed_gallery("ph_2", |_| {}).await;
    let mine = app.seed_gallery("ph_1", |_| {}).await;
    let token = token("ph_1");

    let (status, _) = upload(
        &app,
        None,
        vec![
            Part::Text("galleryId", &mine.id),
            Part::File("a.png", "image/png", png(10, 10)),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = upload(
        &app,
        Some(&token),
        vec![Part::File("a.png", "image/png", png(10, 10))],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "galleryId");

    let (status, _) = upload(
        &app,
        Some(&token),
        vec![
            Part::Text("galleryId", &theirs.id),
            Part::File("a.png", "image/png", png(10, 10)),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.images(&theirs.id).await.is_empty());

    let (status, body) = upload(&app, Some(&token), vec![Part::Text("galleryId", &mine.id)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "files");
}
