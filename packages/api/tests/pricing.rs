//! Bulk price edits on a gallery.

mod common;

use axum::http::StatusCode;
use common::{TestApp, token};
use serde_json::json;

#[tokio::test]
async fn bulk_then_single_override() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;
    let mut ids = Vec::new();
    for minutes in 0..5 {
        ids.push(app.seed_image(&gallery.id, 0, minutes).await.id);
    }
    let uri = format!("/api/v1/galleries/{}/pricing", gallery.id);
    let token = token("ph_1");

    let all: serde_json::Map<String, serde_json::Value> =
        ids.iter().map(|id| (id.clone(), json!(10))).collect();
    let (status, body) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "prices": all })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["updated"], 5);

    let (status, body) = app
        .call(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "prices": { ids[2].clone(): 15.0, ids[3].clone(): 10.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    // only the image whose price moved counts
    assert_eq!(body["updated"], 1);

    let mut prices: Vec<i64> = app.images(&gallery.id).await.iter().map(|i| i.price).collect();
    prices.sort();
    assert_eq!(prices, vec![1000, 1000, 1000, 1000, 1500]);
}

#[tokio::test]
async fn image_from_another_gallery_rejects_the_whole_batch() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;
    let other = app.seed_gallery("ph_1", |_| {}).await;
    let mine = app.seed_image(&gallery.id, 200, 1).await;
    let foreign = app.seed_image(&other.id, 300, 1).await;

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/v1/galleries/{}/pricing", gallery.id),
            Some(&token("ph_1")),
            Some(json!({ "prices": { mine.id.clone(): 9.99, foreign.id.clone(): 1.0 } })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"][0]["field"],
        format!("prices.{}", foreign.id)
    );
    assert_eq!(app.images(&gallery.id).await[0].price, 200);
    assert_eq!(app.images(&other.id).await[0].price, 300);
}

#[tokio::test]
async fn a_negative_price_rejects_the_whole_batch() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_1", |_| {}).await;
    let a = app.seed_image(&gallery.id, 100, 1).await;
    let b = app.seed_image(&gallery.id, 100, 2).await;

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/v1/galleries/{}/pricing", gallery.id),
            Some(&token("ph_1")),
            Some(json!({ "prices": { a.id.clone(): -1.0, b.id.clone(): 2.0 } })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    for image in app.images(&gallery.id).await {
        assert_eq!(image.price, 100);
    }
}

#[tokio::test]
async fn only_the_owner_can_price() {
    let app = TestApp::new().await;
    let gallery = app.seed_gallery("ph_2", |_| {}).await;
    let image = app.seed_image(&gallery.id, 100, 1).await;
    let uri = format!("/api/v1/galleries/{}/pricing", gallery.id);
    let body = json!({ "prices": { image.id.clone(): 5.0 } });

    let (status, _) = app.call("PUT", &uri, None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("PUT", &uri, Some(&token("ph_1")), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.images(&gallery.id).await[0].price, 100);
}
